use blocks_core::{BlocksContext, EnvironmentValues, Surface, UserId};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::demos;

pub fn run(name: &str, pretty: bool) -> CommandResult {
    let Some(demo) = demos::find(name) else {
        let known: Vec<&str> = demos::DEMOS.iter().map(|demo| demo.name).collect();
        return CommandResult::failure(
            format!("unknown demo `{name}` (known: {})", known.join(", ")),
            2,
        );
    };

    let registry = demos::registry();
    let Some(root) = registry.root(demo.name) else {
        return CommandResult::failure(format!("demo `{name}` is not registered"), 2);
    };

    let mut ctx = BlocksContext::new(demo.surface);
    ctx.install_environment(
        EnvironmentValues::new().with::<UserId>(Some("U-local-operator".to_owned())),
    );
    if let Err(error) = ctx.render(&root) {
        return CommandResult::failure(format!("render failed: {error}"), 1);
    }

    match demo.surface {
        Surface::Modal | Surface::HomeTab => match ctx.finish_view() {
            Ok(view) => emit(&view, pretty),
            Err(error) => CommandResult::failure(format!("render failed: {error}"), 1),
        },
        Surface::Message => emit(&ctx.finish(), pretty),
    }
}

fn emit<T: Serialize>(payload: &T, pretty: bool) -> CommandResult {
    let encoded = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    match encoded {
        Ok(json) => CommandResult::success(json),
        Err(error) => CommandResult::failure(format!("serialization failed: {error}"), 1),
    }
}
