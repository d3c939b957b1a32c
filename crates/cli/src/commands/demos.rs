use blocks_core::Surface;

use crate::commands::CommandResult;
use crate::demos::DEMOS;

pub fn run() -> CommandResult {
    let mut lines = vec!["built-in demo surfaces:".to_owned()];
    for demo in DEMOS {
        let surface = match demo.surface {
            Surface::Message => "message",
            Surface::Modal => "modal",
            Surface::HomeTab => "home",
        };
        lines.push(format!("  {:<10} [{surface}]  {}", demo.name, demo.description));
    }
    CommandResult::success(lines.join("\n"))
}
