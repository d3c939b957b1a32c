pub mod commands;
pub mod demos;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "blocks",
    about = "Blocks operator CLI",
    long_about = "Render the built-in demo surfaces to Block Kit JSON and inspect host configuration without a Slack workspace.",
    after_help = "Examples:\n  blocks demos\n  blocks render counter\n  blocks render approval --pretty\n  blocks config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the built-in demo surfaces")]
    Demos,
    #[command(about = "Render a demo surface to Block Kit JSON on stdout")]
    Render {
        #[arg(help = "Demo name, as listed by `blocks demos`")]
        demo: String,
        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
    },
    #[command(about = "Inspect effective host configuration with secrets redacted")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Demos => commands::demos::run(),
        Command::Render { demo, pretty } => commands::render::run(&demo, pretty),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
