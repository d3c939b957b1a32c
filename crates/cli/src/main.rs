use std::process::ExitCode;

fn main() -> ExitCode {
    blocks_cli::run()
}
