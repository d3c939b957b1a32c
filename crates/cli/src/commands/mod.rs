pub mod config;
pub mod demos;
pub mod render;

/// What a command prints and exits with. Output goes to stdout verbatim;
/// machine consumers rely on it being a single JSON document for the
/// rendering commands.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(message: impl Into<String>, exit_code: u8) -> Self {
        Self { exit_code, output: message.into() }
    }
}
