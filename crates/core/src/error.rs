use thiserror::Error;

/// Core invariant violations. Reaching one of these means the engine (not
/// the application tree) is in a state it promised never to enter; callers
/// should treat it as a 500-class failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InconsistencyError {
    #[error("open block is not a {expected}")]
    OpenBlockMismatch { expected: &'static str },
    #[error("no block is open")]
    NoOpenBlock,
    #[error("no view was rendered for a view surface")]
    NoViewRendered,
}

/// Everything that can abort a traversal.
///
/// Structural nesting problems are deliberately NOT here: those are logged
/// and repaired in place (a degraded render beats no message at all).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Inconsistency(#[from] InconsistencyError),
    /// An application action handler failed with something other than an
    /// input-validation signal. Propagated unclassified.
    #[error("action handler failed: {0}")]
    Handler(#[source] anyhow::Error),
}

/// A single rejected input, keyed by the block that carried it. A `None`
/// block id attaches the failure to the block enclosing the handler that
/// raised it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputFailure {
    pub block_id: Option<String>,
    pub message: String,
}

/// Structured rejection of submitted form values, raised by application
/// action code. Caught by the engine during `invoke` and folded into the
/// block-error map; never propagated past the traversal boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid inputs in {} block(s)", failures.len())]
pub struct InputValidationError {
    pub failures: Vec<InputFailure>,
}

impl InputValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { failures: vec![InputFailure { block_id: None, message: message.into() }] }
    }

    pub fn for_block(block_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failures: vec![InputFailure {
                block_id: Some(block_id.into()),
                message: message.into(),
            }],
        }
    }

    pub fn and(mut self, block_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .push(InputFailure { block_id: Some(block_id.into()), message: message.into() });
        self
    }
}

/// What an action handler may fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] InputValidationError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::{HandlerError, InputValidationError, RenderError};

    #[test]
    fn validation_error_collects_block_failures() {
        let error = InputValidationError::for_block("form.0", "amount must be a number")
            .and("form.1", "date is required");
        assert_eq!(error.failures.len(), 2);
        assert_eq!(error.failures[0].block_id.as_deref(), Some("form.0"));
    }

    #[test]
    fn handler_error_wraps_validation_transparently() {
        let error = HandlerError::from(InputValidationError::new("nope"));
        assert!(matches!(error, HandlerError::Validation(_)));
    }

    #[test]
    fn handler_failures_surface_their_source() {
        let error = RenderError::Handler(anyhow::anyhow!("upstream exploded"));
        assert!(error.to_string().contains("action handler failed"));
    }
}
