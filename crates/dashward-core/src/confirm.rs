use crate::CoreError;

pub const REMOVE_PROMPT: &str =
    "Do you really want to remove the dashboard? (all your changes will be lost)";

/// Source of yes/no decisions for destructive operations.
pub trait ConfirmationGate {
    /// Ask `question`; `default` is the answer taken on a bare return.
    fn confirm(&self, question: &str, default: bool) -> Result<bool, CoreError>;
}

/// Always gives the same answer. Useful for non-interactive callers and tests.
pub struct FixedAnswer(pub bool);

impl ConfirmationGate for FixedAnswer {
    fn confirm(&self, _question: &str, _default: bool) -> Result<bool, CoreError> {
        Ok(self.0)
    }
}
