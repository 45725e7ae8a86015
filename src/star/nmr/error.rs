//! Dialect validation errors

/// A NEF / NMR-STAR rule violation, with the path of container names leading to it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error in context: [{}]\n{message}", .context.join(", "))]
pub struct ValidationError {
    pub context: Vec<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(context: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }
}
