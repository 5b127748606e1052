use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("button id cannot be empty")]
    EmptyButtonId,
    #[error("invalid ring configuration for level {level}: {reason}")]
    InvalidRing { level: usize, reason: &'static str },
    #[error("sector rendering failed: {0}")]
    Render(#[from] cairo::Error),
    #[error("hit mask is not accessible: {0}")]
    MaskAccess(#[from] cairo::BorrowError),
}

/// Failure reported by a persistence collaborator.
///
/// The engine only logs these; a failed save never blocks interaction.
#[derive(Debug, Error)]
#[error("{context}")]
pub struct PersistError {
    context: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl PersistError {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    pub fn with_source(
        context: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}
