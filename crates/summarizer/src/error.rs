use thiserror::Error;

/// Result type for summary generation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during summary generation.
#[derive(Debug, Error)]
pub enum Error {
    /// The text-generation backend failed or refused the request.
    #[error("summary generation failed: {0}")]
    Generation(String),
}
