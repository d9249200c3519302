use thiserror::Error;

/// Result type alias for mind-map operations.
pub type Result<T> = std::result::Result<T, MindTreeError>;

/// Errors surfaced by the tree model and document layer. None of these are
/// fatal; the caller reports them and the tree stays usable.
#[derive(Error, Debug)]
pub enum MindTreeError {
    /// Document text was not valid JSON, or did not match the node shape.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A structural edit that the tree cannot perform, e.g. removing the root.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// An estimate input that does not parse as an integer.
    #[error("invalid estimate: {0:?} is not an integer")]
    InvalidEstimate(String),
}
