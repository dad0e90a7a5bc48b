//! Domain-level error type shared by all workspace crates.

/// Errors produced by domain logic, independent of any transport.
///
/// The api crate maps these onto HTTP responses; the worker logs them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// The request was malformed or violated a domain rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An artifact could not be written or removed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Storage(err.to_string())
    }
}
