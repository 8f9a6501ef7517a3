use thiserror::Error;

/// Errors the REST layer maps to client-facing status codes. Everything else
/// travels as `anyhow::Error` and surfaces as a 500.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> anyhow::Error {
        anyhow::Error::new(DomainError::Validation(message.into()))
    }

    pub fn not_found(entity: &'static str) -> anyhow::Error {
        anyhow::Error::new(DomainError::NotFound(entity))
    }
}
