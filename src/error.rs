use thiserror::Error;

/// Errors surfaced by the checkout pipeline and its collaborators.
///
/// Business outcomes (out of stock, declined payment) are not errors; they are
/// reported through [`crate::domain::outcome::CheckoutOutcome`]. The `Upstream`
/// and `Payment` variants exist so collaborators can say *why* they failed
/// before the executor folds them into an outcome.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Payment declined: {0}")]
    Payment(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Admission queue is full")]
    QueueFull,
    #[error("Admission queue is closed")]
    QueueClosed,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "storage-postgres")]
impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for CheckoutError {
    fn from(err: reqwest::Error) -> Self {
        CheckoutError::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
