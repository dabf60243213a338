use mediaskip_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkipError {
    #[error("Fingerprint error: {0}")]
    Fingerprint(String),

    #[error("Segment store error: {0}")]
    Store(String),

    #[error("Segment not found: {0}")]
    NotFound(String),

    #[error("Segment generation error: {0}")]
    Generation(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SkipError>;
