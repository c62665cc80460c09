use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown usage mode: {0}")]
    InvalidUsageMode(String),
    #[error("unknown gender: {0}")]
    InvalidGender(String),
    #[error("invalid feedback id: {0}")]
    InvalidFeedbackId(String),
}
