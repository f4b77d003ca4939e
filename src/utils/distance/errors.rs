use std::time::Duration;
use thiserror::Error;

/// Never reaches a response; callers log it and fall back.
#[derive(Error, Debug)]
pub enum DistanceError {
    #[error("Distance service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Distance service answered {status}: {message}")]
    Rejected { status: String, message: String },
    #[error("Malformed distance response: {0}")]
    Malformed(String),
    #[error("Distance service did not answer within {0:?}")]
    TimedOut(Duration),
}
