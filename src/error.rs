use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("feed is already running")]
    AlreadyRunning,
    #[error("feed must be started from within a tokio runtime")]
    NoRuntime,
}

pub type FeedResult<T> = Result<T, FeedError>;
