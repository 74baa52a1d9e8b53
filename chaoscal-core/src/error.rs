//! Error types for chaoscal.

use thiserror::Error;

/// Errors that can occur in chaoscal operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChaosCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid feed URL: {0}")]
    InvalidFeedUrl(String),

    #[error("Feed request failed: {0}")]
    FeedRequest(String),

    #[error("Feed responded with HTTP status {0}")]
    FeedStatus(u16),

    #[error("Could not read feed body: {0}")]
    FeedBody(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Event title must not be empty")]
    EmptyTitle,
}

/// Result type alias for chaoscal operations.
pub type ChaosCalResult<T> = Result<T, ChaosCalError>;
