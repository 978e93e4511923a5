//! Crate-wide error types
//!
//! Validation errors are raised synchronously at the call site; transport
//! problems are logged and fed into the reconnect state machine rather than
//! surfaced here.

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Channel name failed validation
    Channel(ChannelError),
    /// The publish request failed after being dispatched
    Publish(PublishError),
    /// The cluster status query failed
    Status(reqwest::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Channel(e) => write!(f, "invalid channel: {}", e),
            Error::Publish(e) => write!(f, "publish failed: {}", e),
            Error::Status(e) => write!(f, "status query failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Channel(e) => Some(e),
            Error::Publish(e) => Some(e),
            Error::Status(e) => Some(e),
        }
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Error::Publish(e)
    }
}

/// Error type for channel name validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Channel is not in the `view:` namespace
    WrongNamespace(String),
    /// Channel has fewer than the required number of segments, or an empty one
    MalformedName(String),
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::WrongNamespace(name) => {
                write!(f, "channel not in the view: namespace: {}", name)
            }
            ChannelError::MalformedName(name) => {
                write!(
                    f,
                    "channel must have at least 4 non-empty colon-delimited segments: {}",
                    name
                )
            }
        }
    }
}

impl std::error::Error for ChannelError {}

/// Error type for the stateless publish path
#[derive(Debug)]
pub enum PublishError {
    /// The HTTP request itself failed (connect, timeout, body)
    Http(reqwest::Error),
    /// The endpoint answered with a non-success status
    BadStatus(u16),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Http(e) => write!(f, "request error: {}", e),
            PublishError::BadStatus(code) => write!(f, "endpoint returned HTTP {}", code),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::Http(e) => Some(e),
            PublishError::BadStatus(_) => None,
        }
    }
}
