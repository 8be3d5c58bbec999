use std::{error::Error, fmt, io};

/// The overlay crate's result type.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// All errors that can occur between the telemetry bus and the overlay.
#[derive(Debug)]
pub enum OverlayError {
    /// Topic names must be non-empty, start with `/` and contain no whitespace.
    InvalidTopic(String),
    /// An inbound payload could not be decoded into a status message.
    Decode(serde_json::Error),
    /// A status message could not be encoded for publishing.
    Encode(serde_json::Error),
    /// The delivery thread for a subscription could not be started.
    Spawn(io::Error),
    /// Invalid host configuration.
    InvalidConfig(String),
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTopic(topic) => write!(f, "invalid topic name: {topic:?}"),
            Self::Decode(e) => write!(f, "malformed status message: {e}"),
            Self::Encode(e) => write!(f, "cannot encode status message: {e}"),
            Self::Spawn(e) => write!(f, "cannot start delivery thread: {e}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for OverlayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(e) | Self::Encode(e) => Some(e),
            Self::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for OverlayError {
    fn from(value: io::Error) -> Self {
        Self::Spawn(value)
    }
}
