use thiserror::Error;

/// A recoverable wire-level error. The offending unit (frame or message) is
/// discarded and the session keeps running.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame buffer has {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
    #[error("malformed coordinate message: {0:?}")]
    MalformedCoordinates(String),
    #[error("message payload of {actual} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { actual: usize, limit: usize },
}
