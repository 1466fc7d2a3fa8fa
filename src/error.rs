// Error handling for the playback controller

use std::fmt;

/// Playback error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// Failed to construct or initialize a playback engine
    InitializationError(String),

    /// Failed to open/load the source
    LoadError(String),

    /// Playback error
    PlaybackError(String),

    /// Invalid state transition
    InvalidState(String),

    /// Media format not supported by the active engine
    UnsupportedFormat(String),

    /// Decoding error
    DecodingError(String),

    /// Network error (download/streaming)
    NetworkError(String),

    /// IO error
    IoError(String),

    /// Generic error
    Other(String),
}

impl PlayerError {
    /// Whether a second engine implementation could plausibly succeed on
    /// the same source. Only these failure classes trigger the one-time
    /// fallback-engine substitution; everything else is terminal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlayerError::DecodingError(_) | PlayerError::UnsupportedFormat(_)
        )
    }
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlayerError::InitializationError(msg) => write!(f, "Initialization error: {}", msg),
            PlayerError::LoadError(msg) => write!(f, "Load error: {}", msg),
            PlayerError::PlaybackError(msg) => write!(f, "Playback error: {}", msg),
            PlayerError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            PlayerError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            PlayerError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            PlayerError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            PlayerError::IoError(msg) => write!(f, "IO error: {}", msg),
            PlayerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for PlayerError {}

/// Result type alias for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;

// Conversion implementations
impl From<std::io::Error> for PlayerError {
    fn from(err: std::io::Error) -> Self {
        PlayerError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(PlayerError::DecodingError("bad nal unit".into()).is_recoverable());
        assert!(PlayerError::UnsupportedFormat("av1".into()).is_recoverable());

        assert!(!PlayerError::InitializationError("no device".into()).is_recoverable());
        assert!(!PlayerError::LoadError("404".into()).is_recoverable());
        assert!(!PlayerError::NetworkError("timeout".into()).is_recoverable());
        assert!(!PlayerError::PlaybackError("underrun".into()).is_recoverable());
        assert!(!PlayerError::Other("?".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = PlayerError::DecodingError("bad packet".into());
        assert_eq!(err.to_string(), "Decoding error: bad packet");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PlayerError = io.into();
        assert!(matches!(err, PlayerError::IoError(_)));
    }
}
