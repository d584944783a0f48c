//! Error types for wavflac

use thiserror::Error;

/// Result type alias for wavflac operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wavflac
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (filesystem failure, premature end of a byte stream)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unexpected container structure
    #[error("Structural error: {0}")]
    Structural(String),

    /// Channel count, sample rate or sample depth outside supported bounds
    #[error("Range error: {0}")]
    Range(String),

    /// Content digest mismatch
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Corrupt frame data (bad CRC, reserved code, malformed subframe)
    #[error("Codec error: {0}")]
    Codec(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid input supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bit reader ran past the end of its data
    #[error("End of stream")]
    EndOfStream,
}

impl Error {
    /// Create a structural error
    pub fn structural<S: Into<String>>(msg: S) -> Self {
        Error::Structural(msg.into())
    }

    /// Create a range error
    pub fn range<S: Into<String>>(msg: S) -> Self {
        Error::Range(msg.into())
    }

    /// Create an integrity error
    pub fn integrity<S: Into<String>>(msg: S) -> Self {
        Error::Integrity(msg.into())
    }

    /// Create a codec error
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        Error::Codec(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// True for failures of the underlying transport, including truncated input
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::structural("Invalid RIFF file header").to_string(),
            "Structural error: Invalid RIFF file header"
        );
        assert_eq!(
            Error::range("too many channels").to_string(),
            "Range error: too many channels"
        );
        assert_eq!(Error::EndOfStream.to_string(), "End of stream");
    }

    #[test]
    fn test_io_classification() {
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert!(Error::from(eof).is_io());
        assert!(Error::EndOfStream.is_io());
        assert!(!Error::integrity("digest").is_io());
    }
}
