//! Error types for the swell-proto crate.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a frame.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a frame.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Frame contents failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_display() {
        let err = ProtoError::Encoding("bad value".to_string());
        assert_eq!(err.to_string(), "encoding error: bad value");
    }

    #[test]
    fn test_decoding_error_display() {
        let err = ProtoError::Decoding("unexpected token".to_string());
        assert_eq!(err.to_string(), "decoding error: unexpected token");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ProtoError::Validation("token cannot be empty".to_string());
        assert!(err.to_string().contains("token cannot be empty"));
    }
}
