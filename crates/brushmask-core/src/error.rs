//! Error types for mask operations.

use thiserror::Error;

/// Errors raised while decoding an RLE sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Runs cover more pixels than the declared mask size.
    #[error("RLE runs cover {actual} pixels but the mask is {width}x{height} ({expected} pixels)")]
    Overflow {
        width: u32,
        height: u32,
        expected: u64,
        actual: u64,
    },
    /// Runs stop before the declared mask size is covered.
    #[error("RLE runs end after {actual} pixels but the mask is {width}x{height} ({expected} pixels)")]
    Truncated {
        width: u32,
        height: u32,
        expected: u64,
        actual: u64,
    },
    /// The payload declares an unsupported value format.
    #[error("Unsupported mask format: {0}")]
    UnsupportedFormat(String),
}

/// Operations attempted while the stroke lock is in the wrong state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidState {
    #[error("a stroke is already being drawn on this region")]
    StrokeAlreadyActive,
    #[error("no stroke is being drawn on this region")]
    NoActiveStroke,
    #[error("cannot flatten a region while a stroke is being drawn")]
    FlattenWhileDrawing,
}

/// Errors produced by brush mask regions.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidState),
    #[error("Invalid color: {0}")]
    Color(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for MaskError {
    fn from(err: serde_json::Error) -> Self {
        MaskError::Serialization(err.to_string())
    }
}

/// Result type for mask operations.
pub type MaskResult<T> = Result<T, MaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_message() {
        let err = DecodeError::Overflow {
            width: 2,
            height: 2,
            expected: 4,
            actual: 5,
        };
        assert!(err.to_string().contains("2x2"));
    }

    #[test]
    fn test_invalid_state_converts() {
        let err: MaskError = InvalidState::NoActiveStroke.into();
        assert!(matches!(
            err,
            MaskError::InvalidState(InvalidState::NoActiveStroke)
        ));
    }
}
