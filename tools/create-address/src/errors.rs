/// Errors during RLP encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Payload length does not fit the 8-byte length-of-length field.
    #[error("payload of {0} bytes exceeds the RLP length limit")]
    PayloadTooLong(usize),
}

/// Errors during RLP decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("input ended before the item was complete")]
    Truncated,
    #[error("{0} trailing bytes after the top-level item")]
    TrailingBytes(usize),
    /// A length that should have used the short form, or carries leading zeros.
    #[error("non-canonical length prefix")]
    NonCanonicalLength,
    /// A single byte below 0x80 wrapped in a string prefix.
    #[error("non-canonical single byte encoding")]
    NonCanonicalSingleByte,
    #[error("length prefix does not fit in memory")]
    LengthOverflow,
}

/// Malformed account identity handed to the predictor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("account identity must be {expected} bytes, got {actual}")]
    AccountWidth { expected: usize, actual: usize },
}

/// Errors from [`crate::predict_create_address`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
