//! NDR error types

use thiserror::Error;

/// NDR encoding/decoding errors
///
/// Every decode failure is fatal to the call that produced it: a malformed
/// stub means either the stream is out of step with the server or the server
/// sent something this client does not understand.
#[derive(Debug, Error)]
pub enum NdrError {
    /// The input ended in the middle of a field
    #[error("truncated input: needed {needed} bytes, have {remaining}")]
    TruncatedInput { needed: usize, remaining: usize },

    /// A declared element count disagrees with the actual or expected count
    #[error("length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A decoded SID is internally inconsistent
    #[error("malformed SID: {0}")]
    MalformedSid(String),

    /// The caller supplied a value that cannot be encoded
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A union discriminant or information class is not the one requested
    #[error("unexpected tag: expected {expected}, got {actual}")]
    UnexpectedTag { expected: u32, actual: u32 },

    /// UTF-16 payload that does not decode to a string
    #[error("invalid string: {0}")]
    InvalidString(#[from] std::string::FromUtf16Error),

    /// A declared count exceeds the configured decode limit
    #[error("count {requested} exceeds limit {limit}")]
    LimitExceeded { requested: usize, limit: usize },
}

impl NdrError {
    pub(crate) fn truncated(needed: usize, remaining: usize) -> Self {
        Self::TruncatedInput { needed, remaining }
    }

    pub(crate) fn length_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            context,
            expected,
            actual,
        }
    }
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
