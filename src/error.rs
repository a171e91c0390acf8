//! Error types for array literal parsing and serialization.

use thiserror::Error;

use crate::types::TypeError;

/// The main error type for array codec operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// The literal does not follow the server's array grammar.
    #[error("unable to parse array; {message} at offset {offset}")]
    Malformed { offset: usize, message: String },

    /// Sibling groups report counts that cannot form a rectangular array.
    #[error("multidimensional arrays must have elements with matching dimensions")]
    DimensionMismatch,

    /// The literal has more dimensions than the target container supports.
    #[error("cannot convert ARRAY{shape} to {target}")]
    Unsupported { shape: String, target: &'static str },

    /// A fixed-size target received a different number of elements.
    #[error("cannot convert ARRAY[{got}] to {target} of length {expected}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        target: &'static str,
    },

    /// An element could not be converted to or from its text form.
    #[error("array element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: TypeError,
    },
}

impl ArrayError {
    /// Create a malformed-literal error at the given byte offset.
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            message: message.into(),
        }
    }

    /// Report an unexpected byte at `offset`.
    pub(crate) fn unexpected(offset: usize, byte: u8) -> Self {
        Self::malformed(offset, format!("unexpected '{}'", byte.escape_ascii()))
    }

    /// Report a missing byte expected at `offset`.
    pub(crate) fn expected(offset: usize, byte: u8) -> Self {
        Self::malformed(offset, format!("expected '{}'", byte.escape_ascii()))
    }

    /// Attach an element index to a conversion failure.
    pub fn element(index: usize, source: TypeError) -> Self {
        Self::Element { index, source }
    }

    /// Byte offset of a malformed literal, if this is a parse error.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Malformed { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Result type alias for array codec operations.
pub type ArrayResult<T> = Result<T, ArrayError>;
