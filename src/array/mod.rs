//! Array literal codec.
//!
//! [`parser`] turns `{...}` text into a dimension vector plus flat raw
//! elements, [`serializer`] does the reverse from encoded elements, and
//! [`PgArray`] / [`GenericArray`] connect both to typed values.

pub mod parser;
pub mod serializer;
mod typed;

use std::borrow::Cow;

pub use parser::parse_array;
pub use serializer::{append_array, serialize, serialize_with};
pub use typed::{
    BoolArray, ByteaArray, Float32Array, Float64Array, GenericArray, Int32Array, Int64Array,
    PgArray, StringArray, TimestampArray, decode_fixed,
};

use crate::error::{ArrayError, ArrayResult};

/// One element of a parsed literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawElement<'a> {
    /// The bare `NULL` token.
    Null,
    /// Element text, unescaped.
    Bytes(Cow<'a, [u8]>),
}

impl<'a> RawElement<'a> {
    /// Element text, or `None` for NULL.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawElement::Null => None,
            RawElement::Bytes(bytes) => Some(&**bytes),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawElement::Null)
    }

    /// Detach from the input buffer.
    pub fn into_owned(self) -> RawElement<'static> {
        match self {
            RawElement::Null => RawElement::Null,
            RawElement::Bytes(bytes) => RawElement::Bytes(Cow::Owned(bytes.into_owned())),
        }
    }
}

/// Result of parsing an array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLiteral<'a> {
    /// Element count per nesting level, outermost first.
    pub dims: Vec<usize>,
    /// All elements in order, flattened across dimensions.
    pub elements: Vec<RawElement<'a>>,
}

impl<'a> ArrayLiteral<'a> {
    /// `{}`: no elements, one dimension of length zero.
    pub fn empty() -> Self {
        Self {
            dims: vec![0],
            elements: Vec::new(),
        }
    }

    /// Number of dimensions.
    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    /// Dimensions in SQL notation, e.g. `[2][2]`.
    pub fn shape(&self) -> String {
        self.dims.iter().map(|d| format!("[{d}]")).collect()
    }

    /// Elements of a one-dimensional literal, rejecting anything deeper.
    pub fn into_linear(self, target: &'static str) -> ArrayResult<Vec<RawElement<'a>>> {
        if self.dims.len() > 1 {
            tracing::debug!(shape = %self.shape(), into = target, "refusing multidimensional array");
            return Err(ArrayError::Unsupported {
                shape: self.shape(),
                target,
            });
        }
        Ok(self.elements)
    }
}

/// Parse a literal that must be one-dimensional.
///
/// `target` names the destination type in the error for deeper literals.
/// The raw form of such literals stays available through [`parse_array`].
pub fn decode_linear<'a>(
    input: &'a [u8],
    delimiter: &[u8],
    target: &'static str,
) -> ArrayResult<Vec<RawElement<'a>>> {
    parse_array(input, delimiter)?.into_linear(target)
}
