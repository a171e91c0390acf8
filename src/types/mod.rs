//! Element conversions for array literals.
//!
//! Every element type supplies a decode step (raw element text, or NULL, to a
//! value) and an encode step (value to [`TextElement`]), plus the delimiter it
//! is separated by. Built-in kinds are listed in [`ElementKind`]; callers with
//! their own element format implement [`ElementCodec`] instead.

pub mod temporal;

use thiserror::Error;

use crate::config::TextContext;
use crate::protocol::bytea::{decode_bytea, encode_bytea};

/// Delimiter used by every built-in element type.
pub const DEFAULT_DELIMITER: &[u8] = b",";

/// Error type for element conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Token is not `t` or `f`.
    #[error("invalid boolean {0:?}")]
    InvalidBool(String),
    /// Token is not a valid number of the requested width.
    #[error("invalid {kind} {token:?}: {reason}")]
    InvalidNumber {
        kind: &'static str,
        token: String,
        reason: String,
    },
    /// Element bytes are not UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),
    /// Element is not a timestamp the server would print.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Non-hex digit in hex `bytea` input.
    #[error("invalid hex digit at offset {offset}")]
    InvalidHex { offset: usize },
    /// Hex `bytea` body with an odd number of digits.
    #[error("odd length hex body ({0} digits)")]
    OddHexLength(usize),
    /// Bad `\` sequence in escape-format `bytea` input.
    #[error("invalid bytea escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
    /// NULL element for a type that cannot hold it.
    #[error("unexpected NULL value")]
    UnexpectedNull,
    /// The element type can only be encoded.
    #[error("element type {0} has no decode capability")]
    NoDecoder(&'static str),
}

impl TypeError {
    fn number(kind: &'static str, raw: &[u8], reason: impl ToString) -> Self {
        Self::InvalidNumber {
            kind,
            token: String::from_utf8_lossy(raw).into_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Built-in element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Bool,
    Float8,
    Float4,
    Int8,
    Int4,
    Text,
    Bytea,
    Timestamp,
    Generic,
}

impl ElementKind {
    /// SQL name of the element type.
    pub fn type_name(self) -> &'static str {
        match self {
            ElementKind::Bool => "bool",
            ElementKind::Float8 => "float8",
            ElementKind::Float4 => "float4",
            ElementKind::Int8 => "int8",
            ElementKind::Int4 => "int4",
            ElementKind::Text => "text",
            ElementKind::Bytea => "bytea",
            ElementKind::Timestamp => "timestamptz",
            ElementKind::Generic => "generic",
        }
    }

    /// Name of the matching array type, used in conversion errors.
    pub fn array_name(self) -> &'static str {
        match self {
            ElementKind::Bool => "BoolArray",
            ElementKind::Float8 => "Float64Array",
            ElementKind::Float4 => "Float32Array",
            ElementKind::Int8 => "Int64Array",
            ElementKind::Int4 => "Int32Array",
            ElementKind::Text => "StringArray",
            ElementKind::Bytea => "ByteaArray",
            ElementKind::Timestamp => "TimestampArray",
            ElementKind::Generic => "GenericArray",
        }
    }
}

/// Encoded form of one element, before it is placed into a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextElement {
    /// Written as the bare `NULL` token.
    Null,
    /// Written verbatim; must not contain delimiters, braces or quotes.
    Plain(Vec<u8>),
    /// Written inside `"..."` with `"` and `\` escaped.
    Quoted(Vec<u8>),
    /// A nested array, written with the same rules.
    Array(Vec<TextElement>),
}

/// Conversion between a Rust type and its array element text.
pub trait PgElement: Sized {
    /// Kind reported in errors.
    const KIND: ElementKind;

    /// Separator between sibling elements of this type.
    fn delimiter() -> &'static [u8] {
        DEFAULT_DELIMITER
    }

    /// Convert raw element text (`None` for NULL).
    fn decode_element(raw: Option<&[u8]>, ctx: &TextContext) -> Result<Self, TypeError>;

    /// Convert to element text.
    fn encode_element(&self, ctx: &TextContext) -> Result<TextElement, TypeError>;
}

/// Caller-supplied element format for [`GenericArray`](crate::array::GenericArray).
///
/// Only `encode` is required. A codec that leaves `decode` alone can build
/// literals but reports [`TypeError::NoDecoder`] when asked to read one.
pub trait ElementCodec {
    type Item;

    /// Name reported in errors.
    fn name(&self) -> &'static str {
        ElementKind::Generic.array_name()
    }

    /// Delimiter override; `None` keeps the comma.
    fn delimiter(&self) -> Option<&[u8]> {
        None
    }

    fn decode(&self, raw: Option<&[u8]>, ctx: &TextContext) -> Result<Self::Item, TypeError> {
        let _ = (raw, ctx);
        Err(TypeError::NoDecoder(self.name()))
    }

    fn encode(&self, item: &Self::Item, ctx: &TextContext) -> Result<TextElement, TypeError>;
}

fn non_null(raw: Option<&[u8]>) -> Result<&[u8], TypeError> {
    raw.ok_or(TypeError::UnexpectedNull)
}

fn utf8(raw: &[u8]) -> Result<&str, TypeError> {
    std::str::from_utf8(raw).map_err(|e| TypeError::InvalidUtf8(e.to_string()))
}

// ==================== Boolean ====================

/// Booleans use the server's array output form, `t` / `f`, in both directions.
impl PgElement for bool {
    const KIND: ElementKind = ElementKind::Bool;

    fn decode_element(raw: Option<&[u8]>, _ctx: &TextContext) -> Result<Self, TypeError> {
        match non_null(raw)? {
            b"t" => Ok(true),
            b"f" => Ok(false),
            other => Err(TypeError::InvalidBool(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    fn encode_element(&self, _ctx: &TextContext) -> Result<TextElement, TypeError> {
        Ok(TextElement::Plain(if *self { b"t" } else { b"f" }.to_vec()))
    }
}

// ==================== Float Types ====================

macro_rules! impl_float_element {
    ($ty:ty, $kind:expr, $name:literal) => {
        impl PgElement for $ty {
            const KIND: ElementKind = $kind;

            fn decode_element(raw: Option<&[u8]>, _ctx: &TextContext) -> Result<Self, TypeError> {
                let raw = non_null(raw)?;
                utf8(raw)?
                    .parse::<$ty>()
                    .map_err(|e| TypeError::number($name, raw, e))
            }

            fn encode_element(&self, _ctx: &TextContext) -> Result<TextElement, TypeError> {
                let mut tmp = ryu::Buffer::new();
                let text = if self.is_nan() {
                    "NaN"
                } else if self.is_infinite() {
                    if self.is_sign_positive() { "Infinity" } else { "-Infinity" }
                } else {
                    tmp.format_finite(*self)
                };
                Ok(TextElement::Plain(text.as_bytes().to_vec()))
            }
        }
    };
}

impl_float_element!(f64, ElementKind::Float8, "float8");
impl_float_element!(f32, ElementKind::Float4, "float4");

// ==================== Integer Types ====================

macro_rules! impl_int_element {
    ($ty:ty, $kind:expr, $name:literal) => {
        impl PgElement for $ty {
            const KIND: ElementKind = $kind;

            fn decode_element(raw: Option<&[u8]>, _ctx: &TextContext) -> Result<Self, TypeError> {
                let raw = non_null(raw)?;
                utf8(raw)?
                    .parse::<$ty>()
                    .map_err(|e| TypeError::number($name, raw, e))
            }

            fn encode_element(&self, _ctx: &TextContext) -> Result<TextElement, TypeError> {
                let mut tmp = itoa::Buffer::new();
                Ok(TextElement::Plain(tmp.format(*self).as_bytes().to_vec()))
            }
        }
    };
}

impl_int_element!(i64, ElementKind::Int8, "int8");
impl_int_element!(i32, ElementKind::Int4, "int4");

// ==================== Text ====================

impl PgElement for String {
    const KIND: ElementKind = ElementKind::Text;

    fn decode_element(raw: Option<&[u8]>, _ctx: &TextContext) -> Result<Self, TypeError> {
        utf8(non_null(raw)?).map(str::to_owned)
    }

    fn encode_element(&self, _ctx: &TextContext) -> Result<TextElement, TypeError> {
        Ok(TextElement::Quoted(self.as_bytes().to_vec()))
    }
}

// ==================== Bytea ====================

/// Binary element, carried through the `bytea` text format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytea(pub Vec<u8>);

impl From<Vec<u8>> for Bytea {
    fn from(bytes: Vec<u8>) -> Self {
        Bytea(bytes)
    }
}

impl AsRef<[u8]> for Bytea {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PgElement for Bytea {
    const KIND: ElementKind = ElementKind::Bytea;

    fn decode_element(raw: Option<&[u8]>, _ctx: &TextContext) -> Result<Self, TypeError> {
        decode_bytea(non_null(raw)?).map(Bytea)
    }

    fn encode_element(&self, ctx: &TextContext) -> Result<TextElement, TypeError> {
        Ok(TextElement::Quoted(encode_bytea(&self.0, ctx.server_version)))
    }
}

// ==================== Option<T> ====================

impl<T: PgElement> PgElement for Option<T> {
    const KIND: ElementKind = T::KIND;

    fn delimiter() -> &'static [u8] {
        T::delimiter()
    }

    fn decode_element(raw: Option<&[u8]>, ctx: &TextContext) -> Result<Self, TypeError> {
        raw.map(|bytes| T::decode_element(Some(bytes), ctx)).transpose()
    }

    fn encode_element(&self, ctx: &TextContext) -> Result<TextElement, TypeError> {
        match self {
            Some(value) => value.encode_element(ctx),
            None => Ok(TextElement::Null),
        }
    }
}

// ==================== Nested Arrays ====================

/// Nested sequences encode as sub-arrays. Reading them back is limited to
/// one dimension, so decoding a nested element is refused.
impl<T: PgElement> PgElement for Vec<T> {
    const KIND: ElementKind = T::KIND;

    fn delimiter() -> &'static [u8] {
        T::delimiter()
    }

    fn decode_element(_raw: Option<&[u8]>, _ctx: &TextContext) -> Result<Self, TypeError> {
        Err(TypeError::NoDecoder("nested array"))
    }

    fn encode_element(&self, ctx: &TextContext) -> Result<TextElement, TypeError> {
        self.iter()
            .map(|item| item.encode_element(ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(TextElement::Array)
    }
}
