//! # qail-array
//!
//! Text codec for PostgreSQL array literals and `bytea` values.
//!
//! Values travel between Rust sequences and the server's array text form,
//! `{1,2,3}`, `{{1,2},{3,4}}`, `{"a,b",NULL}`, in both directions.
//!
//! ## Quick Example
//!
//! ```
//! use qail_array::prelude::*;
//!
//! let ctx = TextContext::default();
//!
//! let ids = Int64Array::decode(b"{1,2,3}", &ctx).unwrap();
//! assert_eq!(ids.into_inner(), vec![1, 2, 3]);
//!
//! let names = StringArray::from(vec!["a,b".to_string(), "NULL".to_string()]);
//! assert_eq!(&names.encode(&ctx).unwrap()[..], br#"{"a,b","NULL"}"#);
//! ```
//!
//! ## Layers
//!
//! | Module       | Role                                                  |
//! |--------------|-------------------------------------------------------|
//! | [`array`]    | Literal parser, serializer, typed arrays              |
//! | [`protocol`] | Quoting rules and the `bytea` hex/escape formats      |
//! | [`types`]    | Element conversions and the [`ElementCodec`] trait    |
//! | [`config`]   | Server version, timezone and infinity bounds          |
//! | [`error`]    | [`ArrayError`]                                        |

pub mod array;
pub mod config;
pub mod error;
pub mod protocol;
pub mod types;

pub use array::{
    ArrayLiteral, BoolArray, ByteaArray, Float32Array, Float64Array, GenericArray, Int32Array,
    Int64Array, PgArray, RawElement, StringArray, TimestampArray, decode_fixed,
};
pub use config::{CodecConfig, InfinityBounds, TextContext};
pub use error::{ArrayError, ArrayResult};
pub use types::{Bytea, ElementCodec, ElementKind, PgElement, TextElement, TypeError};

pub mod prelude {
    pub use crate::array::*;
    pub use crate::config::{CodecConfig, InfinityBounds, TextContext};
    pub use crate::error::*;
    pub use crate::types::{Bytea, ElementCodec, ElementKind, PgElement, TextElement, TypeError};
}

/// Parse an array literal with the default `,` delimiter.
///
/// # Example
///
/// ```
/// let lit = qail_array::parse(b"{{1,2},{3,4}}").unwrap();
/// assert_eq!(lit.dims, vec![2, 2]);
/// ```
pub fn parse(input: &[u8]) -> ArrayResult<ArrayLiteral<'_>> {
    array::parse_array(input, types::DEFAULT_DELIMITER)
}

/// Decode a one-dimensional literal into a `Vec<T>`.
pub fn decode<T: PgElement>(input: &[u8], ctx: &TextContext) -> ArrayResult<Vec<T>> {
    PgArray::<T>::decode(input, ctx).map(PgArray::into_inner)
}

/// Encode a slice of values as an array literal.
///
/// # Example
///
/// ```
/// use qail_array::TextContext;
///
/// let out = qail_array::encode(&[Some(1i32), None], &TextContext::default()).unwrap();
/// assert_eq!(&out[..], b"{1,NULL}");
/// ```
pub fn encode<T: PgElement>(values: &[T], ctx: &TextContext) -> ArrayResult<bytes::Bytes> {
    let mut buf = bytes::BytesMut::new();
    array::serialize_with(&mut buf, values, T::delimiter(), |value| value.encode_element(ctx))?;
    Ok(buf.freeze())
}
