//! Array literal serializer.
//!
//! Writes `{`, the elements separated by the delimiter, then `}`:
//! - `TextElement::Null` becomes the bare `NULL` token
//! - `Plain` bytes are copied as-is, `Quoted` bytes go through [`append_quoted`]
//! - `Array` children are written recursively with the same rules
//!
//! An empty nested array writes nothing and suppresses the delimiter that
//! would follow it, so `[[], [1]]` serializes to `{{1}}`.

use bytes::{Bytes, BytesMut};

use super::parser::NULL_TOKEN;
use crate::error::{ArrayError, ArrayResult};
use crate::protocol::quote::append_quoted;
use crate::types::{TextElement, TypeError};

/// Literal written for a sequence with no elements.
pub const EMPTY_ARRAY: &[u8] = b"{}";

/// Append already-encoded elements as one array literal.
pub fn append_array(buf: &mut BytesMut, elements: &[TextElement], delimiter: &[u8]) {
    if elements.is_empty() {
        buf.extend_from_slice(EMPTY_ARRAY);
        return;
    }

    buf.extend_from_slice(b"{");
    let mut pending: &[u8] = b"";
    for element in elements {
        buf.extend_from_slice(pending);
        pending = append_element(buf, element, delimiter);
    }
    buf.extend_from_slice(b"}");
}

/// Encode each element with `encode_one` and append the literal.
///
/// A conversion failure is reported with the index of the failing element;
/// `buf` is left untouched in that case.
pub fn serialize_with<E, F>(
    buf: &mut BytesMut,
    elements: &[E],
    delimiter: &[u8],
    mut encode_one: F,
) -> ArrayResult<()>
where
    F: FnMut(&E) -> Result<TextElement, TypeError>,
{
    let encoded = elements
        .iter()
        .enumerate()
        .map(|(index, element)| encode_one(element).map_err(|e| ArrayError::element(index, e)))
        .collect::<ArrayResult<Vec<_>>>()?;

    append_array(buf, &encoded, delimiter);
    Ok(())
}

/// Serialize encoded elements into a fresh buffer.
///
/// # Example
/// ```
/// use qail_array::array::serializer::serialize;
/// use qail_array::types::TextElement;
/// let out = serialize(
///     &[TextElement::Plain(b"1".to_vec()), TextElement::Null, TextElement::Quoted(b"a b".to_vec())],
///     b",",
/// );
/// assert_eq!(&out[..], b"{1,NULL,\"a b\"}");
/// ```
pub fn serialize(elements: &[TextElement], delimiter: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(elements.len() * 4 + 2);
    append_array(&mut buf, elements, delimiter);
    buf.freeze()
}

/// Write one element, returning the delimiter owed before the next sibling.
fn append_element<'d>(buf: &mut BytesMut, element: &TextElement, delimiter: &'d [u8]) -> &'d [u8] {
    match element {
        TextElement::Null => buf.extend_from_slice(NULL_TOKEN),
        TextElement::Plain(bytes) => buf.extend_from_slice(bytes),
        TextElement::Quoted(bytes) => append_quoted(buf, bytes),
        TextElement::Array(children) if children.is_empty() => return b"",
        TextElement::Array(children) => {
            buf.extend_from_slice(b"{");
            let mut pending: &[u8] = b"";
            for child in children {
                buf.extend_from_slice(pending);
                pending = append_element(buf, child, delimiter);
            }
            buf.extend_from_slice(b"}");
        }
    }
    delimiter
}
