//! Double-quote escaping for a single array element.
//!
//! Inside `"..."` the server escapes only `"` and `\`, each with a leading `\`.

use std::borrow::Cow;

use bytes::BytesMut;

/// Append `value` to `buf` as a quoted array element.
///
/// # Example
/// ```
/// use bytes::BytesMut;
/// use qail_array::protocol::quote::append_quoted;
/// let mut buf = BytesMut::new();
/// append_quoted(&mut buf, br#"a"b\c"#);
/// assert_eq!(&buf[..], br#""a\"b\\c""#);
/// ```
pub fn append_quoted(buf: &mut BytesMut, value: &[u8]) {
    buf.reserve(value.len() + 2);
    buf.extend_from_slice(b"\"");

    let mut rest = value;
    while let Some(pos) = rest.iter().position(|&b| b == b'"' || b == b'\\') {
        buf.extend_from_slice(&rest[..pos]);
        buf.extend_from_slice(&[b'\\', rest[pos]]);
        rest = &rest[pos + 1..];
    }

    buf.extend_from_slice(rest);
    buf.extend_from_slice(b"\"");
}

/// Quote `value` into a fresh buffer.
pub fn quote(value: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(value.len() + 2);
    append_quoted(&mut buf, value);
    buf.to_vec()
}

/// Body of a quoted element, as located by [`scan_quoted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedSpan {
    /// Offset of the first byte after the opening quote.
    pub start: usize,
    /// Offset of the closing quote.
    pub end: usize,
    /// Whether any `\` escape occurs between them.
    pub escaped: bool,
}

/// Locate the closing quote of an element whose opening quote is at `open`.
///
/// Returns `None` if the input ends before an unescaped `"`.
pub fn scan_quoted(input: &[u8], open: usize) -> Option<QuotedSpan> {
    let start = open + 1;
    let mut escaped = false;
    let mut i = start;
    while i < input.len() {
        match input[i] {
            b'\\' => {
                escaped = true;
                i += 2;
            }
            b'"' => {
                return Some(QuotedSpan {
                    start,
                    end: i,
                    escaped,
                });
            }
            _ => i += 1,
        }
    }
    None
}

/// Remove element escapes from the body of a quoted element.
///
/// Borrows when there is nothing to rewrite. A trailing lone `\` is dropped.
pub fn unescape_quoted(body: &[u8]) -> Cow<'_, [u8]> {
    if !body.contains(&b'\\') {
        return Cow::Borrowed(body);
    }

    let mut out = Vec::with_capacity(body.len());
    let mut bytes = body.iter();
    while let Some(&b) = bytes.next() {
        if b == b'\\' {
            if let Some(&next) = bytes.next() {
                out.push(next);
            }
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}
