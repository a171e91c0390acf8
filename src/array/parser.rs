//! Array literal parser.
//!
//! Single forward scan over the literal with an explicit depth counter,
//! following the grammar the server uses when printing arrays:
//!
//! ```text
//! {1,2,3}            dims [3]
//! {{1,2},{3,4}}      dims [2,2]
//! {"a,b",NULL,c}     quoted, NULL and bare elements
//! ```
//!
//! Elements are returned flat, in order. Bare elements borrow the input;
//! quoted elements borrow unless they contain escapes.

use std::borrow::Cow;

use super::{ArrayLiteral, RawElement};
use crate::error::{ArrayError, ArrayResult};
use crate::protocol::quote::{scan_quoted, unescape_quoted};

/// Bare token that stands for a NULL element.
pub const NULL_TOKEN: &[u8] = b"NULL";

/// Parse an array literal whose elements are separated by `delimiter`.
///
/// # Example
/// ```
/// use qail_array::array::parser::parse_array;
/// let lit = parse_array(b"{{1,2},{3,4}}", b",").unwrap();
/// assert_eq!(lit.dims, vec![2, 2]);
/// assert_eq!(lit.elements.len(), 4);
/// ```
pub fn parse_array<'a>(input: &'a [u8], delimiter: &[u8]) -> ArrayResult<ArrayLiteral<'a>> {
    if delimiter.is_empty() {
        return Err(ArrayError::malformed(0, "empty delimiter"));
    }
    if input.first() != Some(&b'{') {
        return Err(ArrayError::expected(0, b'{'));
    }

    let mut depth = 0usize;
    let mut i = 0usize;

    while i < input.len() {
        match input[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => return close(input, i, depth, ArrayLiteral::empty()),
            _ => break,
        }
    }

    // Every `{` seen before the first element fixes one dimension.
    let mut dims = vec![0usize; depth];
    let mut elements = Vec::new();

    'element: loop {
        while i < input.len() {
            match input[i] {
                b'{' => {
                    if depth == dims.len() {
                        break;
                    }
                    depth += 1;
                    dims[depth - 1] = 0;
                    i += 1;
                }
                b'"' => {
                    match scan_quoted(input, i) {
                        Some(span) => {
                            let body = &input[span.start..span.end];
                            let value = if span.escaped {
                                unescape_quoted(body)
                            } else {
                                Cow::Borrowed(body)
                            };
                            elements.push(RawElement::Bytes(value));
                            i = span.end + 1;
                        }
                        None => i = input.len(),
                    }
                    break;
                }
                _ => {
                    let start = i;
                    while i < input.len() && input[i] != b'}' && !input[i..].starts_with(delimiter)
                    {
                        i += 1;
                    }
                    if i == input.len() {
                        break;
                    }
                    if i == start {
                        return Err(ArrayError::unexpected(i, input[i]));
                    }
                    let token = &input[start..i];
                    elements.push(if token == NULL_TOKEN {
                        RawElement::Null
                    } else {
                        RawElement::Bytes(Cow::Borrowed(token))
                    });
                    break;
                }
            }
        }

        while i < input.len() {
            if depth > 0 && input[i..].starts_with(delimiter) {
                dims[depth - 1] += 1;
                i += delimiter.len();
                continue 'element;
            } else if depth > 0 && input[i] == b'}' {
                dims[depth - 1] += 1;
                depth -= 1;
                i += 1;
            } else {
                return Err(ArrayError::unexpected(i, input[i]));
            }
        }
        break;
    }

    close(input, i, depth, ArrayLiteral { dims, elements })
}

/// Consume trailing `}` bytes and run the final shape check.
fn close<'a>(
    input: &[u8],
    mut i: usize,
    mut depth: usize,
    literal: ArrayLiteral<'a>,
) -> ArrayResult<ArrayLiteral<'a>> {
    while i < input.len() {
        if depth > 0 && input[i] == b'}' {
            depth -= 1;
            i += 1;
        } else {
            return Err(ArrayError::unexpected(i, input[i]));
        }
    }
    if depth > 0 {
        return Err(ArrayError::expected(i, b'}'));
    }

    // Lenient: only divisibility is checked, not per-level shape equality.
    let total = literal.elements.len();
    if literal.dims.iter().any(|&d| d != 0 && total % d != 0) {
        return Err(ArrayError::DimensionMismatch);
    }

    tracing::trace!(dims = ?literal.dims, elements = total, "parsed array literal");
    Ok(literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bytes(s: &str) -> RawElement<'_> {
        RawElement::Bytes(Cow::Borrowed(s.as_bytes()))
    }

    #[test]
    fn test_empty_array() {
        let lit = parse_array(b"{}", b",").unwrap();
        assert_eq!(lit.dims, vec![0]);
        assert!(lit.elements.is_empty());
    }

    #[test]
    fn test_flat_array() {
        let lit = parse_array(b"{1,2,3}", b",").unwrap();
        assert_eq!(lit.dims, vec![3]);
        assert_eq!(lit.elements, vec![bytes("1"), bytes("2"), bytes("3")]);
    }

    #[test]
    fn test_nested_array() {
        let lit = parse_array(b"{{1,2},{3,4}}", b",").unwrap();
        assert_eq!(lit.dims, vec![2, 2]);
        assert_eq!(
            lit.elements,
            vec![bytes("1"), bytes("2"), bytes("3"), bytes("4")]
        );
    }

    #[test]
    fn test_three_dimensions() {
        let lit = parse_array(b"{{{1},{2}},{{3},{4}}}", b",").unwrap();
        assert_eq!(lit.dims, vec![2, 2, 1]);
        assert_eq!(lit.elements.len(), 4);
    }

    #[test]
    fn test_ragged_array_rejected() {
        assert_eq!(
            parse_array(b"{{1,2},{3}}", b","),
            Err(ArrayError::DimensionMismatch)
        );
    }

    #[test]
    fn test_null_vs_quoted_null() {
        let lit = parse_array(br#"{NULL,"NULL",null}"#, b",").unwrap();
        assert_eq!(lit.elements, vec![RawElement::Null, bytes("NULL"), bytes("null")]);
    }

    #[test]
    fn test_quoted_elements() {
        let lit = parse_array(br#"{"a,b","","x\"y\\z",plain}"#, b",").unwrap();
        assert_eq!(
            lit.elements,
            vec![
                bytes("a,b"),
                bytes(""),
                RawElement::Bytes(Cow::Owned(br#"x"y\z"#.to_vec())),
                bytes("plain"),
            ]
        );
    }

    #[test]
    fn test_bare_elements_borrow_input() {
        let input = b"{abc}".to_vec();
        let lit = parse_array(&input, b",").unwrap();
        assert!(matches!(lit.elements[0], RawElement::Bytes(Cow::Borrowed(_))));
    }

    #[test]
    fn test_custom_delimiter() {
        let lit = parse_array(b"{(0,0),(1,1);(2,2),(3,3)}", b";").unwrap();
        assert_eq!(lit.dims, vec![2]);
        assert_eq!(lit.elements, vec![bytes("(0,0),(1,1)"), bytes("(2,2),(3,3)")]);
    }

    #[test]
    fn test_multibyte_delimiter() {
        let lit = parse_array(b"{a::b::c}", b"::").unwrap();
        assert_eq!(lit.elements, vec![bytes("a"), bytes("b"), bytes("c")]);
    }

    #[test]
    fn test_missing_open_brace() {
        let err = parse_array(b"1,2}", b",").unwrap_err();
        assert_eq!(err.offset(), Some(0));
        assert_eq!(parse_array(b"", b",").unwrap_err().offset(), Some(0));
    }

    #[test]
    fn test_empty_element_rejected() {
        let err = parse_array(b"{1,,2}", b",").unwrap_err();
        assert_eq!(err, ArrayError::unexpected(3, b','));
        assert_eq!(parse_array(b"{,}", b",").unwrap_err().offset(), Some(1));
        assert_eq!(parse_array(b"{1,}", b",").unwrap_err().offset(), Some(3));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(parse_array(b"{1,2", b","), Err(ArrayError::expected(4, b'}')));
        assert_eq!(parse_array(b"{{1,2}", b","), Err(ArrayError::expected(6, b'}')));
        assert_eq!(parse_array(b"{1}}", b","), Err(ArrayError::unexpected(3, b'}')));
        assert_eq!(parse_array(b"{}}", b","), Err(ArrayError::unexpected(2, b'}')));
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(parse_array(br#"{"abc}"#, b","), Err(ArrayError::expected(6, b'}')));
    }

    #[test]
    fn test_nesting_deeper_than_declared() {
        assert_eq!(
            parse_array(b"{1,{2}}", b","),
            Err(ArrayError::unexpected(3, b'{'))
        );
    }

    #[test]
    fn test_trailing_garbage() {
        assert_eq!(parse_array(b"{1}x", b","), Err(ArrayError::unexpected(3, b'x')));
    }
}
