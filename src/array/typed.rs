//! Typed arrays built on [`PgElement`] and [`ElementCodec`].

use std::ops::Deref;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, FixedOffset};

use super::{RawElement, decode_linear, serialize_with};
use crate::config::TextContext;
use crate::error::{ArrayError, ArrayResult};
use crate::types::{Bytea, DEFAULT_DELIMITER, ElementCodec, PgElement, TypeError};

/// One-dimensional array of `T`.
///
/// # Example
/// ```
/// use qail_array::{BoolArray, TextContext};
/// let ctx = TextContext::default();
/// let flags = BoolArray::from(vec![true, false]);
/// assert_eq!(&flags.encode(&ctx).unwrap()[..], b"{t,f}");
/// assert_eq!(BoolArray::decode(b"{t,f}", &ctx).unwrap(), flags);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PgArray<T>(pub Vec<T>);

pub type BoolArray = PgArray<bool>;
pub type Float64Array = PgArray<f64>;
pub type Float32Array = PgArray<f32>;
pub type Int64Array = PgArray<i64>;
pub type Int32Array = PgArray<i32>;
pub type StringArray = PgArray<String>;
/// Rejects NULL elements; use `PgArray<Option<Bytea>>` for NULL-able slots.
pub type ByteaArray = PgArray<Bytea>;
pub type TimestampArray = PgArray<DateTime<FixedOffset>>;

impl<T: PgElement> PgArray<T> {
    /// Decode a one-dimensional literal.
    pub fn decode(input: &[u8], ctx: &TextContext) -> ArrayResult<Self> {
        let raw = decode_linear(input, T::delimiter(), T::KIND.array_name())?;
        decode_elements(&raw, |r| T::decode_element(r, ctx)).map(PgArray)
    }

    /// Append the literal to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut, ctx: &TextContext) -> ArrayResult<()> {
        serialize_with(buf, &self.0, T::delimiter(), |value| value.encode_element(ctx))
    }

    /// Encode into a new buffer.
    pub fn encode(&self, ctx: &TextContext) -> ArrayResult<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf, ctx)?;
        Ok(buf.freeze())
    }
}

impl<T> PgArray<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> From<Vec<T>> for PgArray<T> {
    fn from(values: Vec<T>) -> Self {
        PgArray(values)
    }
}

impl<T> FromIterator<T> for PgArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        PgArray(iter.into_iter().collect())
    }
}

impl<T> Deref for PgArray<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Decode a one-dimensional literal into exactly `N` elements.
pub fn decode_fixed<T: PgElement, const N: usize>(
    input: &[u8],
    ctx: &TextContext,
) -> ArrayResult<[T; N]> {
    let target = T::KIND.array_name();
    let raw = decode_linear(input, T::delimiter(), target)?;
    if raw.len() != N {
        return Err(ArrayError::LengthMismatch {
            expected: N,
            got: raw.len(),
            target,
        });
    }

    decode_elements(&raw, |r| T::decode_element(r, ctx))?
        .try_into()
        .map_err(|values: Vec<T>| ArrayError::LengthMismatch {
            expected: N,
            got: values.len(),
            target,
        })
}

/// Array whose element format is supplied at runtime by an [`ElementCodec`].
#[derive(Debug, Clone)]
pub struct GenericArray<C> {
    codec: C,
}

impl<C: ElementCodec> GenericArray<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The codec's delimiter, or a comma when it declares none.
    pub fn delimiter(&self) -> &[u8] {
        self.codec.delimiter().unwrap_or(DEFAULT_DELIMITER)
    }

    pub fn decode(&self, input: &[u8], ctx: &TextContext) -> ArrayResult<Vec<C::Item>> {
        let raw = decode_linear(input, self.delimiter(), self.codec.name())?;
        decode_elements(&raw, |r| self.codec.decode(r, ctx))
    }

    pub fn encode_into(
        &self,
        buf: &mut BytesMut,
        items: &[C::Item],
        ctx: &TextContext,
    ) -> ArrayResult<()> {
        serialize_with(buf, items, self.delimiter(), |item| self.codec.encode(item, ctx))
    }

    pub fn encode(&self, items: &[C::Item], ctx: &TextContext) -> ArrayResult<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf, items, ctx)?;
        Ok(buf.freeze())
    }
}

fn decode_elements<T>(
    raw: &[RawElement<'_>],
    mut decode_one: impl FnMut(Option<&[u8]>) -> Result<T, TypeError>,
) -> ArrayResult<Vec<T>> {
    raw.iter()
        .enumerate()
        .map(|(index, element)| {
            decode_one(element.as_bytes()).map_err(|e| ArrayError::element(index, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextElement;
    use pretty_assertions::assert_eq;

    fn ctx() -> TextContext {
        TextContext::default()
    }

    fn encode<T: PgElement>(values: Vec<T>) -> String {
        let out = PgArray(values).encode(&ctx()).unwrap();
        String::from_utf8(out.to_vec()).unwrap()
    }

    #[test]
    fn test_empty_arrays() {
        assert_eq!(encode(Vec::<bool>::new()), "{}");
        assert_eq!(encode(Vec::<String>::new()), "{}");
        assert_eq!(encode(Vec::<Bytea>::new()), "{}");
        assert!(Int64Array::decode(b"{}", &ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_bool_array() {
        assert_eq!(encode(vec![true, false]), "{t,f}");
        assert_eq!(
            BoolArray::decode(b"{t,f,t}", &ctx()).unwrap().into_inner(),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_numeric_arrays() {
        assert_eq!(encode(vec![1i64, -2, 300]), "{1,-2,300}");
        assert_eq!(encode(vec![0.5f64, -1.25]), "{0.5,-1.25}");
        assert_eq!(
            Float64Array::decode(b"{1.5,-2,1e+20,Infinity}", &ctx()).unwrap().into_inner(),
            vec![1.5, -2.0, 1e20, f64::INFINITY]
        );
        assert_eq!(
            Int32Array::decode(b"{7,-8}", &ctx()).unwrap().into_inner(),
            vec![7, -8]
        );
    }

    #[test]
    fn test_string_array_quoting() {
        let values = vec![r#"a"b\c"#.to_string(), "x,y".to_string(), String::new()];
        let text = encode(values.clone());
        assert_eq!(text, r#"{"a\"b\\c","x,y",""}"#);
        assert_eq!(
            StringArray::decode(text.as_bytes(), &ctx()).unwrap().into_inner(),
            values
        );
    }

    #[test]
    fn test_null_vs_text_null() {
        let values = PgArray::<Option<String>>::decode(br#"{NULL,"NULL"}"#, &ctx()).unwrap();
        assert_eq!(values.into_inner(), vec![None, Some("NULL".to_string())]);
        assert_eq!(encode(vec![None, Some("NULL".to_string())]), r#"{NULL,"NULL"}"#);
    }

    #[test]
    fn test_null_in_non_nullable_reports_index() {
        let err = Int64Array::decode(b"{1,NULL}", &ctx()).unwrap_err();
        assert_eq!(err, ArrayError::element(1, TypeError::UnexpectedNull));
    }

    #[test]
    fn test_invalid_element_reports_index() {
        let err = BoolArray::decode(b"{t,f,maybe}", &ctx()).unwrap_err();
        assert_eq!(
            err,
            ArrayError::element(2, TypeError::InvalidBool("maybe".to_string()))
        );
    }

    #[test]
    fn test_multidimensional_rejected() {
        let err = Int64Array::decode(b"{{1,2},{3,4}}", &ctx()).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert ARRAY[2][2] to Int64Array");
    }

    #[test]
    fn test_bytea_array_roundtrip_per_server_version() {
        let values = vec![Bytea(vec![0, 1, 0xff]), Bytea(b"\\\"".to_vec()), Bytea(vec![])];
        for version in [90000, 80400] {
            let ctx = ctx().with_server_version(version);
            let out = PgArray(values.clone()).encode(&ctx).unwrap();
            assert_eq!(ByteaArray::decode(&out, &ctx).unwrap().into_inner(), values);
        }
        assert_eq!(encode(vec![Bytea(vec![0xde, 0xad])]), r#"{"\\xdead"}"#);
    }

    #[test]
    fn test_nullable_bytea_array() {
        let values = vec![Some(Bytea(vec![0x01])), None];
        assert_eq!(encode(values.clone()), r#"{"\\x01",NULL}"#);
        assert_eq!(
            PgArray::<Option<Bytea>>::decode(br#"{"\\x01",NULL}"#, &ctx())
                .unwrap()
                .into_inner(),
            values
        );

        let err = ByteaArray::decode(br#"{"\\x01",NULL}"#, &ctx()).unwrap_err();
        assert_eq!(err, ArrayError::element(1, TypeError::UnexpectedNull));
    }

    #[test]
    fn test_nested_vec_encodes() {
        assert_eq!(encode(vec![vec![1i32, 2], vec![3, 4]]), "{{1,2},{3,4}}");
        assert_eq!(encode(vec![Vec::<i32>::new(), vec![1]]), "{{1}}");
    }

    #[test]
    fn test_decode_fixed() {
        let pair: [i64; 2] = decode_fixed(b"{10,20}", &ctx()).unwrap();
        assert_eq!(pair, [10, 20]);

        let err = decode_fixed::<i64, 3>(b"{10,20}", &ctx()).unwrap_err();
        assert_eq!(
            err,
            ArrayError::LengthMismatch {
                expected: 3,
                got: 2,
                target: "Int64Array",
            }
        );
    }

    #[test]
    fn test_timestamp_array() {
        let ts = DateTime::parse_from_rfc3339("2024-12-25T17:30:00+02:00").unwrap();
        let text = encode(vec![ts]);
        assert_eq!(text, "{2024-12-25 17:30:00+02:00}");
        let quoted = br#"{"2024-12-25 17:30:00+02"}"#;
        assert_eq!(TimestampArray::decode(quoted, &ctx()).unwrap().into_inner(), vec![ts]);
    }

    /// Geometric boxes use `;` because their text form contains commas.
    struct BoxCodec;

    impl ElementCodec for BoxCodec {
        type Item = String;

        fn name(&self) -> &'static str {
            "BoxArray"
        }

        fn delimiter(&self) -> Option<&[u8]> {
            Some(b";")
        }

        fn decode(&self, raw: Option<&[u8]>, _ctx: &TextContext) -> Result<String, TypeError> {
            let raw = raw.ok_or(TypeError::UnexpectedNull)?;
            String::from_utf8(raw.to_vec()).map_err(|e| TypeError::InvalidUtf8(e.to_string()))
        }

        fn encode(&self, item: &String, _ctx: &TextContext) -> Result<TextElement, TypeError> {
            Ok(TextElement::Plain(item.as_bytes().to_vec()))
        }
    }

    /// Encode-only codec.
    struct UpperCodec;

    impl ElementCodec for UpperCodec {
        type Item = String;

        fn encode(&self, item: &String, _ctx: &TextContext) -> Result<TextElement, TypeError> {
            Ok(TextElement::Quoted(item.to_uppercase().into_bytes()))
        }
    }

    #[test]
    fn test_generic_array_with_delimiter_override() {
        let boxes = GenericArray::new(BoxCodec);
        assert_eq!(boxes.delimiter(), b";");

        let items = vec!["(1,1),(0,0)".to_string(), "(2,2),(1,1)".to_string()];
        let out = boxes.encode(&items, &ctx()).unwrap();
        assert_eq!(&out[..], b"{(1,1),(0,0);(2,2),(1,1)}");
        assert_eq!(boxes.decode(&out, &ctx()).unwrap(), items);
    }

    #[test]
    fn test_generic_array_without_decoder() {
        let upper = GenericArray::new(UpperCodec);
        assert_eq!(upper.delimiter(), b",");

        let out = upper.encode(&["ab".to_string()], &ctx()).unwrap();
        assert_eq!(&out[..], br#"{"AB"}"#);

        let err = upper.decode(b"{x}", &ctx()).unwrap_err();
        assert_eq!(
            err,
            ArrayError::element(0, TypeError::NoDecoder("GenericArray"))
        );
    }
}
