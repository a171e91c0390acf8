//! `bytea` text format.
//!
//! The server prints binary values in one of two forms:
//! - hex (`\x0102ff`), the default since 9.0
//! - legacy escape, where `\` doubles and non-printable bytes become `\ooo`
//!
//! Decoding accepts both; encoding picks the form the target server understands.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while_m_n},
    combinator::{map, map_res},
    sequence::preceded,
};

use crate::types::TypeError;

/// First server version (in `server_version_num` encoding) that reads hex `bytea`.
pub const HEX_FORMAT_MIN_VERSION: u32 = 90000;

const HEX_PREFIX: &[u8] = b"\\x";
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Decode the text form of a `bytea` value.
///
/// # Example
/// ```
/// use qail_array::protocol::bytea::decode_bytea;
/// assert_eq!(decode_bytea(b"\\x00ff").unwrap(), vec![0x00, 0xff]);
/// assert_eq!(decode_bytea(b"a\\\\b\\001").unwrap(), b"a\\b\x01".to_vec());
/// ```
pub fn decode_bytea(input: &[u8]) -> Result<Vec<u8>, TypeError> {
    match input.strip_prefix(HEX_PREFIX) {
        Some(hex) => decode_hex(hex),
        None => decode_escape(input),
    }
}

/// Encode `data` as `bytea` text for a server reporting `server_version`.
pub fn encode_bytea(data: &[u8], server_version: u32) -> Vec<u8> {
    if server_version >= HEX_FORMAT_MIN_VERSION {
        encode_hex(data)
    } else {
        tracing::trace!(server_version, "using legacy bytea escape format");
        encode_escape(data)
    }
}

/// Hex form: `\x` followed by two lowercase digits per byte.
pub fn encode_hex(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEX_PREFIX.len() + data.len() * 2);
    out.extend_from_slice(HEX_PREFIX);
    for &b in data {
        out.push(HEX_DIGITS[(b >> 4) as usize]);
        out.push(HEX_DIGITS[(b & 0x0f) as usize]);
    }
    out
}

/// Legacy escape form, readable by every server version.
pub fn encode_escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x20..=0x7e => out.push(b),
            _ => out.extend_from_slice(&[
                b'\\',
                b'0' + (b >> 6),
                b'0' + ((b >> 3) & 0o7),
                b'0' + (b & 0o7),
            ]),
        }
    }
    out
}

fn decode_hex(hex: &[u8]) -> Result<Vec<u8>, TypeError> {
    if hex.len() % 2 != 0 {
        return Err(TypeError::OddHexLength(hex.len()));
    }

    let base = HEX_PREFIX.len();
    let mut out = Vec::with_capacity(hex.len() / 2);
    for (i, pair) in hex.chunks_exact(2).enumerate() {
        let offset = base + i * 2;
        let hi = hex_value(pair[0]).ok_or(TypeError::InvalidHex { offset })?;
        let lo = hex_value(pair[1]).ok_or(TypeError::InvalidHex { offset: offset + 1 })?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// One step of the escape grammar.
enum Chunk<'a> {
    Run(&'a [u8]),
    Byte(u8),
}

fn escape_chunk(input: &[u8]) -> IResult<&[u8], Chunk<'_>> {
    alt((
        map(is_not(&b"\\"[..]), Chunk::Run),
        map(tag(&b"\\\\"[..]), |_| Chunk::Byte(b'\\')),
        map_res(
            preceded(tag(&b"\\"[..]), take_while_m_n(3, 3, is_oct_digit)),
            |digits: &[u8]| u8::try_from(octal_value(digits)).map(Chunk::Byte),
        ),
    ))(input)
}

fn is_oct_digit(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

fn octal_value(digits: &[u8]) -> u16 {
    digits
        .iter()
        .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'))
}

fn decode_escape(input: &[u8]) -> Result<Vec<u8>, TypeError> {
    let mut out = Vec::with_capacity(input.len());
    let mut rest = input;
    while !rest.is_empty() {
        let (next, chunk) = escape_chunk(rest).map_err(|_| TypeError::InvalidEscape {
            offset: input.len() - rest.len(),
        })?;
        match chunk {
            Chunk::Run(run) => out.extend_from_slice(run),
            Chunk::Byte(b) => out.push(b),
        }
        rest = next;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_decode() {
        assert_eq!(decode_bytea(b"\\x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_bytea(b"\\xDEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_hex_decode_errors() {
        assert_eq!(decode_bytea(b"\\x123"), Err(TypeError::OddHexLength(3)));
        assert_eq!(
            decode_bytea(b"\\x12zz"),
            Err(TypeError::InvalidHex { offset: 4 })
        );
    }

    #[test]
    fn test_escape_decode() {
        assert_eq!(decode_bytea(b"").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_bytea(b"plain text").unwrap(), b"plain text".to_vec());
        assert_eq!(decode_bytea(b"\\\\").unwrap(), vec![b'\\']);
        assert_eq!(decode_bytea(b"a\\000b\\377").unwrap(), vec![b'a', 0, b'b', 0xff]);
    }

    #[test]
    fn test_escape_decode_errors() {
        // Too few digits left.
        assert_eq!(
            decode_bytea(b"ab\\12"),
            Err(TypeError::InvalidEscape { offset: 2 })
        );
        // Not octal.
        assert_eq!(
            decode_bytea(b"\\089"),
            Err(TypeError::InvalidEscape { offset: 0 })
        );
        // Out of byte range.
        assert_eq!(
            decode_bytea(b"x\\777"),
            Err(TypeError::InvalidEscape { offset: 1 })
        );
    }

    #[test]
    fn test_encode_picks_form_by_version() {
        assert_eq!(encode_bytea(&[0x01, 0xab], 90000), b"\\x01ab".to_vec());
        assert_eq!(encode_bytea(&[0x01, b'a', b'\\'], 80400), b"\\001a\\\\".to_vec());
    }

    #[test]
    fn test_escape_encode_keeps_printable() {
        assert_eq!(encode_escape(b" ~"), b" ~".to_vec());
        assert_eq!(encode_escape(&[0x1f, 0x7f]), b"\\037\\177".to_vec());
    }

    #[test]
    fn test_roundtrip_all_bytes() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_bytea(&encode_bytea(&data, 90000)).unwrap(), data);
        assert_eq!(decode_bytea(&encode_bytea(&data, 80400)).unwrap(), data);
    }
}
