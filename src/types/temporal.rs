//! Timestamp elements.
//!
//! Text form follows the server's ISO output: `2024-12-25 17:30:00.5+02:00`,
//! with a trailing ` BC` for years before 1 AD. Offsets that are not a whole
//! number of minutes carry seconds (`+00:19:32`). When the context carries
//! [`InfinityBounds`](crate::config::InfinityBounds), values outside them are
//! written as `-infinity` / `infinity` and those tokens decode to the bounds.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use nom::{
    IResult,
    bytes::complete::take_while_m_n,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map_res, opt},
    sequence::{preceded, tuple},
};

use super::{ElementKind, PgElement, TextElement, TypeError};
use crate::config::TextContext;

const BC_SUFFIX: &str = " BC";

/// Format a timestamp the way the server prints `timestamptz`.
pub fn format_timestamp(ts: &DateTime<FixedOffset>, ctx: &TextContext) -> Vec<u8> {
    if let Some(bounds) = &ctx.infinity {
        let utc = ts.with_timezone(&Utc);
        if utc <= bounds.negative {
            return b"-infinity".to_vec();
        }
        if utc >= bounds.positive {
            return b"infinity".to_vec();
        }
    }

    // Year 0 is 1 BC.
    let year = ts.year();
    let (shown, bc) = if year <= 0 { (1 - year, true) } else { (year, false) };
    let zone = if ts.offset().local_minus_utc() % 60 == 0 { "%:z" } else { "%::z" };

    let mut out = format!(
        "{:04}{}{}",
        shown,
        ts.format("-%m-%d %H:%M:%S%.f"),
        ts.format(zone)
    );
    if bc {
        out.push_str(BC_SUFFIX);
    }
    out.into_bytes()
}

/// Parse a timestamp as printed by the server, in the context's timezone.
pub fn parse_timestamp(raw: &[u8], ctx: &TextContext) -> Result<DateTime<FixedOffset>, TypeError> {
    let text = std::str::from_utf8(raw).map_err(|e| TypeError::InvalidUtf8(e.to_string()))?;
    let invalid = || TypeError::InvalidTimestamp(text.to_string());

    match text {
        "infinity" | "-infinity" => {
            let bounds = ctx.infinity.ok_or_else(|| {
                TypeError::InvalidTimestamp(format!("{text} without infinity bounds configured"))
            })?;
            let bound = if text == "infinity" { bounds.positive } else { bounds.negative };
            return Ok(bound.with_timezone(&ctx.timezone));
        }
        _ => {}
    }

    let (body, bc) = match text.strip_suffix(BC_SUFFIX) {
        Some(body) => (body, true),
        None => (text, false),
    };

    let (_, parts) = all_consuming(timestamp_parts)(body).map_err(|_| invalid())?;

    // The year is swapped before the date is validated: 1 BC is a leap year.
    let year = if bc { 1 - parts.year } else { parts.year };
    let naive = NaiveDate::from_ymd_opt(year, parts.month, parts.day)
        .and_then(|date| {
            date.and_hms_nano_opt(parts.hour, parts.minute, parts.second, parts.nano)
        })
        .ok_or_else(invalid)?;

    let zone = match parts.offset {
        Some(secs) => FixedOffset::east_opt(secs).ok_or_else(invalid)?,
        None => ctx.timezone,
    };
    let local = zone.from_local_datetime(&naive).single().ok_or_else(invalid)?;

    Ok(local.with_timezone(&ctx.timezone))
}

// ==================== Text Grammar ====================

/// Fields of `YYYY-MM-DD HH:MM:SS[.f][+HH[:MM[:SS]]]`, before validation.
struct TimestampParts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nano: u32,
    offset: Option<i32>,
}

fn timestamp_parts(input: &str) -> IResult<&str, TimestampParts> {
    let (input, (year, month, day)) = tuple((
        map_res(digit1, str::parse::<i32>),
        preceded(char('-'), two_digits),
        preceded(char('-'), two_digits),
    ))(input)?;
    let (input, (hour, minute, second)) = tuple((
        preceded(char(' '), two_digits),
        preceded(char(':'), two_digits),
        preceded(char(':'), two_digits),
    ))(input)?;
    let (input, nano) = opt(preceded(char('.'), fraction))(input)?;
    let (input, offset) = opt(utc_offset)(input)?;

    Ok((
        input,
        TimestampParts {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nano: nano.unwrap_or(0),
            offset,
        },
    ))
}

fn two_digits(input: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), str::parse::<u32>)(input)
}

/// Up to nine fractional digits, scaled to nanoseconds.
fn fraction(input: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(1, 9, |c: char| c.is_ascii_digit()), |digits: &str| {
        digits
            .parse::<u32>()
            .map(|value| value * 10u32.pow(9 - digits.len() as u32))
    })(input)
}

/// `+HH`, `+HH:MM` or `+HH:MM:SS`, in seconds east of UTC.
fn utc_offset(input: &str) -> IResult<&str, i32> {
    let (input, (sign, hours, minutes, seconds)) = tuple((
        one_of("+-"),
        two_digits,
        opt(preceded(char(':'), two_digits)),
        opt(preceded(char(':'), two_digits)),
    ))(input)?;

    let secs = (hours * 3600 + minutes.unwrap_or(0) * 60 + seconds.unwrap_or(0)) as i32;
    Ok((input, if sign == '-' { -secs } else { secs }))
}

impl PgElement for DateTime<FixedOffset> {
    const KIND: ElementKind = ElementKind::Timestamp;

    fn decode_element(raw: Option<&[u8]>, ctx: &TextContext) -> Result<Self, TypeError> {
        parse_timestamp(raw.ok_or(TypeError::UnexpectedNull)?, ctx)
    }

    fn encode_element(&self, ctx: &TextContext) -> Result<TextElement, TypeError> {
        Ok(TextElement::Plain(format_timestamp(self, ctx)))
    }
}
