//! # P1 Telegram Parser
//!
//! Turns a checksum-verified telegram body into OBIS readings. Each data line
//! has the shape
//!
//! ```text
//! <noise><OBIS key><noise>(<value>[*<unit>])[(...)]
//! 1-0:1.7.0(01.193*kW)
//! 0-1:24.2.1(101209112500W)(12785.123*m3)
//! ```
//!
//! The tokenizer only hands out slices of the immutable body. Only the last
//! parenthesised field of a line is interpreted; lines whose value does not
//! start with a number (timestamps, equipment ids) are skipped silently.
//! Energy is normalised to kWh and power to W.

use crate::constants::{DSMR_END_MARKER, DSMR_START_MARKER};
use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{opt, recognize},
    sequence::{pair, tuple},
    IResult,
};

/// One OBIS key with its scaled value.
#[derive(Debug, Clone, PartialEq)]
pub struct ObisReading {
    pub key: String,
    pub value: f64,
}

/// Result of parsing one telegram body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTelegram {
    /// Meter identification from the header line (text after `/`).
    pub identification: Option<String>,
    /// Number of lines in the body.
    pub lines: usize,
    pub readings: Vec<ObisReading>,
}

/// A line of the telegram body with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelegramLine<'a> {
    pub number: usize,
    pub text: &'a [u8],
}

/// Key and raw value token of a data line, as views into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTokens<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// Iterator over the newline separated lines of a telegram body.
///
/// A final line without a trailing newline is still yielded; the empty
/// remainder after a trailing newline is not.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    rest: &'a [u8],
    number: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = TelegramLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (text, rest) = match self.rest.iter().position(|&b| b == b'\n') {
            Some(i) => (&self.rest[..i], &self.rest[i + 1..]),
            None => (self.rest, &self.rest[self.rest.len()..]),
        };
        self.rest = rest;
        self.number += 1;
        Some(TelegramLine {
            number: self.number,
            text,
        })
    }
}

/// Split a telegram body into lines. A trailing end marker is not a line.
pub fn lines(body: &[u8]) -> Lines<'_> {
    let body = body.strip_suffix(&[DSMR_END_MARKER]).unwrap_or(body);
    Lines {
        rest: body,
        number: 0,
    }
}

/// Characters allowed in an OBIS key.
pub fn is_obis_char(b: u8) -> bool {
    b.is_ascii_digit() || b == b'-' || b == b':' || b == b'.'
}

/// Extract the OBIS key and the last parenthesised value token of a line.
pub fn tokenize_line(line: &[u8]) -> Option<LineTokens<'_>> {
    match line.first() {
        Some(&DSMR_START_MARKER) | Some(&DSMR_END_MARKER) | None => return None,
        _ => {}
    }

    let key_start = line
        .iter()
        .position(|&b| is_obis_char(b))
        .unwrap_or(line.len());
    let key_end = line[key_start..]
        .iter()
        .position(|&b| !is_obis_char(b))
        .map_or(line.len(), |i| key_start + i);

    let open = key_end + line[key_end..].iter().rposition(|&b| b == b'(')?;
    let value_start = open + 1;
    let close = value_start + line[value_start..].iter().position(|&b| b == b')')?;

    Some(LineTokens {
        key: &line[key_start..key_end],
        value: &line[value_start..close],
    })
}

/// Longest prefix that reads as a decimal floating point number.
fn decimal_prefix(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

/// Parse a value token such as `00001.234*kWh` into a scaled number.
///
/// Returns `None` when the token does not start with a number.
pub fn parse_value(token: &[u8]) -> Option<f64> {
    let skip = token
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(token.len());
    let (rest, number) = decimal_prefix(&token[skip..]).ok()?;
    let value: f64 = std::str::from_utf8(number).ok()?.parse().ok()?;

    match rest.split_first() {
        Some((b'*', unit)) => Some(scale_value(value, unit)),
        _ => Some(value),
    }
}

fn has_unit_prefix(unit: &[u8], prefix: &[u8]) -> bool {
    unit.len() >= prefix.len() && unit[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Normalise energy to kWh and power to W. Other units pass through.
///
/// Energy prefixes are tested before the shorter power prefixes, so the
/// order of the checks matters.
pub fn scale_value(value: f64, unit: &[u8]) -> f64 {
    if has_unit_prefix(unit, b"kWh") {
        value
    } else if has_unit_prefix(unit, b"MWh") {
        value * 1000.0
    } else if has_unit_prefix(unit, b"Wh") {
        value / 1000.0
    } else if has_unit_prefix(unit, b"kW") {
        value * 1000.0
    } else if has_unit_prefix(unit, b"MW") {
        value * 1_000_000.0
    } else {
        value
    }
}

/// Parse one line into a reading, if it carries a numeric value.
pub fn parse_line(line: &[u8]) -> Option<ObisReading> {
    let tokens = tokenize_line(line)?;
    let value = parse_value(tokens.value)?;
    Some(ObisReading {
        key: String::from_utf8_lossy(tokens.key).into_owned(),
        value,
    })
}

/// Parse a whole telegram body.
pub fn parse_telegram(body: &[u8]) -> ParsedTelegram {
    parse_lines(lines(body))
}

/// Parse a sequence of telegram lines, e.g. [`lines`] behind a logging decorator.
pub fn parse_lines<'a, I>(lines: I) -> ParsedTelegram
where
    I: IntoIterator<Item = TelegramLine<'a>>,
{
    let mut telegram = ParsedTelegram::default();
    for line in lines {
        telegram.lines = line.number;
        if telegram.identification.is_none() && line.text.first() == Some(&DSMR_START_MARKER) {
            let ident = String::from_utf8_lossy(&line.text[1..]).trim().to_string();
            telegram.identification = Some(ident);
            continue;
        }
        if let Some(reading) = parse_line(line.text) {
            telegram.readings.push(reading);
        }
    }
    telegram
}
