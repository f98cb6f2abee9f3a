//! Parsing of literal values at colon sites.

use std::borrow::Cow;

use crate::errors::{Error, ErrorKind, Result};
use crate::escape;

/// A decoded leaf value.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Value<'a> {
    /// JSON `null`.
    Null,
    /// JSON `true` / `false`.
    Boolean(bool),
    /// A JSON number, as `f64`.
    Number(f64),
    /// A JSON string, unescaped. Borrowed from the record when no escape
    /// occurs in it.
    String(Cow<'a, str>),
}

/// Classification of the text following a colon.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Literal<'a> {
    /// An atomic leaf value, with the raw text it was parsed from.
    Atomic(Value<'a>, &'a str),
    /// The value is a nested object, not a leaf.
    Object,
    /// The value is an array, not a leaf.
    Array,
}

/// Parse the literal that follows the structural colon at `colon`.
pub fn parse(record: &str, colon: usize) -> Result<Literal<'_>> {
    let bytes = record.as_bytes();

    let mut pos = colon + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            _ => break,
        }
    }
    if pos == bytes.len() {
        return Err(ErrorKind::MalformedLiteral(pos).into());
    }

    match bytes[pos] {
        b'{' => Ok(Literal::Object),
        b'[' => Ok(Literal::Array),
        b't' => keyword(record, pos, "true", Value::Boolean(true)),
        b'f' => keyword(record, pos, "false", Value::Boolean(false)),
        b'n' => keyword(record, pos, "null", Value::Null),
        b'"' => string_literal(record, pos),
        b'-' | b'0'..=b'9' => number_literal(record, pos),
        _ => Err(ErrorKind::MalformedLiteral(pos).into()),
    }
}

fn keyword<'a>(record: &'a str, pos: usize, kw: &str, value: Value<'a>) -> Result<Literal<'a>> {
    let rest = &record[pos..];
    let boundary = rest
        .as_bytes()
        .get(kw.len())
        .map_or(true, |b| !b.is_ascii_alphanumeric());
    if rest.starts_with(kw) && boundary {
        Ok(Literal::Atomic(value, &record[pos..pos + kw.len()]))
    } else {
        Err(ErrorKind::MalformedLiteral(pos).into())
    }
}

fn string_literal(record: &str, pos: usize) -> Result<Literal<'_>> {
    let bytes = record.as_bytes();
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => {
                let raw = &record[pos..i + 1];
                let decoded = escape::unescape(&record[pos + 1..i])
                    .ok_or_else(|| Error::from(ErrorKind::MalformedLiteral(pos)))?;
                return Ok(Literal::Atomic(Value::String(decoded), raw));
            }
            _ => i += 1,
        }
    }
    Err(ErrorKind::MalformedLiteral(pos).into())
}

fn number_literal(record: &str, pos: usize) -> Result<Literal<'_>> {
    let bytes = record.as_bytes();
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-' => i += 1,
            _ => break,
        }
    }

    let raw = &record[pos..i];
    let n = raw
        .parse::<f64>()
        .map_err(|_| Error::from(ErrorKind::MalformedLiteral(pos)))?;
    Ok(Literal::Atomic(Value::Number(n), raw))
}
