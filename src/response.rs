//! Reply decoding
//!
//! Every instrument family in this crate answers in printable ASCII, but the
//! shapes differ: bare numbers, comma-separated lists, `KEY,VALUE` sequences
//! behind a channel header, status prompts, and semicolon-joined learn
//! strings. The decoders here turn each shape into plain Rust values and
//! always carry the raw reply text inside any failure so the fault can be
//! diagnosed without bus-level tracing.

use crate::error::CommandError;
use std::collections::HashMap;

/// Splits a reply such as `1KHZ` or `-2.5E-03 V` into its numeric value and
/// unit suffix
///
/// The number may carry a sign, a decimal point, and an exponent. Whatever
/// follows it (trimmed) is returned as the suffix; an empty suffix is fine.
/// A reply with no leading number at all is a [`CommandError::Malformed`].
pub fn split_value_unit(raw: &str) -> Result<(f64, String), CommandError>
{
    let text = raw.trim();
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let mantissa_start = end;

    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }

    if end == mantissa_start {
        return Err(CommandError::malformed(raw, "no numeric value"));
    }

    // optional exponent; only consumed when digits actually follow so a unit
    // suffix starting with `E` is not swallowed
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;

        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }

        let exp_digits = exp_end;

        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }

        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    let value = text[..end]
        .parse::<f64>()
        .map_err(|parse_err| CommandError::malformed(raw, parse_err.to_string()))?;

    Ok((value, text[end..].trim().to_string()))
}

/// Parses a reply that must be a single number
pub fn parse_float(raw: &str) -> Result<f64, CommandError>
{
    raw.trim()
        .parse::<f64>()
        .map_err(|parse_err| CommandError::malformed(raw, parse_err.to_string()))
}

/// Applies the serial status-prompt convention of the dual-display meters
///
/// `=>` acknowledges the previous command and is stripped; `?>` (command
/// understood but not executable) and `!>` (command not understood) raise a
/// [`CommandError::DeviceFault`] carrying the whole line. Lines without a
/// prompt pass through untouched.
pub fn strip_prompt(line: &str) -> Result<String, CommandError>
{
    let trimmed = line.trim();

    if trimmed.starts_with("?>") || trimmed.starts_with("!>") {
        return Err(CommandError::DeviceFault {
            raw: line.to_string(),
        });
    }

    if let Some(rest) = trimmed.strip_prefix("=>") {
        return Ok(rest.trim().to_string());
    }

    Ok(trimmed.to_string())
}

/// Decodes a `HEADER KEY,VAL,KEY,VAL,...` reply into a key/value map
///
/// A leading token containing `:` (such as `C1:BSWV`) is treated as the
/// echoed command header and dropped. Fields pair up positionally; a trailing
/// key without a value is discarded.
pub fn decode_key_values(raw: &str) -> HashMap<String, String>
{
    let trimmed = raw.trim();
    let body = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) if head.contains(':') => rest,
        _ => trimmed,
    };

    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    let mut map = HashMap::new();

    for pair in fields.chunks_exact(2) {
        map.insert(pair[0].to_string(), pair[1].to_string());
    }

    map
}

/// Splits a comma-separated reply into floats, requiring at least `expected`
/// of them
///
/// Extra trailing fields are ignored; too few is a [`CommandError::Arity`].
pub fn split_floats(raw: &str, expected: usize) -> Result<Vec<f64>, CommandError>
{
    let fields: Vec<&str> = raw.trim().split(',').map(str::trim).collect();

    if fields.len() < expected {
        return Err(CommandError::Arity {
            expected: expected,
            actual: fields.len(),
            raw: raw.to_string(),
        });
    }

    fields[..expected]
        .iter()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|parse_err| CommandError::malformed(raw, parse_err.to_string()))
        })
        .collect()
}

/// Splits a comma-separated reply into exactly `expected` floats
///
/// Unlike [`split_floats`], extra fields are an [`CommandError::Arity`] too:
/// used where the dialect fixes the reply shape and a surplus value means the
/// reply was not what was asked for.
pub fn split_floats_exact(raw: &str, expected: usize) -> Result<Vec<f64>, CommandError>
{
    let actual = raw.trim().split(',').count();

    if actual != expected {
        return Err(CommandError::Arity {
            expected: expected,
            actual: actual,
            raw: raw.to_string(),
        });
    }

    split_floats(raw, expected)
}

/// One entry of a stored-waveform catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredWaveform
{
    pub index: u32,
    pub name: String,
}

/// Decodes an alternating `index,name,index,name,...` catalog reply
pub fn decode_stored_list(raw: &str) -> Result<Vec<StoredWaveform>, CommandError>
{
    let trimmed = raw.trim();
    let body = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) if head.contains("STL") => rest,
        _ => trimmed,
    };

    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    let mut entries = Vec::new();

    for pair in fields.chunks_exact(2) {
        let index = pair[0]
            .parse::<u32>()
            .map_err(|parse_err| CommandError::malformed(raw, parse_err.to_string()))?;

        entries.push(StoredWaveform {
            index: index,
            name: pair[1].to_string(),
        });
    }

    Ok(entries)
}

/// Decodes a `*LRN?` learn string into a key/value map
///
/// Settings are joined by `;`, each being a keyword optionally followed by a
/// value (`FREQ 1000.0`, `WAVEFORM SINE`). Bare switch keywords such as
/// `ACON` map to an empty value so callers can test presence.
pub fn decode_learn_string(raw: &str) -> HashMap<String, String>
{
    let mut map = HashMap::new();

    for setting in raw.split(';') {
        let setting = setting.trim();

        if setting.is_empty() {
            continue;
        }

        match setting.split_once(char::is_whitespace) {
            Some((key, value)) => map.insert(key.to_string(), value.trim().to_string()),
            None => map.insert(setting.to_string(), String::new()),
        };
    }

    map
}
