//! Parsing of user entered field values
//!
//! Values are accepted when they match `[+-]?([0-9]*[.,])?[0-9]+`, i.e. an
//! optionally signed decimal number using either a dot or a comma as decimal
//! separator.
//!
//! Numbers written with a comma are rewritten into a stack buffer before
//! parsing and are limited to 64 characters, longer ones are rejected. Numbers
//! written with a dot have no length limit.

use crate::{LightMeterError, Result};

/// Longest text accepted with a comma as decimal separator.
const MAX_COMMA_INPUT_LEN: usize = 64;

/// Validation result of a single field, used to show field-level errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputStatus {
    Valid,
    /// The text is not a decimal number, the default value is used instead.
    Invalid,
}

impl InputStatus {
    pub fn is_valid(self) -> bool {
        self == InputStatus::Valid
    }
}

/// Checks whether `text` is a decimal number.
pub fn is_decimal(text: &str) -> bool {
    let digits = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);

    let (integer, fraction) = match digits.find(|c: char| c == '.' || c == ',') {
        Some(index) => (&digits[..index], &digits[index + 1..]),
        None => ("", digits),
    };

    integer.bytes().all(|b| b.is_ascii_digit())
        && !fraction.is_empty()
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a decimal number, accepting a comma as decimal separator.
pub fn parse_decimal(text: &str) -> Result<f32> {
    if !is_decimal(text) {
        return Err(LightMeterError::InvalidNumber);
    }

    if !text.contains(',') {
        return text.parse::<f32>().map_err(|_| LightMeterError::InvalidNumber);
    }

    if text.len() > MAX_COMMA_INPUT_LEN {
        return Err(LightMeterError::InvalidNumber);
    }

    // Rewrite the separator into a stack buffer, the text is ASCII at this point
    let mut buffer = [0u8; MAX_COMMA_INPUT_LEN];
    for (slot, byte) in buffer.iter_mut().zip(text.bytes()) {
        *slot = if byte == b',' { b'.' } else { byte };
    }

    core::str::from_utf8(&buffer[..text.len()])
        .map_err(|_| LightMeterError::InvalidNumber)?
        .parse::<f32>()
        .map_err(|_| LightMeterError::InvalidNumber)
}

/// Parses `text`, falling back to `default` when it is not a decimal number.
pub fn parse_or(text: &str, default: f32) -> (f32, InputStatus) {
    match parse_decimal(text.trim()) {
        Ok(value) => (value, InputStatus::Valid),
        Err(_) => {
            log::debug!("Invalid input {:?}, using default {}", text, default);
            (default, InputStatus::Invalid)
        }
    }
}
