//! # Numeric value validation
//!
//! Every numeric field carried by a telecommand goes through [`parse_int`] before a typed command
//! is built from it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum length in bytes of a numeric value.
pub const MAX_VALUE_LEN: usize = 32;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a numeric value can be rejected.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValueError {
    #[error("Invalid data length: {0}")]
    InvalidLength(usize),

    #[error("Invalid character in data: {0:?}")]
    InvalidChar(char),

    #[error("Value is not a number: {0:?}")]
    NotANumber(String),

    #[error("Value out of range: {value} (expected {min} to {max})")]
    OutOfRange {
        value: i64,
        min: i64,
        max: i64,
    },
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a strictly formatted integer.
///
/// The checks are applied in order:
///  1. the length must be between 1 and [`MAX_VALUE_LEN`] bytes,
///  2. every byte must be an ASCII digit, except for an optional `-` as the first byte,
///  3. the digits must form an integer that fits in an `i64`.
pub fn parse_int(raw: &[u8]) -> Result<i64, ValueError> {
    if raw.is_empty() || raw.len() > MAX_VALUE_LEN {
        return Err(ValueError::InvalidLength(raw.len()));
    }

    for (i, b) in raw.iter().enumerate() {
        if i == 0 && *b == b'-' {
            continue;
        }
        if !b.is_ascii_digit() {
            return Err(ValueError::InvalidChar(*b as char));
        }
    }

    // Only ASCII is left at this point so the conversion can't fail, but a lone "-" or a value
    // too large for an i64 can.
    let text = String::from_utf8_lossy(raw);
    text.parse::<i64>()
        .map_err(|_| ValueError::NotANumber(text.into_owned()))
}

/// Parse a strictly formatted integer and check it lies in `[min, max]`.
pub fn parse_int_in_range(raw: &[u8], min: i64, max: i64) -> Result<i64, ValueError> {
    let value = parse_int(raw)?;

    if value < min || value > max {
        return Err(ValueError::OutOfRange { value, min, max });
    }

    Ok(value)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
