//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications interface.
//!
//! Telecommands arrive from the ground as [`StreamMessage`]s, one per frame of a named stream.
//! The stream name decides how the payload is interpreted:
//!
//! - the motor streams carry a single power value (`0` or `1`),
//! - the command stream carries a free-text command such as `FWD 100` or `rt 90`.
//!
//! Either way the payload is validated in full before a [`CommandFrame`] is built, so invalid
//! input never reaches the telecommand processor as a typed command.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod value;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
pub use value::{parse_int, parse_int_in_range, ValueError, MAX_VALUE_LEN};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum length in bytes of a stream name.
pub const MAX_STREAM_NAME_LEN: usize = 31;

/// Stream carrying the power demand for motor A.
pub const MOTOR_A_STREAM: &str = "motor_a";

/// Stream carrying the power demand for motor B.
pub const MOTOR_B_STREAM: &str = "motor_b";

/// Stream carrying free-text commands.
pub const COMMAND_STREAM: &str = "commands";

/// Lowest accepted motor power.
pub const MIN_POWER: i64 = 0;

/// Highest accepted motor power.
pub const MAX_POWER: i64 = 1;

/// Largest accepted move magnitude, in millionths of a degree of latitude.
pub const MAX_MOVE_MAGNITUDE: i64 = 100_000_000;

/// Largest accepted turn angle in degrees (one hundred full turns).
pub const MAX_TURN_ANGLE_DEG: i64 = 36_000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One complete frame received on a named stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Name of the stream the frame was received on
    pub stream_name: String,

    /// Frame contents with the delimiter stripped
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A validated telecommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFrame {
    /// Switch a motor on or off.
    SetPower {
        target: Motor,
        value: u8,
    },

    /// Drive along the current heading.
    Move {
        direction: MoveDir,
        magnitude: i64,
    },

    /// Turn on the spot.
    Turn {
        direction: TurnDir,
        angle_deg: i64,
    },

    /// Capture and upload an image.
    Snapshot,

    /// Liveness check.
    Ping,

    /// A well formed command with an unrecognised name.
    Unknown(String),
}

/// Motors that can be powered by a telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motor {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDir {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDir {
    Right,
    Left,
}

/// Possible parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TcParseError {
    #[error("The command is empty")]
    Empty,

    #[error("The command is not valid UTF-8")]
    NonUtf8,

    #[error("Expected at most one argument, found {0}")]
    TooManyArgs(usize),

    #[error("The {0} command requires an argument")]
    MissingArg(String),

    #[error("The {0} command takes no argument")]
    UnexpectedArg(String),

    #[error("Invalid argument for {name}: {source}")]
    InvalidArg {
        name: String,
        source: ValueError,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(#[from] ValueError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StreamMessage {
    pub fn new<S: Into<String>>(stream_name: S, payload: Vec<u8>) -> Self {
        Self {
            stream_name: stream_name.into(),
            payload,
        }
    }

    /// Payload as text, with invalid UTF-8 replaced, for logging.
    pub fn payload_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl CommandFrame {
    /// Parse a power demand for the given motor.
    ///
    /// The payload must be a strictly formatted integer equal to 0 or 1.
    pub fn set_power(target: Motor, payload: &[u8]) -> Result<Self, TcParseError> {
        let value = parse_int_in_range(payload, MIN_POWER, MAX_POWER)?;

        Ok(CommandFrame::SetPower {
            target,
            value: value as u8,
        })
    }

    /// Parse a free-text command.
    ///
    /// The command is split on whitespace into a case-insensitive name and at most one integer
    /// argument. `RT` and `LT` need an argument, `FWD` and `BCK` default theirs to 0, and `PING`
    /// and `SNAP` take none. Unrecognised names parse to [`CommandFrame::Unknown`].
    pub fn from_text(text: &str) -> Result<Self, TcParseError> {
        let mut tokens = text.split_whitespace();

        let name = tokens.next().ok_or(TcParseError::Empty)?.to_ascii_uppercase();
        let arg = tokens.next();

        let extra = tokens.count();
        if extra > 0 {
            return Err(TcParseError::TooManyArgs(extra + 1));
        }

        let parse_arg = |max: i64| -> Result<Option<i64>, TcParseError> {
            match arg {
                Some(a) => parse_int_in_range(a.as_bytes(), -max, max)
                    .map(Some)
                    .map_err(|source| TcParseError::InvalidArg {
                        name: name.clone(),
                        source,
                    }),
                None => Ok(None),
            }
        };

        match name.as_str() {
            "FWD" | "BCK" => {
                let magnitude = parse_arg(MAX_MOVE_MAGNITUDE)?.unwrap_or(0);
                let direction = if name == "FWD" {
                    MoveDir::Forward
                } else {
                    MoveDir::Backward
                };
                Ok(CommandFrame::Move { direction, magnitude })
            }
            "RT" | "LT" => {
                let angle_deg = parse_arg(MAX_TURN_ANGLE_DEG)?
                    .ok_or_else(|| TcParseError::MissingArg(name.clone()))?;
                let direction = if name == "RT" {
                    TurnDir::Right
                } else {
                    TurnDir::Left
                };
                Ok(CommandFrame::Turn { direction, angle_deg })
            }
            "PING" | "SNAP" => {
                if arg.is_some() {
                    return Err(TcParseError::UnexpectedArg(name.clone()));
                }
                if name == "PING" {
                    Ok(CommandFrame::Ping)
                } else {
                    Ok(CommandFrame::Snapshot)
                }
            }
            _ => Ok(CommandFrame::Unknown(name.clone())),
        }
    }

    /// Parse a free-text command from raw frame bytes.
    pub fn from_text_bytes(payload: &[u8]) -> Result<Self, TcParseError> {
        let text = std::str::from_utf8(payload).map_err(|_| TcParseError::NonUtf8)?;
        Self::from_text(text)
    }
}

impl Motor {
    /// Get the motor powered by the given stream, if any.
    pub fn from_stream_name(stream_name: &str) -> Option<Self> {
        match stream_name {
            MOTOR_A_STREAM => Some(Motor::A),
            MOTOR_B_STREAM => Some(Motor::B),
            _ => None,
        }
    }
}

/// Check that a name is usable as a stream name.
///
/// Stream names are between 1 and [`MAX_STREAM_NAME_LEN`] bytes of ASCII letters, digits, `_`,
/// `-` or `.`, so they can be placed in a URL path unescaped.
pub fn is_valid_stream_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_STREAM_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_power() {
        assert_eq!(
            CommandFrame::set_power(Motor::A, b"1"),
            Ok(CommandFrame::SetPower { target: Motor::A, value: 1 })
        );
        assert_eq!(
            CommandFrame::set_power(Motor::B, b"0"),
            Ok(CommandFrame::SetPower { target: Motor::B, value: 0 })
        );

        let rejected: [&[u8]; 6] = [b"2", b"5", b"-1", b"", b"on", b"1 "];
        for bad in rejected.iter() {
            assert!(CommandFrame::set_power(Motor::A, bad).is_err(), "{:?} accepted", bad);
        }

        let too_long = [b'0'; 33];
        assert_eq!(
            CommandFrame::set_power(Motor::A, &too_long),
            Err(TcParseError::InvalidValue(ValueError::InvalidLength(33)))
        );
    }

    #[test]
    fn test_from_text_moves() {
        assert_eq!(
            CommandFrame::from_text("FWD 100"),
            Ok(CommandFrame::Move { direction: MoveDir::Forward, magnitude: 100 })
        );
        assert_eq!(
            CommandFrame::from_text("  bck\t25 "),
            Ok(CommandFrame::Move { direction: MoveDir::Backward, magnitude: 25 })
        );
        assert_eq!(
            CommandFrame::from_text("Fwd"),
            Ok(CommandFrame::Move { direction: MoveDir::Forward, magnitude: 0 })
        );
        assert_eq!(
            CommandFrame::from_text("FWD -5"),
            Ok(CommandFrame::Move { direction: MoveDir::Forward, magnitude: -5 })
        );
    }

    #[test]
    fn test_from_text_turns() {
        assert_eq!(
            CommandFrame::from_text("rt 20"),
            Ok(CommandFrame::Turn { direction: TurnDir::Right, angle_deg: 20 })
        );
        assert_eq!(
            CommandFrame::from_text("LT 720"),
            Ok(CommandFrame::Turn { direction: TurnDir::Left, angle_deg: 720 })
        );
        assert_eq!(
            CommandFrame::from_text("RT"),
            Err(TcParseError::MissingArg("RT".into()))
        );
        assert_eq!(
            CommandFrame::from_text("lt"),
            Err(TcParseError::MissingArg("LT".into()))
        );
        assert!(matches!(
            CommandFrame::from_text("RT 36001"),
            Err(TcParseError::InvalidArg { .. })
        ));
    }

    #[test]
    fn test_from_text_others() {
        assert_eq!(CommandFrame::from_text("PING"), Ok(CommandFrame::Ping));
        assert_eq!(CommandFrame::from_text("snap"), Ok(CommandFrame::Snapshot));
        assert_eq!(
            CommandFrame::from_text("dance 3"),
            Ok(CommandFrame::Unknown("DANCE".into()))
        );

        assert_eq!(CommandFrame::from_text(""), Err(TcParseError::Empty));
        assert_eq!(CommandFrame::from_text("   "), Err(TcParseError::Empty));
        assert_eq!(
            CommandFrame::from_text("PING 1"),
            Err(TcParseError::UnexpectedArg("PING".into()))
        );
        assert_eq!(
            CommandFrame::from_text("FWD 1 2"),
            Err(TcParseError::TooManyArgs(2))
        );
        assert_eq!(
            CommandFrame::from_text("FWD ten"),
            Err(TcParseError::InvalidArg {
                name: "FWD".into(),
                source: ValueError::InvalidChar('t')
            })
        );
        assert_eq!(
            CommandFrame::from_text_bytes(&[b'F', 0xff]),
            Err(TcParseError::NonUtf8)
        );
    }

    #[test]
    fn test_stream_names() {
        assert_eq!(Motor::from_stream_name("motor_a"), Some(Motor::A));
        assert_eq!(Motor::from_stream_name("motor_b"), Some(Motor::B));
        assert_eq!(Motor::from_stream_name("motor_c"), None);

        assert!(is_valid_stream_name("motor_a"));
        assert!(is_valid_stream_name("telemetry.qo"));
        assert!(!is_valid_stream_name(""));
        assert!(!is_valid_stream_name("has/slash"));
        assert!(!is_valid_stream_name(&"x".repeat(32)));
    }
}
