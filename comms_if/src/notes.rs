//! # Mission notes
//!
//! Notes are the JSON documents exchanged with the mission note service when the rover runs in
//! polling mode. Every note wraps its content in a `body` object:
//!
//! ```json
//! { "body": { "command": "FWD 100" } }
//! ```
//!
//! Outbound notes are telemetry samples and camera images. Inbound commands are read from the
//! note queue, where they are listed under the `commands.qi` key.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Notefile telemetry notes are posted to.
pub const TELEMETRY_NOTEFILE: &str = "telemetry.qo";

/// Notefile image notes are posted to.
pub const IMAGES_NOTEFILE: &str = "images.qo";

/// Key of the command list in a note queue response.
pub const COMMANDS_QUEUE_KEY: &str = "commands.qi";

/// Filename reported for images taken by the front camera.
pub const FRONT_CAMERA_FILENAME: &str = "camera_front";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A note wrapping some content in a `body` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note<T> {
    pub body: T,
}

/// Content of an image note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageNote {
    /// Name of the camera the image came from
    pub filename: String,

    /// Base64 encoded JPEG data
    pub data: String,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NoteParseError {
    #[error("Could not parse the note queue: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("The note queue is not a JSON object")]
    NotAnObject,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Note<T> {
    pub fn new(body: T) -> Self {
        Self { body }
    }
}

impl ImageNote {
    /// Build an image note from raw JPEG data.
    pub fn from_jpeg<S: Into<String>>(filename: S, jpeg: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            data: base64::encode(jpeg),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Extract the command strings from a note queue response.
///
/// A response without a `commands.qi` array holds no commands. Entries missing a `body` object or
/// a string `command` inside it are skipped with a warning.
pub fn parse_note_queue(json: &str) -> Result<Vec<String>, NoteParseError> {
    let root: serde_json::Value = serde_json::from_str(json)?;

    let root = root.as_object().ok_or(NoteParseError::NotAnObject)?;

    let entries = match root.get(COMMANDS_QUEUE_KEY).and_then(|c| c.as_array()) {
        Some(e) => e,
        None => return Ok(Vec::new()),
    };

    let mut commands = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let command = entry
            .get("body")
            .and_then(|b| b.get("command"))
            .and_then(|c| c.as_str());

        match command {
            Some(c) => commands.push(c.to_string()),
            None => warn!("Note queue entry {} has no command string, skipping: {}", i, entry),
        }
    }

    Ok(commands)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_note_queue() {
        let json = r#"{
            "commands.qi": [
                { "body": { "command": "FWD 100" } },
                { "body": { "command": "SNAP" } }
            ]
        }"#;

        assert_eq!(
            parse_note_queue(json).unwrap(),
            vec!["FWD 100".to_string(), "SNAP".to_string()]
        );
    }

    #[test]
    fn test_parse_note_queue_skips_bad_entries() {
        let json = r#"{
            "commands.qi": [
                { "nobody": 1 },
                { "body": null },
                { "body": { "command": 42 } },
                { "body": {} },
                { "body": { "command": "PING" } }
            ]
        }"#;

        assert_eq!(parse_note_queue(json).unwrap(), vec!["PING".to_string()]);
    }

    #[test]
    fn test_parse_note_queue_no_commands() {
        assert!(parse_note_queue("{}").unwrap().is_empty());
        assert!(parse_note_queue(r#"{"commands.qi": null}"#).unwrap().is_empty());
        assert!(parse_note_queue(r#"{"other.qi": []}"#).unwrap().is_empty());

        assert!(matches!(parse_note_queue("[]"), Err(NoteParseError::NotAnObject)));
        assert!(matches!(parse_note_queue("not json"), Err(NoteParseError::InvalidJson(_))));
    }

    #[test]
    fn test_image_note() {
        let note = Note::new(ImageNote::from_jpeg(FRONT_CAMERA_FILENAME, &[0xff, 0xd8, 0xff]));

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["body"]["filename"], "camera_front");
        assert_eq!(json["body"]["data"], "/9j/");
    }
}
