//! # Network module
//!
//! Endpoint construction for the ground service API and the framing used on its streams.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod framing;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------


pub use framing::{StreamBuffer, FRAME_DELIMITER};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Location of the ground service API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Base URL of the service, for example `https://gds.example.com`
    pub base_url: String,

    /// Mission the rover belongs to
    pub mission: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ApiEndpoints {
    pub fn new<B: Into<String>, M: Into<String>>(base_url: B, mission: M) -> Self {
        Self {
            base_url: base_url.into(),
            mission: mission.into(),
        }
    }

    /// URL used both to publish to and to subscribe to a stream.
    pub fn stream_url(&self, stream_name: &str) -> String {
        format!("{}/v1/stream/{}", self.base(), stream_name)
    }

    /// URL notes are posted to for the given notefile.
    pub fn note_url(&self, notefile: &str) -> String {
        format!("{}/v1/missions/{}/notes/{}", self.base(), self.mission, notefile)
    }

    /// URL of the mission's note queue.
    pub fn note_queue_url(&self) -> String {
        format!("{}/v1/missions/{}/note_queue", self.base(), self.mission)
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_urls() {
        let api = ApiEndpoints::new("http://localhost:8080/", "m1");

        assert_eq!(api.stream_url("motor_a"), "http://localhost:8080/v1/stream/motor_a");
        assert_eq!(
            api.note_url("images.qo"),
            "http://localhost:8080/v1/missions/m1/notes/images.qo"
        );
        assert_eq!(api.note_queue_url(), "http://localhost:8080/v1/missions/m1/note_queue");
    }
}
