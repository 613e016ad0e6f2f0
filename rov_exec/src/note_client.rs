//! # Note Client
//!
//! Exchanges notes with the mission note service. In poll mode the executive gets its
//! telecommands from the mission note queue rather than from stream subscriptions, and telemetry
//! is posted as notes. Images captured on request are always uploaded as notes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::mpsc::SyncSender,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};
use reqwest::{blocking::Client, StatusCode};
use serde::Serialize;

use comms_if::{
    net::ApiEndpoints,
    notes::{
        parse_note_queue, ImageNote, Note, NoteParseError, FRONT_CAMERA_FILENAME, IMAGES_NOTEFILE,
        TELEMETRY_NOTEFILE,
    },
    tc::{StreamMessage, COMMAND_STREAM},
    tm::TmPacket,
};

use crate::{stream_client::enqueue, tm_publisher::TmPublisher};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the mission note endpoints.
#[derive(Debug, Clone)]
pub struct NoteClient {
    client: Client,
    api: ApiEndpoints,
    timeout: Duration,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NoteClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Expected status {expected} from the server, found {found}")]
    UnexpectedStatus {
        expected: StatusCode,
        found: StatusCode,
    },

    #[error("Could not serialize the note: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    NoteQueueError(#[from] NoteParseError),

    #[error("The message queue has been closed")]
    QueueClosed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NoteClient {
    pub fn new(api: ApiEndpoints, timeout: Duration) -> Result<Self, NoteClientError> {
        Ok(Self {
            client: Client::builder().no_proxy().build()?,
            api,
            timeout,
        })
    }

    /// Post a note to a notefile. The server must respond `201 Created`.
    pub fn post_note<T: Serialize>(&self, notefile: &str, body: T) -> Result<(), NoteClientError> {
        let json = serde_json::to_vec(&Note::new(body))?;

        let response = self
            .client
            .post(&self.api.note_url(notefile))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json)
            .timeout(self.timeout)
            .send()?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            found => Err(NoteClientError::UnexpectedStatus {
                expected: StatusCode::CREATED,
                found,
            }),
        }
    }

    pub fn post_telemetry(&self, packet: &TmPacket) -> Result<(), NoteClientError> {
        self.post_note(TELEMETRY_NOTEFILE, packet)
    }

    /// Upload a JPEG image from the front camera.
    pub fn post_image(&self, jpeg: &[u8]) -> Result<(), NoteClientError> {
        info!("Uploading {} byte image", jpeg.len());
        self.post_note(IMAGES_NOTEFILE, ImageNote::from_jpeg(FRONT_CAMERA_FILENAME, jpeg))
    }

    /// Get the command strings currently in the note queue.
    pub fn fetch_commands(&self) -> Result<Vec<String>, NoteClientError> {
        let response = self
            .client
            .get(&self.api.note_queue_url())
            .timeout(self.timeout)
            .send()?;

        if !response.status().is_success() {
            return Err(NoteClientError::UnexpectedStatus {
                expected: StatusCode::OK,
                found: response.status(),
            });
        }

        let body = response.bytes()?;
        Ok(parse_note_queue(&String::from_utf8_lossy(&body))?)
    }

    /// Fetch the note queue and queue each command for dispatch.
    ///
    /// Commands are queued on the command stream, in note queue order. Returns the number of
    /// commands fetched, including any dropped because the queue was full.
    pub fn poll_once(&self, sender: &SyncSender<StreamMessage>) -> Result<usize, NoteClientError> {
        let commands = self.fetch_commands()?;
        debug!("Found {} commands in the note queue", commands.len());

        for command in commands.iter() {
            info!("Received command: {}", command);

            // Queueing only fails once the receiver is gone
            enqueue(
                sender,
                StreamMessage::new(COMMAND_STREAM, command.as_bytes().to_vec()),
            )
            .map_err(|_| NoteClientError::QueueClosed)?;
        }

        Ok(commands.len())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run one poll mode cycle: publish a telemetry note, then poll the note queue.
///
/// A failed telemetry note is logged and does not stop the poll. Returns the result of the poll.
pub fn poll_cycle(
    client: &NoteClient,
    publisher: &TmPublisher,
    sender: &SyncSender<StreamMessage>,
) -> Result<usize, NoteClientError> {
    if let Err(e) = publisher.publish_once() {
        warn!("Could not publish telemetry: {}", e);
    }

    client.poll_once(sender)
}

/// Start the poll mode background thread.
///
/// Runs [`poll_cycle`] every period. The thread only stops if the message queue is closed.
pub fn spawn_poller(
    client: NoteClient,
    publisher: TmPublisher,
    sender: SyncSender<StreamMessage>,
    period: Duration,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("note_poll".into())
        .spawn(move || loop {
            match poll_cycle(&client, &publisher, &sender) {
                Ok(_) => (),
                Err(NoteClientError::QueueClosed) => {
                    warn!("Message queue closed, stopping the note poller");
                    return;
                }
                Err(e) => warn!("Could not poll the note queue: {}", e),
            }

            thread::sleep(period);
        })
}

/// Upload an image on a background thread, logging the result.
pub fn spawn_image_upload(client: NoteClient, jpeg: Vec<u8>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("image_upload".into())
        .spawn(move || match client.post_image(&jpeg) {
            Ok(()) => info!("Image uploaded"),
            Err(e) => warn!("Image upload failed: {}", e),
        })
}
