//! # Stream Client
//!
//! Receives telecommands from the ground service's streams and publishes to them.
//!
//! A subscription is a long-poll `GET` on the stream URL. The server holds the request open and
//! writes newline delimited frames to the body as they are published. The client reads the body
//! chunk by chunk, frames it with a [`StreamBuffer`] and queues a [`StreamMessage`] for every
//! complete frame. When the request ends for any reason the client waits for the backoff and
//! subscribes again, for as long as the executive runs.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::Read,
    sync::mpsc::{SyncSender, TrySendError},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};
use reqwest::{
    blocking::Client,
    header::CONTENT_TYPE,
    StatusCode,
};

use comms_if::{
    net::{ApiEndpoints, StreamBuffer},
    tc::StreamMessage,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the chunks read from a subscription body.
const READ_CHUNK_SIZE: usize = 512;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the ground service's stream endpoints.
#[derive(Debug, Clone)]
pub struct StreamClient {
    client: Client,
    api: ApiEndpoints,

    /// Timeout of a subscription request
    stream_timeout: Duration,

    /// Timeout of a publish request
    publish_timeout: Duration,

    /// Wait before subscribing again
    backoff: Duration,

    /// Capacity of the per-connection frame buffer
    buffer_size: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("The server responded with status {0}")]
    BadStatus(StatusCode),

    #[error("Could not read the stream body: {0}")]
    ReadError(std::io::Error),

    #[error("The message queue has been closed")]
    QueueClosed,
}

/// Outcome of queueing a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,

    /// The queue was full and the message was dropped
    Dropped,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StreamClient {
    pub fn new(
        api: ApiEndpoints,
        stream_timeout: Duration,
        publish_timeout: Duration,
        backoff: Duration,
        buffer_size: usize,
    ) -> Result<Self, StreamClientError> {
        let client = Client::builder().no_proxy().build()?;

        Ok(Self {
            client,
            api,
            stream_timeout,
            publish_timeout,
            backoff,
            buffer_size,
        })
    }

    /// Run a single subscription request until the server ends it.
    ///
    /// Returns the number of frames received. Every connection starts with an empty buffer, so
    /// a partial frame left when the previous connection ended is never completed.
    pub fn run_once(
        &self,
        stream_name: &str,
        sender: &SyncSender<StreamMessage>,
    ) -> Result<usize, StreamClientError> {
        let url = self.api.stream_url(stream_name);
        debug!("Subscribing to {}", url);

        let mut response = self
            .client
            .get(&url)
            .timeout(self.stream_timeout)
            .send()?;

        if !response.status().is_success() {
            return Err(StreamClientError::BadStatus(response.status()));
        }

        let mut buffer = StreamBuffer::new(self.buffer_size);
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut num_frames = 0;

        loop {
            let n = response.read(&mut chunk).map_err(StreamClientError::ReadError)?;

            if n == 0 {
                if !buffer.is_empty() {
                    debug!(
                        "Stream {} ended with {} bytes of an incomplete frame",
                        stream_name,
                        buffer.len()
                    );
                }
                return Ok(num_frames);
            }

            for frame in buffer.push(&chunk[..n]) {
                num_frames += 1;
                enqueue(sender, StreamMessage::new(stream_name, frame))?;
            }
        }
    }

    /// Subscribe to a stream forever, waiting for the backoff between connections.
    ///
    /// Only returns if the message queue is closed.
    pub fn subscribe(&self, stream_name: &str, sender: &SyncSender<StreamMessage>) {
        loop {
            match self.run_once(stream_name, sender) {
                Ok(n) => info!("Subscription to {} ended after {} frames", stream_name, n),
                Err(StreamClientError::QueueClosed) => {
                    warn!("Message queue closed, stopping subscription to {}", stream_name);
                    return;
                }
                Err(e) => warn!("Subscription to {} failed: {}", stream_name, e),
            }

            thread::sleep(self.backoff);
        }
    }

    /// Publish data to a stream. Any 2xx status is a success.
    pub fn publish(
        &self,
        stream_name: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), StreamClientError> {
        let response = self
            .client
            .post(&self.api.stream_url(stream_name))
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .timeout(self.publish_timeout)
            .send()?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StreamClientError::BadStatus(response.status()))
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Start a background thread subscribed to the given stream.
pub fn spawn_subscription(
    client: StreamClient,
    stream_name: String,
    sender: SyncSender<StreamMessage>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("sub_{}", stream_name))
        .spawn(move || client.subscribe(&stream_name, &sender))
}

/// Queue a message for dispatch without blocking.
///
/// If the queue is full the message is dropped with a warning.
pub fn enqueue(
    sender: &SyncSender<StreamMessage>,
    msg: StreamMessage,
) -> Result<Enqueued, StreamClientError> {
    match sender.try_send(msg) {
        Ok(()) => Ok(Enqueued::Queued),
        Err(TrySendError::Full(msg)) => {
            warn!(
                "Message queue full, dropping message on {}: {:?}",
                msg.stream_name,
                msg.payload_lossy()
            );
            Ok(Enqueued::Dropped)
        }
        Err(TrySendError::Disconnected(_)) => Err(StreamClientError::QueueClosed),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
