//! # Telemetry Publisher
//!
//! Periodically samples the [`DeviceState`](crate::data_store::DeviceState) and sends it to the
//! ground service, either on a stream or as a note.
//!
//! A failed transmission is logged and the sample is lost. The next attempt is made at the next
//! period.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, warn};

use comms_if::tm::TmPacket;

use crate::{
    data_store::SharedState,
    note_client::{NoteClient, NoteClientError},
    stream_client::{StreamClient, StreamClientError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct TmPublisher {
    sink: TmSink,
    state: SharedState,

    /// Instant the executive started
    boot: Instant,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Where telemetry is sent.
pub enum TmSink {
    /// Published as JSON on a stream
    Stream {
        client: StreamClient,
        stream_name: String,
    },

    /// Posted as a note to the telemetry notefile
    Notes(NoteClient),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Could not publish telemetry to the stream: {0}")]
    StreamError(#[from] StreamClientError),

    #[error("Could not post the telemetry note: {0}")]
    NoteError(#[from] NoteClientError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmPublisher {
    pub fn new(sink: TmSink, state: SharedState, boot: Instant) -> Self {
        Self { sink, state, boot }
    }

    /// Build a telemetry packet from the current state.
    pub fn sample(&self) -> TmPacket {
        let state = self.state.snapshot();

        TmPacket {
            seconds_since_boot: self.boot.elapsed().as_secs(),
            wifi_rssi: state.last_rssi_dbm,
            voltage: state.last_voltage,
            heading: state.heading_deg,
            latitude: state.latitude_deg,
            longitude: state.longitude_deg,
        }
    }

    /// Sample and send one telemetry packet.
    pub fn publish_once(&self) -> Result<(), PublishError> {
        let packet = self.sample();
        debug!("Publishing telemetry: {:?}", packet);

        match self.sink {
            TmSink::Stream {
                ref client,
                ref stream_name,
            } => {
                let json = packet.to_json()?;
                client.publish(stream_name, "application/json", json.into_bytes())?;
            }
            TmSink::Notes(ref client) => client.post_telemetry(&packet)?,
        }

        Ok(())
    }

    /// Start a background thread publishing telemetry every period.
    pub fn spawn(self, period: Duration) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("tm_publisher".into())
            .spawn(move || loop {
                if let Err(e) = self.publish_once() {
                    warn!("Could not publish telemetry: {}", e);
                }

                thread::sleep(period);
            })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
