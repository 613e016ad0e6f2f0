//! # Rover Executable Parameters
//!
//! This module provide parameters for the rover executable. Every field has a default, so a
//! parameter file only needs to list the values it changes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use comms_if::{
    net::ApiEndpoints,
    tc::{
        is_valid_stream_name, COMMAND_STREAM, MAX_TURN_ANGLE_DEG, MOTOR_A_STREAM, MOTOR_B_STREAM,
    },
    tm::TELEMETRY_STREAM,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RovExecParams {
    /// Base URL of the ground service API
    pub api_base_url: String,

    /// Mission the rover reports to
    pub mission: String,

    /// How telecommands are received
    pub mode: OpMode,

    /// Streams subscribed to in stream mode
    pub streams: Vec<String>,

    /// Stream telemetry is published to in stream mode
    pub telemetry_stream: String,

    /// Timeout of a single long-poll subscription request
    pub stream_timeout_s: f64,

    /// Wait between the end of a subscription and the next attempt
    pub reconnect_backoff_s: f64,

    /// Timeout of publish, note and image requests
    pub http_timeout_s: f64,

    /// Period between telemetry samples
    pub telemetry_period_s: f64,

    /// Period between note queue polls in poll mode
    pub poll_period_s: f64,

    /// Period between voltage and link strength samples
    pub sample_period_s: f64,

    /// Maximum number of received messages waiting to be dispatched
    pub queue_size: usize,

    /// Capacity in bytes of the per-connection stream buffer
    pub stream_buffer_size: usize,

    /// State the rover assumes at boot
    pub boot: BootParams,

    /// Values reported by the simulated actuators
    pub sim: SimParams,
}

/// Dead reckoning state at boot.
///
/// The heading may be given out of [0, 360) but no further out than the largest turn command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BootParams {
    pub heading_deg: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Battery voltage reported by the simulated ADC
    pub voltage_v: f64,

    /// Link strength reported by the simulated radio, absent if unknown
    pub rssi_dbm: Option<i32>,

    /// Size of the simulated camera frames
    pub image_width: u32,
    pub image_height: u32,

    /// JPEG quality of the simulated camera frames, between 1 and 100
    pub jpeg_quality: u8,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Source of telecommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpMode {
    /// Long-poll subscriptions to the command streams
    Stream,

    /// Periodic polling of the mission note queue
    Poll,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Invalid stream name: {0:?}")]
    InvalidStreamName(String),

    #[error("No streams to subscribe to in stream mode")]
    NoStreams,

    #[error("Parameter {0} must be a positive number of seconds, found {1}")]
    InvalidPeriod(&'static str, f64),

    #[error("Parameter {0} must be greater than zero")]
    ZeroSize(&'static str),

    #[error("The API base URL is empty")]
    EmptyBaseUrl,

    #[error("JPEG quality must be between 1 and 100, found {0}")]
    InvalidJpegQuality(u8),

    #[error("Invalid boot heading {0}, expected a finite angle within +/-{} degrees", MAX_TURN_ANGLE_DEG)]
    InvalidBootHeading(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RovExecParams {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".into(),
            mission: "rover".into(),
            mode: OpMode::Stream,
            streams: vec![
                MOTOR_A_STREAM.into(),
                MOTOR_B_STREAM.into(),
                COMMAND_STREAM.into(),
            ],
            telemetry_stream: TELEMETRY_STREAM.into(),
            stream_timeout_s: 60.0,
            reconnect_backoff_s: 5.0,
            http_timeout_s: 10.0,
            telemetry_period_s: 10.0,
            poll_period_s: 10.0,
            sample_period_s: 1.0,
            queue_size: 10,
            stream_buffer_size: 1024,
            boot: BootParams::default(),
            sim: SimParams::default(),
        }
    }
}

impl Default for BootParams {
    fn default() -> Self {
        Self {
            heading_deg: 0.0,
            latitude_deg: 47.816944,
            longitude_deg: -119.656111,
        }
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            voltage_v: 3.7,
            rssi_dbm: Some(-60),
            image_width: 320,
            image_height: 240,
            jpeg_quality: 75,
        }
    }
}

impl RovExecParams {
    /// Check the parameters can be used to start the executive.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ParamsError::EmptyBaseUrl);
        }

        if self.mode == OpMode::Stream && self.streams.is_empty() {
            return Err(ParamsError::NoStreams);
        }

        for name in self.streams.iter().chain(std::iter::once(&self.telemetry_stream)) {
            if !is_valid_stream_name(name) {
                return Err(ParamsError::InvalidStreamName(name.clone()));
            }
        }

        let periods = [
            ("stream_timeout_s", self.stream_timeout_s),
            ("reconnect_backoff_s", self.reconnect_backoff_s),
            ("http_timeout_s", self.http_timeout_s),
            ("telemetry_period_s", self.telemetry_period_s),
            ("poll_period_s", self.poll_period_s),
            ("sample_period_s", self.sample_period_s),
        ];
        for (name, value) in periods.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(ParamsError::InvalidPeriod(*name, *value));
            }
        }

        if self.queue_size == 0 {
            return Err(ParamsError::ZeroSize("queue_size"));
        }
        if self.stream_buffer_size == 0 {
            return Err(ParamsError::ZeroSize("stream_buffer_size"));
        }

        if self.sim.jpeg_quality == 0 || self.sim.jpeg_quality > 100 {
            return Err(ParamsError::InvalidJpegQuality(self.sim.jpeg_quality));
        }

        let heading = self.boot.heading_deg;
        if !heading.is_finite() || heading.abs() > MAX_TURN_ANGLE_DEG as f64 {
            return Err(ParamsError::InvalidBootHeading(heading));
        }

        Ok(())
    }

    pub fn api(&self) -> ApiEndpoints {
        ApiEndpoints::new(self.api_base_url.clone(), self.mission.clone())
    }

    // Durations below assume `validate` has passed.

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.stream_timeout_s)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.reconnect_backoff_s)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.http_timeout_s)
    }

    pub fn telemetry_period(&self) -> Duration {
        Duration::from_secs_f64(self.telemetry_period_s)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs_f64(self.poll_period_s)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(self.sample_period_s)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let p = RovExecParams::default();
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.queue_size, 10);
        assert_eq!(p.stream_buffer_size, 1024);
        assert_eq!(p.stream_timeout(), Duration::from_secs(60));
        assert_eq!(p.reconnect_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_shipped_params() {
        let p: RovExecParams =
            toml::from_str(include_str!("../../params/rov_exec.toml")).unwrap();

        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.mode, OpMode::Stream);
        assert_eq!(p.streams, vec!["motor_a", "motor_b", "commands"]);
        assert_eq!(p.sim.rssi_dbm, Some(-60));
    }

    #[test]
    fn test_partial_toml() {
        let p: RovExecParams = toml::from_str(
            r#"
            api_base_url = "https://gds.example.com"
            mission = "yak"
            mode = "poll"

            [boot]
            heading_deg = 90.0
            "#,
        )
        .unwrap();

        assert_eq!(p.mode, OpMode::Poll);
        assert_eq!(p.mission, "yak");
        assert_eq!(p.boot.heading_deg, 90.0);
        assert_eq!(p.boot.latitude_deg, 47.816944);
        assert_eq!(p.telemetry_stream, "telemetry");
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_validate() {
        let mut p = RovExecParams::default();
        p.streams.push("bad/name".into());
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidStreamName("bad/name".into()))
        );

        let mut p = RovExecParams::default();
        p.queue_size = 0;
        assert_eq!(p.validate(), Err(ParamsError::ZeroSize("queue_size")));

        let mut p = RovExecParams::default();
        p.reconnect_backoff_s = -1.0;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidPeriod("reconnect_backoff_s", -1.0))
        );

        let mut p = RovExecParams::default();
        p.mode = OpMode::Poll;
        p.streams.clear();
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_validate_boot_heading() {
        let mut p = RovExecParams::default();

        p.boot.heading_deg = -36_000.0;
        assert_eq!(p.validate(), Ok(()));
        p.boot.heading_deg = 720.5;
        assert_eq!(p.validate(), Ok(()));

        p.boot.heading_deg = 36_000.5;
        assert_eq!(p.validate(), Err(ParamsError::InvalidBootHeading(36_000.5)));
        p.boot.heading_deg = -1.0e15;
        assert_eq!(p.validate(), Err(ParamsError::InvalidBootHeading(-1.0e15)));
        p.boot.heading_deg = f64::INFINITY;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidBootHeading(f64::INFINITY))
        );

        // NaN never compares equal, so match the variant
        p.boot.heading_deg = f64::NAN;
        assert!(matches!(
            p.validate(),
            Err(ParamsError::InvalidBootHeading(h)) if h.is_nan()
        ));
    }
}
