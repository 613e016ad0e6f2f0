//! # Actuator interface module
//!
//! The actuator interface is the boundary between the executive and the rover hardware: motor
//! drivers, the battery voltage ADC, the camera and the radio. Everything behind it is reached
//! through the [`Actuators`] trait so the executive never depends on a particular board.
//!
//! Calls are synchronous and fallible. Callers log failures and carry on.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use sim::SimActuators;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::Motor;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Hardware collaborators of the executive.
pub trait Actuators {
    /// Switch a motor on (`1`) or off (`0`).
    fn set_motor_power(&mut self, motor: Motor, power: u8) -> Result<(), ActError>;

    /// Read the battery voltage in volts.
    fn read_battery_voltage(&mut self) -> Result<f64, ActError>;

    /// Capture a JPEG image from the front camera.
    fn capture_image(&mut self) -> Result<Vec<u8>, ActError>;

    /// Signal strength of the network link in dBm, if the link layer reports one.
    fn signal_strength_dbm(&mut self) -> Option<i32> {
        None
    }
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ActError {
    #[error("Invalid power demand for motor {0:?}: {1}")]
    InvalidPower(Motor, u8),

    #[error("The camera could not produce a frame: {0}")]
    CameraError(#[from] image::ImageError),

    #[error("The device is not available: {0}")]
    Unavailable(String),
}
