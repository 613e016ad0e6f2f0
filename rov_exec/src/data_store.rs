//! # Data Store
//!
//! Holds the [`DeviceState`]: the rover's dead reckoned heading and position plus the last
//! sampled sensor readings. The state is reset to the boot values every time the executive
//! starts.
//!
//! The executive shares the state between threads through a [`SharedState`]. Only the main
//! dispatch loop writes to it. Other threads take a copy with [`SharedState::snapshot`], which
//! is always a consistent view of a single point between two updates.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use log::debug;

use comms_if::tc::{MoveDir, TurnDir};
use util::maths::wrap_deg_360;

use crate::params::BootParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Move magnitude units per degree of latitude.
pub const MAGNITUDE_PER_DEG: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Dead reckoned state of the rover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceState {
    /// Heading in degrees, always in `[0, 360)`
    pub heading_deg: f64,

    pub latitude_deg: f64,
    pub longitude_deg: f64,

    /// Last battery voltage sampled, in volts
    pub last_voltage: f64,

    /// Last link strength sampled, in dBm
    pub last_rssi_dbm: Option<i32>,
}

/// Handle to a [`DeviceState`] shared between threads.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<Mutex<DeviceState>>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DeviceState {
    /// Create the state the rover assumes at boot.
    pub fn new(boot: &BootParams) -> Self {
        Self {
            heading_deg: wrap_deg_360(boot.heading_deg),
            latitude_deg: boot.latitude_deg,
            longitude_deg: boot.longitude_deg,
            last_voltage: 0.0,
            last_rssi_dbm: None,
        }
    }

    /// Move along the current heading.
    ///
    /// A magnitude of 1 000 000 is one degree of latitude when heading north. The latitude is
    /// updated first and the longitude step is scaled by the cosine of the new latitude.
    pub fn apply_move(&mut self, direction: MoveDir, magnitude: i64) {
        let mut dist_deg = magnitude as f64 / MAGNITUDE_PER_DEG;
        if direction == MoveDir::Backward {
            dist_deg = -dist_deg;
        }

        let heading_rad = self.heading_deg.to_radians();

        self.latitude_deg += dist_deg * heading_rad.cos();
        self.longitude_deg += dist_deg * heading_rad.sin() / self.latitude_deg.to_radians().cos();

        debug!(
            "Moved {:?} {}, position now ({:.6}, {:.6})",
            direction, magnitude, self.latitude_deg, self.longitude_deg
        );
    }

    /// Turn on the spot. Right turns increase the heading.
    pub fn apply_turn(&mut self, direction: TurnDir, angle_deg: i64) {
        let delta = match direction {
            TurnDir::Right => angle_deg as f64,
            TurnDir::Left => -(angle_deg as f64),
        };

        self.heading_deg = wrap_deg_360(self.heading_deg + delta);

        debug!("Turned {:?} {}, heading now {}", direction, angle_deg, self.heading_deg);
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(&BootParams::default())
    }
}

impl SharedState {
    pub fn new(state: DeviceState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Get a copy of the current state.
    pub fn snapshot(&self) -> DeviceState {
        *self.inner.lock().expect("DeviceState mutex poisoned")
    }

    /// Modify the state under the lock.
    pub fn update<R, F: FnOnce(&mut DeviceState) -> R>(&self, f: F) -> R {
        let mut state = self.inner.lock().expect("DeviceState mutex poisoned");
        f(&mut state)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-9;

    fn state_at(heading_deg: f64, latitude_deg: f64, longitude_deg: f64) -> DeviceState {
        DeviceState::new(&BootParams {
            heading_deg,
            latitude_deg,
            longitude_deg,
        })
    }

    #[test]
    fn test_boot_defaults() {
        let s = DeviceState::default();
        assert_eq!(s.heading_deg, 0.0);
        assert_eq!(s.latitude_deg, 47.816944);
        assert_eq!(s.longitude_deg, -119.656111);
        assert_eq!(s.last_voltage, 0.0);
        assert_eq!(s.last_rssi_dbm, None);
    }

    #[test]
    fn test_turns() {
        let mut s = state_at(350.0, 0.0, 0.0);
        s.apply_turn(TurnDir::Right, 20);
        assert!((s.heading_deg - 10.0).abs() < EPS);

        let mut s = state_at(10.0, 0.0, 0.0);
        s.apply_turn(TurnDir::Left, 20);
        assert!((s.heading_deg - 350.0).abs() < EPS);

        let mut s = state_at(0.0, 0.0, 0.0);
        s.apply_turn(TurnDir::Right, 360);
        assert_eq!(s.heading_deg, 0.0);

        s.apply_turn(TurnDir::Left, 36_000);
        assert_eq!(s.heading_deg, 0.0);

        s.apply_turn(TurnDir::Right, -90);
        assert!((s.heading_deg - 270.0).abs() < EPS);
    }

    #[test]
    fn test_move_north() {
        let mut s = state_at(0.0, 10.0, 20.0);
        s.apply_move(MoveDir::Forward, 1_000_000);

        assert!((s.latitude_deg - 11.0).abs() < EPS);
        assert!((s.longitude_deg - 20.0).abs() < EPS);

        s.apply_move(MoveDir::Backward, 2_000_000);
        assert!((s.latitude_deg - 9.0).abs() < EPS);
    }

    #[test]
    fn test_move_east() {
        let mut s = state_at(90.0, 60.0, 0.0);
        s.apply_move(MoveDir::Forward, 500_000);

        // At 60 degrees a degree of longitude is half as long as at the equator
        assert!((s.latitude_deg - 60.0).abs() < 1e-6);
        assert!((s.longitude_deg - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_move_zero() {
        let mut s = DeviceState::default();
        let before = s;
        s.apply_move(MoveDir::Forward, 0);
        assert_eq!(s, before);
    }

    #[test]
    fn test_shared_state() {
        let shared = SharedState::new(DeviceState::default());
        let reader = shared.clone();

        shared.update(|s| s.apply_turn(TurnDir::Right, 45));

        assert_eq!(reader.snapshot().heading_deg, 45.0);
    }
}
