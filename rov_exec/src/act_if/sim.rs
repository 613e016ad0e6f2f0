//! # Simulated actuators
//!
//! Stands in for the rover hardware when running on a host. Motor demands are logged and
//! remembered, the battery and radio report the values from the parameter file and the camera
//! renders a test pattern.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use log::info;

use comms_if::tc::{Motor, MAX_POWER};

use super::{ActError, Actuators};
use crate::params::SimParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SimActuators {
    params: SimParams,

    motor_a_power: u8,
    motor_b_power: u8,

    /// Number of frames captured so far, shifts the test pattern
    num_frames: u32,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl SimActuators {
    pub fn new(params: SimParams) -> Self {
        Self {
            params,
            motor_a_power: 0,
            motor_b_power: 0,
            num_frames: 0,
        }
    }

    /// Current power demand of a motor.
    pub fn motor_power(&self, motor: Motor) -> u8 {
        match motor {
            Motor::A => self.motor_a_power,
            Motor::B => self.motor_b_power,
        }
    }

    pub fn num_frames(&self) -> u32 {
        self.num_frames
    }
}

impl Actuators for SimActuators {
    fn set_motor_power(&mut self, motor: Motor, power: u8) -> Result<(), ActError> {
        if power as i64 > MAX_POWER {
            return Err(ActError::InvalidPower(motor, power));
        }

        let current = match motor {
            Motor::A => &mut self.motor_a_power,
            Motor::B => &mut self.motor_b_power,
        };

        if *current != power {
            info!("Motor {:?} power {} -> {}", motor, current, power);
        }
        *current = power;

        Ok(())
    }

    fn read_battery_voltage(&mut self) -> Result<f64, ActError> {
        Ok(self.params.voltage_v)
    }

    fn capture_image(&mut self) -> Result<Vec<u8>, ActError> {
        let (width, height) = (self.params.image_width, self.params.image_height);
        if width == 0 || height == 0 {
            return Err(ActError::Unavailable(format!(
                "camera configured with a {}x{} frame",
                width, height
            )));
        }

        let offset = self.num_frames.wrapping_mul(8);

        let frame = RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x.wrapping_add(offset) % width * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x ^ y) & 0xff) as u8,
            ])
        });

        let mut data = Vec::new();
        DynamicImage::ImageRgb8(frame)
            .write_to(&mut data, ImageOutputFormat::Jpeg(self.params.jpeg_quality))?;

        self.num_frames = self.num_frames.wrapping_add(1);

        Ok(data)
    }

    fn signal_strength_dbm(&mut self) -> Option<i32> {
        self.params.rssi_dbm
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_motor_power() {
        let mut act = SimActuators::new(SimParams::default());

        act.set_motor_power(Motor::A, 1).unwrap();
        assert_eq!(act.motor_power(Motor::A), 1);
        assert_eq!(act.motor_power(Motor::B), 0);

        assert!(matches!(
            act.set_motor_power(Motor::B, 2),
            Err(ActError::InvalidPower(Motor::B, 2))
        ));
        assert_eq!(act.motor_power(Motor::B), 0);
    }

    #[test]
    fn test_readings() {
        let mut act = SimActuators::new(SimParams {
            voltage_v: 4.2,
            rssi_dbm: None,
            ..SimParams::default()
        });

        assert_eq!(act.read_battery_voltage().unwrap(), 4.2);
        assert_eq!(act.signal_strength_dbm(), None);
    }

    #[test]
    fn test_capture_image() {
        let mut act = SimActuators::new(SimParams {
            image_width: 64,
            image_height: 48,
            ..SimParams::default()
        });

        let jpeg = act.capture_image().unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        assert_eq!(act.num_frames(), 1);

        let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg)
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 48));
    }
}
