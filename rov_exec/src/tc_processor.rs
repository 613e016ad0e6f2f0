//! # Telecommand processor module
//!
//! The telecommand processor handles the messages received from any source. Each message is
//! parsed according to the stream it arrived on, then executed against the actuators and the
//! device state. Messages that fail to parse are dropped with a warning and have no effect.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::thread::JoinHandle;

// Internal
use comms_if::tc::{CommandFrame, Motor, StreamMessage, TcParseError, COMMAND_STREAM};
use crate::{
    act_if::{ActError, Actuators},
    data_store::SharedState,
    note_client::{spawn_image_upload, NoteClient},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Executes telecommands. Owned by the main dispatch loop, which makes it the only writer of the
/// device state.
pub struct TcProcessor<A: Actuators> {
    act: A,
    state: SharedState,

    /// Client images are uploaded with, none to only capture them
    image_client: Option<NoteClient>,

    /// Image uploads that may still be running
    uploads: Vec<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcExecError {
    #[error("Actuator error: {0}")]
    ActError(#[from] ActError),

    #[error("Could not start the image upload: {0}")]
    UploadSpawnError(std::io::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a message according to the stream it was received on.
///
/// Returns `Ok(None)` if the stream has no telecommands associated with it.
pub fn parse_message(msg: &StreamMessage) -> Result<Option<CommandFrame>, TcParseError> {
    if let Some(motor) = Motor::from_stream_name(&msg.stream_name) {
        return CommandFrame::set_power(motor, &msg.payload).map(Some);
    }

    if msg.stream_name == COMMAND_STREAM {
        return CommandFrame::from_text_bytes(&msg.payload).map(Some);
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl<A: Actuators> TcProcessor<A> {
    pub fn new(act: A, state: SharedState, image_client: Option<NoteClient>) -> Self {
        Self {
            act,
            state,
            image_client,
            uploads: Vec::new(),
        }
    }

    pub fn actuators(&self) -> &A {
        &self.act
    }

    /// Parse and execute a received message, logging any failure.
    pub fn handle_message(&mut self, msg: &StreamMessage) {
        debug!("Message on {}: {:?}", msg.stream_name, msg.payload_lossy());

        let frame = match parse_message(msg) {
            Ok(Some(f)) => f,
            Ok(None) => {
                warn!("Message on unknown stream {:?} ignored", msg.stream_name);
                return;
            }
            Err(e) => {
                warn!(
                    "Dropping invalid message {:?} on {}: {}",
                    msg.payload_lossy(),
                    msg.stream_name,
                    e
                );
                return;
            }
        };

        if let Err(e) = self.exec(&frame) {
            warn!("Could not execute {:?}: {}", frame, e);
        }
    }

    /// Execute a telecommand.
    pub fn exec(&mut self, frame: &CommandFrame) -> Result<(), TcExecError> {
        match frame {
            CommandFrame::SetPower { target, value } => {
                info!("Motor {:?} power set to {}", target, value);
                self.act.set_motor_power(*target, *value)?;
            }
            CommandFrame::Move {
                direction,
                magnitude,
            } => {
                self.state.update(|s| s.apply_move(*direction, *magnitude));
            }
            CommandFrame::Turn {
                direction,
                angle_deg,
            } => {
                self.state.update(|s| s.apply_turn(*direction, *angle_deg));
            }
            CommandFrame::Snapshot => self.snapshot()?,
            CommandFrame::Ping => info!("PING"),
            CommandFrame::Unknown(name) => warn!("Unknown command {:?} ignored", name),
        }

        Ok(())
    }

    /// Read the battery voltage and link strength into the device state.
    ///
    /// A failed voltage read keeps the last known voltage.
    pub fn sample(&mut self) {
        let voltage = match self.act.read_battery_voltage() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Could not read the battery voltage: {}", e);
                None
            }
        };
        let rssi = self.act.signal_strength_dbm();

        self.state.update(|s| {
            if let Some(v) = voltage {
                s.last_voltage = v;
            }
            s.last_rssi_dbm = rssi;
        });
    }

    /// Wait for all running image uploads to finish.
    pub fn join_uploads(&mut self) {
        for handle in self.uploads.drain(..) {
            if handle.join().is_err() {
                warn!("Image upload thread panicked");
            }
        }
    }

    fn snapshot(&mut self) -> Result<(), TcExecError> {
        let jpeg = self.act.capture_image()?;
        info!("Captured {} byte image", jpeg.len());

        self.uploads.retain(|h| !h.is_finished());

        match self.image_client {
            Some(ref client) => {
                let handle = spawn_image_upload(client.clone(), jpeg)
                    .map_err(TcExecError::UploadSpawnError)?;
                self.uploads.push(handle);
            }
            None => warn!("No image client, captured image discarded"),
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_store::DeviceState;

    /// Actuators recording every call made to them.
    #[derive(Default)]
    struct MockActuators {
        power_calls: Vec<(Motor, u8)>,
        num_captures: usize,
        voltage: Option<f64>,
    }

    impl Actuators for MockActuators {
        fn set_motor_power(&mut self, motor: Motor, power: u8) -> Result<(), ActError> {
            self.power_calls.push((motor, power));
            Ok(())
        }

        fn read_battery_voltage(&mut self) -> Result<f64, ActError> {
            self.voltage
                .ok_or_else(|| ActError::Unavailable("no ADC".into()))
        }

        fn capture_image(&mut self) -> Result<Vec<u8>, ActError> {
            self.num_captures += 1;
            Ok(vec![0xff, 0xd8, 0xff, 0xd9])
        }
    }

    fn processor() -> (TcProcessor<MockActuators>, SharedState) {
        let state = SharedState::new(DeviceState::default());
        (
            TcProcessor::new(MockActuators::default(), state.clone(), None),
            state,
        )
    }

    fn msg(stream: &str, payload: &str) -> StreamMessage {
        StreamMessage::new(stream, payload.as_bytes().to_vec())
    }

    #[test]
    fn test_motor_streams() {
        let (mut p, _) = processor();

        p.handle_message(&msg("motor_a", "1"));
        p.handle_message(&msg("motor_b", "0"));
        p.handle_message(&msg("motor_a", "0"));

        assert_eq!(
            p.actuators().power_calls,
            vec![(Motor::A, 1), (Motor::B, 0), (Motor::A, 0)]
        );
    }

    #[test]
    fn test_invalid_power_has_no_effect() {
        let (mut p, state) = processor();
        let before = state.snapshot();

        let too_long = "1".repeat(33);
        for payload in ["2", "5", "-1", "", "x", too_long.as_str()].iter() {
            p.handle_message(&msg("motor_a", payload));
        }

        assert!(p.actuators().power_calls.is_empty());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_unknown_stream() {
        let (mut p, state) = processor();
        let before = state.snapshot();

        p.handle_message(&msg("motor_c", "1"));
        assert_eq!(parse_message(&msg("motor_c", "1")), Ok(None));

        assert!(p.actuators().power_calls.is_empty());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_turn_commands() {
        let (mut p, state) = processor();
        state.update(|s| s.heading_deg = 350.0);

        p.handle_message(&msg("commands", "RT 20"));
        assert!((state.snapshot().heading_deg - 10.0).abs() < 1e-9);

        p.handle_message(&msg("commands", "lt 20"));
        assert!((state.snapshot().heading_deg - 350.0).abs() < 1e-9);

        // Missing argument is rejected
        p.handle_message(&msg("commands", "RT"));
        assert!((state.snapshot().heading_deg - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_commands() {
        let (mut p, state) = processor();
        let start = state.snapshot();

        p.handle_message(&msg("commands", "FWD 1000000"));
        let s = state.snapshot();
        assert!((s.latitude_deg - (start.latitude_deg + 1.0)).abs() < 1e-9);
        assert!((s.longitude_deg - start.longitude_deg).abs() < 1e-9);

        p.handle_message(&msg("commands", "BCK 1000000"));
        let s = state.snapshot();
        assert!((s.latitude_deg - start.latitude_deg).abs() < 1e-9);
    }

    #[test]
    fn test_ping_and_snap_leave_state() {
        let (mut p, state) = processor();
        let before = state.snapshot();

        p.handle_message(&msg("commands", "PING"));
        p.handle_message(&msg("commands", "SNAP"));
        p.handle_message(&msg("commands", "DANCE"));
        p.join_uploads();

        assert_eq!(state.snapshot(), before);
        assert_eq!(p.actuators().num_captures, 1);
    }

    #[test]
    fn test_sample() {
        let (mut p, state) = processor();

        p.act.voltage = Some(3.8);
        p.sample();
        assert_eq!(state.snapshot().last_voltage, 3.8);
        assert_eq!(state.snapshot().last_rssi_dbm, None);

        // A failed read keeps the last value
        p.act.voltage = None;
        p.sample();
        assert_eq!(state.snapshot().last_voltage, 3.8);
    }
}
