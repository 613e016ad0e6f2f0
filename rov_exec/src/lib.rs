//! # Rover library.
//!
//! This library allows other crates in the workspace, and the integration tests, to access items
//! defined inside the rover crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator interface - motors, battery, camera and radio
pub mod act_if;

/// Data store - dead reckoned device state shared between threads
pub mod data_store;

/// Note client - note queue polling and note uploads
pub mod note_client;

/// Executable parameters
pub mod params;

/// Stream client - long-poll subscriptions and stream publishing
pub mod stream_client;

/// Telecommand processor - executes received telecommands
pub mod tc_processor;

/// Telemetry publisher - periodically reports the device state
pub mod tm_publisher;
