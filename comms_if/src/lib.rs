//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the telecommand grammar, the
//! telemetry and note documents exchanged with the ground service, and the network framing and
//! endpoint helpers.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand parsing and validation
pub mod tc;

/// Telemetry documents sent to the ground service
pub mod tm;

/// Mission note documents (note queue, telemetry and image notes)
pub mod notes;

/// Network module
pub mod net;
