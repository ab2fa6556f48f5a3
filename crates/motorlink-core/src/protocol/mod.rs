//! JSON wire messages exchanged with the device.
//!
//! # Message flow
//!
//! ```text
//! Device → Client:  JSON text frame  →  DeviceSnapshot   (snapshot.rs)
//! Client → Device:  MotorCommand     →  JSON text frame  (command.rs)
//! ```
//!
//! Inbound snapshots are parsed leniently: any JSON object that carries both
//! motor speeds is accepted, and every other field is kept verbatim for
//! display.  Outbound commands have exactly one shape, `set_motor_speed`.

pub mod command;
pub mod snapshot;

pub use command::MotorCommand;
pub use snapshot::{DeviceSnapshot, MalformedSnapshotError};
