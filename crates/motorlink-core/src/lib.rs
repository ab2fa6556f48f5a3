//! # motorlink-core
//!
//! Shared library for motorlink containing the device telemetry model, the
//! JSON wire messages, and the state-synchronization engine that keeps a
//! local control surface in step with a live device-state stream.
//!
//! This crate has zero dependencies on sockets, async runtimes, or terminals.
//! The client binary (`motorlink-client`) owns all of that.
//!
//! # The problem this crate solves (for beginners)
//!
//! The device publishes its left and right motor speeds several times per
//! second.  The operator can also edit those same two values locally, and
//! every edit must be sent to the device as a `set_motor_speed` command.
//!
//! If the client naively sent a command every time one of the two values
//! changed, then applying telemetry would itself produce commands that restate
//! what the device just said.  That is an *echo loop*.
//!
//! [`ControlSession`] avoids it with two guards:
//!
//! 1. Nothing is sent until the first snapshot has *seeded* the local values.
//! 2. A change whose new value equals the most recent telemetry value for that
//!    motor is treated as an echo and suppressed.
//!
//! # Modules
//!
//! - **`domain`** – Plain data: [`ConnectionStatus`], [`MotorSide`], [`Speed`],
//!   [`ControlState`], and the [`ControlView`] render DTO.
//!
//! - **`protocol`** – What travels on the wire: [`DeviceSnapshot`] (inbound)
//!   and [`MotorCommand`] (outbound).
//!
//! - **`sync`** – The [`ControlSession`] engine plus the [`CommandSink`] port
//!   and [`CommandDispatcher`] that hand commands to a transport.

pub mod domain;
pub mod protocol;
pub mod sync;

// Re-export the most-used types at the crate root so callers can write
// `motorlink_core::ControlSession` instead of the full module path.
pub use domain::{ConnectionStatus, ControlState, ControlView, MotorSide, Speed};
pub use protocol::command::MotorCommand;
pub use protocol::snapshot::{DeviceSnapshot, MalformedSnapshotError};
pub use sync::dispatch::{CommandDispatcher, CommandSink, SendError};
pub use sync::session::ControlSession;
