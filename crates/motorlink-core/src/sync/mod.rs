//! State synchronization between device telemetry and local edits.
//!
//! - **`session`** – [`ControlSession`]: ingest, seeding, change detection,
//!   and the connection status.
//! - **`dispatch`** – [`CommandSink`] port and [`CommandDispatcher`], which
//!   turn emitted [`crate::MotorCommand`]s into text frames.

pub mod dispatch;
pub mod session;

pub use dispatch::{CommandDispatcher, CommandSink, SendError};
pub use session::ControlSession;
