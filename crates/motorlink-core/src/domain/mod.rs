//! Domain layer for motorlink.
//!
//! Plain data types with no I/O: which motor a value belongs to, how a speed
//! is represented, the locally editable control values, and the connection
//! status.  Everything that *changes* these values lives in [`crate::sync`].

pub mod motor;
pub mod state;

pub use motor::{MotorSide, Speed};
pub use state::{ConnectionStatus, ControlState, ControlView};
