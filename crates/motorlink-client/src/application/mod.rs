//! Application layer for the client.
//!
//! # Use cases
//!
//! - **`event_loop`** – Owns the [`motorlink_core::ControlSession`] and
//!   processes transport events and operator commands strictly one at a time.
//!   After every event it publishes a fresh [`motorlink_core::ControlView`]
//!   for renderers.
//!
//! - **`console_command`** – Parses one line of operator input into a
//!   [`ConsoleCommand`].  Pure string handling with no I/O, so the console
//!   infrastructure stays a thin stdin adapter.

pub mod console_command;
pub mod event_loop;

pub use console_command::{parse_console_line, ConsoleCommand, ConsoleParseError};
pub use event_loop::{
    run_event_loop, EventLoop, LoopSummary, OperatorCommand, SessionEvent, Step, TransportEvent,
};
