//! Infrastructure layer for the client.
//!
//! Everything that touches the outside world lives here: the WebSocket
//! connection to the device, the operator's terminal, and the configuration
//! file.  Each adapter translates its I/O into the plain channel messages the
//! application layer understands ([`crate::application::TransportEvent`],
//! [`crate::application::OperatorCommand`]).
//!
//! # What does NOT belong here?
//!
//! - Deciding whether a change must be sent (that is `motorlink-core`)
//! - Event ordering and session ownership (that is the application layer)

pub mod config;
pub mod console;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use console::{render_view, run_console};
pub use transport::{connect, ChannelSink, TransportError, WsConnection};
