//! motorlink-client library crate.
//!
//! Re-exports all public modules so that integration tests in `tests/` and the
//! binary entry point in `main.rs` share the same module tree.
//!
//! # What does the client do? (for beginners)
//!
//! The device (a small twin-motor vessel) runs a WebSocket endpoint that
//! publishes its full state several times per second.  The client:
//!
//! 1. Connects to that endpoint.
//! 2. Feeds every text frame into a [`motorlink_core::ControlSession`], which
//!    seeds the local left/right motor speeds from the first snapshot.
//! 3. Reads operator edits from the terminal (`left 40`, `right -10`, ...).
//! 4. Sends a `set_motor_speed` command for every genuine edit, and never for
//!    values that merely restate telemetry.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Device (JSON over WebSocket)
//!         ↕
//! [motorlink-client]
//!   ├── application/      Event loop + console command parsing
//!   └── infrastructure/
//!         ├── transport/  WebSocket connection (tokio-tungstenite)
//!         ├── console/    stdin reader and status rendering
//!         └── config/     TOML configuration file
//! ```
//!
//! `application` depends only on `motorlink-core` and tokio channels.
//! `infrastructure` depends on everything else.

/// Application layer: the single-threaded event loop and operator commands.
pub mod application;

/// Infrastructure layer: WebSocket transport, terminal console, configuration.
pub mod infrastructure;
