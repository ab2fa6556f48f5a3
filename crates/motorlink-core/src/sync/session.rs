//! `ControlSession`: telemetry ingest plus echo-free command synchronization.
//!
//! # Two writers, one slot
//!
//! Each motor speed in [`ControlState`] has two writers:
//!
//! - **Telemetry** (`ingest`), which seeds the value exactly once.
//! - **The operator** (`set_motor_speed`), who edits it at any time.
//!
//! Every write goes through the same explicit change-detection step,
//! `observe_change`, which decides whether the new value is a genuine edit
//! that must become a [`MotorCommand`]:
//!
//! ```text
//!   write(side, value)
//!        │
//!        ├─ value == previous value? ───────────────► no change, nothing to observe
//!        │
//!   observe_change(side)
//!        ├─ not yet initialized? ───────────────────► suppress (seed or pre-handshake edit)
//!        ├─ value == latest snapshot's value? ──────► suppress (echo of telemetry)
//!        └─ otherwise ──────────────────────────────► emit set_motor_speed(side, value)
//! ```
//!
//! # Ordering
//!
//! During seeding, both control values are written and the initialization
//! flag is set *before* `observe_change` runs for either of them.  Observation
//! therefore always sees `initialized == true` together with a snapshot that
//! matches the seeded values, and the echo guard suppresses both.
//!
//! # After initialization
//!
//! Later snapshots replace the stored snapshot (the display follows the
//! device) but never overwrite the control values.  From then on the
//! operator's values are authoritative.

use tracing::{debug, info, trace, warn};

use crate::domain::{ConnectionStatus, ControlState, ControlView, MotorSide, Speed};
use crate::protocol::{DeviceSnapshot, MalformedSnapshotError, MotorCommand};

/// All per-connection client state, owned by a single event loop.
///
/// The event loop holds the session by value and passes `&mut` into each
/// handler, one event at a time.
#[derive(Debug, Default)]
pub struct ControlSession {
    status: ConnectionStatus,
    snapshot: Option<DeviceSnapshot>,
    control: ControlState,
    initialized: bool,
}

impl ControlSession {
    /// Creates a disconnected, uninitialized session with both speeds at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Connection lifecycle ─────────────────────────────────────────────────

    /// Transport reported open.
    pub fn on_open(&mut self) {
        if self.status == ConnectionStatus::Connected {
            warn!("transport open reported twice");
        }
        self.status = ConnectionStatus::Connected;
        info!("connection status: {}", self.status);
    }

    /// Transport reported closed.  There is no reconnect; the session stays
    /// disconnected until it is dropped.
    pub fn on_close(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        info!("connection status: {}", self.status);
    }

    // ── Telemetry ingest ─────────────────────────────────────────────────────

    /// Handles one inbound text message.
    ///
    /// Returns the commands that must be sent as a result.  With the echo
    /// guard in place this is always empty for telemetry; the return value
    /// exists so that ingest and edits share one dispatch path.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSnapshotError`] if the payload cannot be parsed.
    /// In that case nothing in the session changes.
    pub fn ingest(&mut self, payload: &str) -> Result<Vec<MotorCommand>, MalformedSnapshotError> {
        let snapshot = DeviceSnapshot::parse(payload)?;
        Ok(self.absorb(snapshot))
    }

    /// Applies an already-parsed snapshot.  See [`ControlSession::ingest`].
    pub fn absorb(&mut self, snapshot: DeviceSnapshot) -> Vec<MotorCommand> {
        let reported = [
            snapshot.motor_speed(MotorSide::Left),
            snapshot.motor_speed(MotorSide::Right),
        ];
        self.snapshot = Some(snapshot);

        if self.initialized {
            trace!(
                "telemetry left={} right={} (display only)",
                reported[0],
                reported[1]
            );
            return Vec::new();
        }

        // Seed: write both values, then mark initialized, then observe.
        let mut changed = Vec::with_capacity(MotorSide::ALL.len());
        for (side, speed) in MotorSide::ALL.into_iter().zip(reported) {
            if self.write(side, speed) {
                changed.push(side);
            }
        }
        self.initialized = true;
        info!(
            "control values seeded from telemetry: left={} right={}",
            reported[0], reported[1]
        );

        changed
            .into_iter()
            .filter_map(|side| self.observe_change(side))
            .collect()
    }

    // ── Operator edits ───────────────────────────────────────────────────────

    /// Applies an operator edit to one motor.
    ///
    /// Returns the command to send, or `None` if the edit is not a genuine
    /// change (same value as before, not yet initialized, or equal to the
    /// latest telemetry value).
    pub fn set_motor_speed(&mut self, side: MotorSide, speed: Speed) -> Option<MotorCommand> {
        if self.write(side, speed) {
            self.observe_change(side)
        } else {
            trace!("{side} motor already at {speed}; no change");
            None
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Current transport state.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// `true` once the first snapshot has seeded the control values.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current operator-editable values.
    pub fn control(&self) -> ControlState {
        self.control
    }

    /// Most recent successfully parsed snapshot.
    pub fn snapshot(&self) -> Option<&DeviceSnapshot> {
        self.snapshot.as_ref()
    }

    /// Copies the session into a render DTO.
    pub fn view(&self) -> ControlView {
        ControlView {
            status: self.status,
            initialized: self.initialized,
            left_motor_speed: self.control.left_motor_speed,
            right_motor_speed: self.control.right_motor_speed,
            telemetry: self
                .snapshot
                .as_ref()
                .map(|s| s.fields().clone())
                .unwrap_or_default(),
        }
    }

    // ── Change detection ─────────────────────────────────────────────────────

    /// Writes one control value; returns `true` if it changed.
    fn write(&mut self, side: MotorSide, speed: Speed) -> bool {
        self.control.replace(side, speed) != speed
    }

    /// Decides whether the current value of `side` must be sent.
    fn observe_change(&self, side: MotorSide) -> Option<MotorCommand> {
        let value = self.control.get(side);

        if !self.initialized {
            debug!("{side} motor set to {value} before first telemetry; not sent");
            return None;
        }

        let reported = self.snapshot.as_ref().map(|s| s.motor_speed(side));
        if reported == Some(value) {
            debug!("{side} motor change to {value} matches telemetry; not sent");
            return None;
        }

        debug!("{side} motor changed to {value}; sending command");
        Some(MotorCommand::set_motor_speed(side, value))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_json(left: i32, right: i32) -> String {
        format!(r#"{{"left_motor_speed":{left},"right_motor_speed":{right}}}"#)
    }

    fn seeded(left: i32, right: i32) -> ControlSession {
        let mut session = ControlSession::new();
        session.on_open();
        let commands = session.ingest(&snapshot_json(left, right)).unwrap();
        assert!(commands.is_empty());
        session
    }

    #[test]
    fn test_new_session_is_disconnected_and_uninitialized() {
        let session = ControlSession::new();
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert!(!session.is_initialized());
        assert!(session.snapshot().is_none());
        assert_eq!(session.control(), ControlState::default());
    }

    #[test]
    fn test_open_then_close_transitions_status() {
        let mut session = ControlSession::new();

        session.on_open();
        assert_eq!(session.status(), ConnectionStatus::Connected);

        session.on_close();
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_seeding_copies_both_speeds() {
        let session = seeded(12, -8);

        assert!(session.is_initialized());
        assert_eq!(session.control().left_motor_speed, Speed::from(12));
        assert_eq!(session.control().right_motor_speed, Speed::from(-8));
    }

    #[test]
    fn test_seeding_with_zero_speeds_produces_no_commands() {
        // Zero matches the default control values, so nothing changes at all.
        let session = seeded(0, 0);
        assert!(session.is_initialized());
    }

    #[test]
    fn test_edit_before_telemetry_is_suppressed_and_then_overwritten() {
        // Arrange
        let mut session = ControlSession::new();
        session.on_open();

        // Act: an edit before the handshake
        let early = session.set_motor_speed(MotorSide::Left, Speed::from(90));
        let seed = session.ingest(&snapshot_json(10, 10)).unwrap();

        // Assert: nothing sent, and the seed wins
        assert!(early.is_none());
        assert!(seed.is_empty());
        assert_eq!(session.control().left_motor_speed, Speed::from(10));
    }

    #[test]
    fn test_edit_after_seed_emits_command() {
        let mut session = seeded(5, 5);

        let cmd = session.set_motor_speed(MotorSide::Right, Speed::from(-20));

        assert_eq!(
            cmd,
            Some(MotorCommand::set_motor_speed(MotorSide::Right, Speed::from(-20)))
        );
    }

    #[test]
    fn test_edit_back_to_telemetry_value_is_treated_as_echo() {
        // Arrange: seeded at 5, operator moves to 7
        let mut session = seeded(5, 5);
        assert!(session.set_motor_speed(MotorSide::Left, Speed::from(7)).is_some());

        // Act: operator moves back to the value telemetry last reported
        let cmd = session.set_motor_speed(MotorSide::Left, Speed::from(5));

        // Assert: suppressed by the echo guard, but the local value still moved
        assert!(cmd.is_none());
        assert_eq!(session.control().left_motor_speed, Speed::from(5));
    }

    #[test]
    fn test_echo_guard_tracks_latest_snapshot() {
        // Arrange: seeded at 5; the device later reports 9
        let mut session = seeded(5, 5);
        session.ingest(&snapshot_json(9, 5)).unwrap();

        // Act / Assert: 9 is now the echo value, 5 is a genuine change
        assert!(session.set_motor_speed(MotorSide::Left, Speed::from(9)).is_none());
        assert!(session.set_motor_speed(MotorSide::Left, Speed::from(5)).is_some());
    }

    #[test]
    fn test_malformed_payload_leaves_session_untouched() {
        let mut session = seeded(3, 4);
        let before = session.view();

        let result = session.ingest("definitely not json");

        assert!(result.is_err());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn test_view_reflects_latest_snapshot_fields() {
        let mut session = seeded(1, 2);
        session
            .ingest(r#"{"left_motor_speed":3,"right_motor_speed":4,"trim":1}"#)
            .unwrap();

        let view = session.view();

        assert_eq!(view.status, ConnectionStatus::Connected);
        assert_eq!(view.left_motor_speed, Speed::from(1));
        assert_eq!(view.telemetry.get("trim"), Some(&serde_json::Value::from(1)));
    }
}
