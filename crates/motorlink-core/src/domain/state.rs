//! Connection status, locally editable control values, and the render DTO.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::motor::{MotorSide, Speed};

// ── ConnectionStatus ──────────────────────────────────────────────────────────

/// Transport state as seen by the operator.
///
/// The lifecycle is `Disconnected → Connected → Disconnected`.  There is no
/// reconnect: once closed, a session stays closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No open transport (initial state, and terminal after close).
    #[default]
    Disconnected,
    /// The transport reported open.
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("disconnected"),
            ConnectionStatus::Connected => f.write_str("connected"),
        }
    }
}

// ── ControlState ──────────────────────────────────────────────────────────────

/// The two operator-editable motor speeds.
///
/// This is the single source of truth for both what the UI shows in the
/// editable controls and what the operator intends the device to do.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlState {
    /// Requested left motor speed.
    pub left_motor_speed: Speed,
    /// Requested right motor speed.
    pub right_motor_speed: Speed,
}

impl ControlState {
    /// Returns the value of one side.
    pub fn get(&self, side: MotorSide) -> Speed {
        match side {
            MotorSide::Left => self.left_motor_speed,
            MotorSide::Right => self.right_motor_speed,
        }
    }

    /// Writes one side and returns the value it held before.
    pub(crate) fn replace(&mut self, side: MotorSide, speed: Speed) -> Speed {
        let slot = match side {
            MotorSide::Left => &mut self.left_motor_speed,
            MotorSide::Right => &mut self.right_motor_speed,
        };
        std::mem::replace(slot, speed)
    }
}

// ── ControlView ───────────────────────────────────────────────────────────────

/// Read-only snapshot of everything a UI needs to render one frame.
///
/// `ControlSession` is not shared across tasks; the event loop copies its
/// state into a `ControlView` after every event and publishes that instead.
/// The DTO derives `Serialize` so a renderer can print it as JSON directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlView {
    /// Current transport state.
    pub status: ConnectionStatus,
    /// `true` once the first snapshot has seeded the control values.
    pub initialized: bool,
    /// Editable left motor speed.
    pub left_motor_speed: Speed,
    /// Editable right motor speed.
    pub right_motor_speed: Speed,
    /// All fields of the most recent telemetry snapshot (empty before the
    /// first one arrives).
    pub telemetry: Map<String, Value>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_defaults_to_disconnected() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_connection_status_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionStatus::Connected).unwrap();
        assert_eq!(json, r#""connected""#);
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
    }

    #[test]
    fn test_control_state_replace_returns_prior_value() {
        // Arrange
        let mut state = ControlState::default();

        // Act
        let prior = state.replace(MotorSide::Left, Speed::from(40));

        // Assert
        assert_eq!(prior, Speed::ZERO);
        assert_eq!(state.get(MotorSide::Left), Speed::from(40));
        assert_eq!(state.get(MotorSide::Right), Speed::ZERO);
    }

    #[test]
    fn test_control_view_default_has_empty_telemetry() {
        let view = ControlView::default();
        assert!(view.telemetry.is_empty());
        assert!(!view.initialized);
        assert_eq!(view.status, ConnectionStatus::Disconnected);
    }
}
