//! Inbound device telemetry.
//!
//! The device publishes its full state as one JSON object per message, for
//! example:
//!
//! ```json
//! {"left_motor_speed":40,"left_motor_duty_cycle":1.7,
//!  "right_motor_speed":40,"right_motor_duty_cycle":1.7,
//!  "throttle":40,"turn_speed":0,"trim":-2}
//! ```
//!
//! Only the two motor speeds are required.  Everything else is carried as an
//! opaque [`serde_json::Map`] and exposed for display through [`DeviceSnapshot::get`]
//! and a handful of typed accessors for the fields the device is known to send.
//!
//! Snapshots are never merged: each message replaces the previous one whole.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{MotorSide, Speed};

// ── Error type ────────────────────────────────────────────────────────────────

/// Why an inbound payload could not be turned into a [`DeviceSnapshot`].
///
/// Ingest treats every variant the same way (log, keep the last good state),
/// but the variants keep log lines specific.
#[derive(Debug, Error)]
pub enum MalformedSnapshotError {
    /// The payload is not JSON at all.
    #[error("snapshot is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload is JSON, but not an object (e.g. an array or a bare number).
    #[error("snapshot must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A required motor speed field is absent or is not a number.
    #[error("snapshot field `{0}` is missing or not a number")]
    MissingSpeed(&'static str),
}

// ── DeviceSnapshot ────────────────────────────────────────────────────────────

/// One full, non-incremental report of device state.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    fields: Map<String, Value>,
    left_motor_speed: Speed,
    right_motor_speed: Speed,
}

impl DeviceSnapshot {
    /// Parses one inbound text message.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSnapshotError`] if `text` is not a JSON object with
    /// numeric `left_motor_speed` and `right_motor_speed` fields.
    pub fn parse(text: &str) -> Result<Self, MalformedSnapshotError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(MalformedSnapshotError::NotAnObject(json_kind(&other))),
        }
    }

    /// Builds a snapshot from an already-decoded JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSnapshotError::MissingSpeed`] if either motor speed
    /// is absent or non-numeric.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, MalformedSnapshotError> {
        let speed_of = |side: MotorSide| {
            let field = side.telemetry_field();
            fields
                .get(field)
                .and_then(Value::as_f64)
                .map(Speed::new)
                .ok_or(MalformedSnapshotError::MissingSpeed(field))
        };
        let left_motor_speed = speed_of(MotorSide::Left)?;
        let right_motor_speed = speed_of(MotorSide::Right)?;

        Ok(Self {
            fields,
            left_motor_speed,
            right_motor_speed,
        })
    }

    /// Reported speed of one motor.
    pub fn motor_speed(&self, side: MotorSide) -> Speed {
        match side {
            MotorSide::Left => self.left_motor_speed,
            MotorSide::Right => self.right_motor_speed,
        }
    }

    /// Reported left motor speed.
    pub fn left_motor_speed(&self) -> Speed {
        self.left_motor_speed
    }

    /// Reported right motor speed.
    pub fn right_motor_speed(&self) -> Speed {
        self.right_motor_speed
    }

    /// Left motor PWM duty cycle in milliseconds, if reported.
    pub fn left_motor_duty_cycle(&self) -> Option<f64> {
        self.number("left_motor_duty_cycle")
    }

    /// Right motor PWM duty cycle in milliseconds, if reported.
    pub fn right_motor_duty_cycle(&self) -> Option<f64> {
        self.number("right_motor_duty_cycle")
    }

    /// Combined throttle, if reported.
    pub fn throttle(&self) -> Option<f64> {
        self.number("throttle")
    }

    /// Current turn speed (negative turns left), if reported.
    pub fn turn_speed(&self) -> Option<f64> {
        self.number("turn_speed")
    }

    /// Steering trim, if reported.
    pub fn trim(&self) -> Option<f64> {
        self.number("trim")
    }

    /// Raw value of any field, for display.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields, keyed by name.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }
}

/// Human-readable JSON type name for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
