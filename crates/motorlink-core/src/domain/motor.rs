//! Motor identity and speed values.
//!
//! # Why a `Speed` newtype instead of a bare `f64`?
//!
//! Telemetry arrives as JSON numbers and commands leave as JSON numbers.  The
//! device publishes whole numbers (`50`), and it expects whole numbers back.
//! `serde_json` writes every `f64` with a decimal point (`50.0`), so a bare
//! `f64` would change the wire shape of every command.  [`Speed`] keeps the
//! full `f64` range for comparisons but serializes integral values as JSON
//! integers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// ── MotorSide ─────────────────────────────────────────────────────────────────

/// Which of the two drive motors a value or command refers to.
///
/// Serialized as the lowercase strings `"left"` and `"right"`, which is the
/// `motor_side` vocabulary of the `set_motor_speed` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorSide {
    /// The port-side motor.
    Left,
    /// The starboard-side motor.
    Right,
}

impl MotorSide {
    /// Both sides, left first.  Seeding and change detection walk this array
    /// so the two channels are always evaluated in the same order.
    pub const ALL: [MotorSide; 2] = [MotorSide::Left, MotorSide::Right];

    /// Returns the wire name of this side (`"left"` or `"right"`).
    pub fn as_str(self) -> &'static str {
        match self {
            MotorSide::Left => "left",
            MotorSide::Right => "right",
        }
    }

    /// Returns the telemetry field that carries this motor's speed.
    pub fn telemetry_field(self) -> &'static str {
        match self {
            MotorSide::Left => "left_motor_speed",
            MotorSide::Right => "right_motor_speed",
        }
    }
}

impl fmt::Display for MotorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Speed ─────────────────────────────────────────────────────────────────────

/// A motor speed as reported by telemetry or requested by the operator.
///
/// No range is enforced here; out-of-range handling is the device's concern.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Speed(f64);

impl Speed {
    /// Zero speed, the value of every motor before the first snapshot arrives.
    pub const ZERO: Speed = Speed(0.0);

    /// Wraps a raw numeric speed.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the value as an `i64` when it is a whole number that an `f64`
    /// represents exactly.
    fn as_exact_integer(self) -> Option<i64> {
        let v = self.0;
        if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_INTEGER {
            Some(v as i64)
        } else {
            None
        }
    }
}

impl From<f64> for Speed {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i32> for Speed {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_exact_integer() {
            Some(i) => write!(f, "{i}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Speed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_exact_integer() {
            Some(i) => serializer.serialize_i64(i),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Speed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Speed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
