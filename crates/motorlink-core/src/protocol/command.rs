//! Outbound motor commands.
//!
//! # Wire format
//!
//! ```json
//! {"cmd":"set_motor_speed","params":{"motor_side":"left","speed":50}}
//! ```
//!
//! Serde's adjacently tagged representation (`tag = "cmd"`, `content =
//! "params"`) produces exactly this shape: the variant name goes in `"cmd"`
//! and the variant's fields are nested under `"params"`.

use serde::{Deserialize, Serialize};

use crate::domain::{MotorSide, Speed};

/// A command the client sends to the device.
///
/// `set_motor_speed` is the only command this client defines.  No
/// acknowledgment is expected for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params", rename_all = "snake_case")]
pub enum MotorCommand {
    /// Request a new speed for one motor.
    SetMotorSpeed {
        /// Which motor to change.
        motor_side: MotorSide,
        /// The requested speed.
        speed: Speed,
    },
}

impl MotorCommand {
    /// Convenience constructor for [`MotorCommand::SetMotorSpeed`].
    pub fn set_motor_speed(motor_side: MotorSide, speed: Speed) -> Self {
        MotorCommand::SetMotorSpeed { motor_side, speed }
    }

    /// The motor this command targets.
    pub fn motor_side(&self) -> MotorSide {
        match self {
            MotorCommand::SetMotorSpeed { motor_side, .. } => *motor_side,
        }
    }

    /// The requested speed.
    pub fn speed(&self) -> Speed {
        match self {
            MotorCommand::SetMotorSpeed { speed, .. } => *speed,
        }
    }

    /// Serializes the command into the text frame sent on the wire.
    ///
    /// # Errors
    ///
    /// Only fails if `serde_json` itself fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
