//! Operator console commands.
//!
//! One line of terminal input becomes at most one [`ConsoleCommand`]:
//!
//! | Input               | Command                                 |
//! |---------------------|-----------------------------------------|
//! | `left 40`, `l 40`   | set the left motor speed                |
//! | `right -5`, `r -5`  | set the right motor speed               |
//! | `both 25`           | set both motors, left first             |
//! | `status`, `s`       | print the current control view          |
//! | `quit`, `exit`, `q` | close the connection and stop           |
//! | (blank line)        | ignored                                 |
//!
//! Keywords are case-insensitive.  Speeds are decimal numbers; any finite
//! value is accepted, since the device owns range checking.

use motorlink_core::{MotorSide, Speed};
use thiserror::Error;

use super::event_loop::OperatorCommand;

/// Rejected console input.  The line is ignored and the message is printed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleParseError {
    #[error("unknown command `{0}` (try: left <speed>, right <speed>, both <speed>, status, quit)")]
    UnknownCommand(String),

    #[error("`{0}` needs a speed, e.g. `{0} 50`")]
    MissingSpeed(String),

    #[error("invalid speed `{0}`: expected a finite number")]
    InvalidSpeed(String),

    #[error("unexpected extra input `{0}`")]
    TrailingInput(String),
}

/// A parsed line of operator input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    /// Set one motor.
    SetSpeed { side: MotorSide, speed: Speed },
    /// Set both motors to the same speed.
    SetBoth(Speed),
    /// Print the current view.  Handled by the console itself.
    Status,
    /// Close the connection.
    Quit,
}

impl ConsoleCommand {
    /// Expands the command into what the event loop must process.
    ///
    /// `Status` is purely local and expands to nothing.
    pub fn into_operator_commands(self) -> Vec<OperatorCommand> {
        match self {
            ConsoleCommand::SetSpeed { side, speed } => {
                vec![OperatorCommand::SetMotorSpeed { side, speed }]
            }
            ConsoleCommand::SetBoth(speed) => MotorSide::ALL
                .into_iter()
                .map(|side| OperatorCommand::SetMotorSpeed { side, speed })
                .collect(),
            ConsoleCommand::Status => Vec::new(),
            ConsoleCommand::Quit => vec![OperatorCommand::Quit],
        }
    }
}

/// Parses one line of console input.
///
/// Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// Returns [`ConsoleParseError`] if the keyword is unknown, a speed is missing
/// or not a finite number, or extra words follow the command.
pub fn parse_console_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleParseError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };
    let keyword = keyword.to_ascii_lowercase();

    let command = match keyword.as_str() {
        "left" | "l" => ConsoleCommand::SetSpeed {
            side: MotorSide::Left,
            speed: parse_speed(&keyword, words.next())?,
        },
        "right" | "r" => ConsoleCommand::SetSpeed {
            side: MotorSide::Right,
            speed: parse_speed(&keyword, words.next())?,
        },
        "both" | "b" => ConsoleCommand::SetBoth(parse_speed(&keyword, words.next())?),
        "status" | "s" => ConsoleCommand::Status,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        _ => return Err(ConsoleParseError::UnknownCommand(keyword)),
    };

    let rest: Vec<&str> = words.collect();
    if !rest.is_empty() {
        return Err(ConsoleParseError::TrailingInput(rest.join(" ")));
    }
    Ok(Some(command))
}

fn parse_speed(keyword: &str, word: Option<&str>) -> Result<Speed, ConsoleParseError> {
    let word = word.ok_or_else(|| ConsoleParseError::MissingSpeed(keyword.to_string()))?;
    match word.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Speed::new(value)),
        _ => Err(ConsoleParseError::InvalidSpeed(word.to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
