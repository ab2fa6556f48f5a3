//! Handing commands to a transport.
//!
//! [`CommandSink`] is the port the transport implements; [`CommandDispatcher`]
//! serializes each [`MotorCommand`] and pushes it through the sink.
//!
//! Sends are fire-and-forget: no acknowledgment, no retry, no queueing.  If
//! the transport is closed the command is logged and dropped.

use thiserror::Error;
use tracing::{debug, error};

use crate::protocol::MotorCommand;

/// Why a sink refused a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The transport has closed; the message was not sent.
    #[error("transport is closed")]
    Closed,
}

/// Outbound half of a transport, as seen by the synchronizer.
///
/// Implementations must not block: `send_text` should hand the frame to a
/// writer task or buffer and return immediately.
#[cfg_attr(test, mockall::automock)]
pub trait CommandSink {
    /// Sends one UTF-8 text frame.
    fn send_text(&mut self, text: String) -> Result<(), SendError>;
}

impl CommandSink for Vec<String> {
    fn send_text(&mut self, text: String) -> Result<(), SendError> {
        self.push(text);
        Ok(())
    }
}

/// Serializes commands and writes them to a [`CommandSink`], one frame per
/// command.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    sink: S,
    sent: u64,
    dropped: u64,
}

impl<S: CommandSink> CommandDispatcher<S> {
    /// Wraps a sink.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            sent: 0,
            dropped: 0,
        }
    }

    /// Sends every command in `commands`, in order.
    ///
    /// Accepts anything iterable, so both `Vec<MotorCommand>` from ingest and
    /// `Option<MotorCommand>` from an edit can be passed directly.  Returns
    /// how many commands the sink accepted.
    pub fn dispatch<I>(&mut self, commands: I) -> usize
    where
        I: IntoIterator<Item = MotorCommand>,
    {
        let mut accepted = 0;
        for command in commands {
            let text = match command.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("failed to serialize {command:?}: {e}");
                    self.dropped += 1;
                    continue;
                }
            };

            match self.sink.send_text(text) {
                Ok(()) => {
                    debug!(
                        "sent set_motor_speed {}={}",
                        command.motor_side(),
                        command.speed()
                    );
                    self.sent += 1;
                    accepted += 1;
                }
                Err(e) => {
                    debug!(
                        "dropped set_motor_speed {}={}: {e}",
                        command.motor_side(),
                        command.speed()
                    );
                    self.dropped += 1;
                }
            }
        }
        accepted
    }

    /// Total commands the sink accepted.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    /// Total commands dropped because the sink refused them.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Borrows the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwraps the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MotorSide, Speed};
    use mockall::predicate::eq;

    #[test]
    fn test_dispatch_sends_one_frame_per_command() {
        // Arrange
        let mut sink = MockCommandSink::new();
        sink.expect_send_text()
            .with(eq(
                r#"{"cmd":"set_motor_speed","params":{"motor_side":"left","speed":50}}"#.to_string(),
            ))
            .times(1)
            .returning(|_| Ok(()));
        let mut dispatcher = CommandDispatcher::new(sink);

        // Act
        let accepted = dispatcher.dispatch(Some(MotorCommand::set_motor_speed(
            MotorSide::Left,
            Speed::from(50),
        )));

        // Assert
        assert_eq!(accepted, 1);
        assert_eq!(dispatcher.sent_count(), 1);
    }

    #[test]
    fn test_dispatch_of_none_sends_nothing() {
        let mut sink = MockCommandSink::new();
        sink.expect_send_text().times(0);
        let mut dispatcher = CommandDispatcher::new(sink);

        assert_eq!(dispatcher.dispatch(None), 0);
    }

    #[test]
    fn test_closed_sink_drops_command_without_retry() {
        // Arrange: the transport refuses every frame
        let mut sink = MockCommandSink::new();
        sink.expect_send_text()
            .times(1)
            .returning(|_| Err(SendError::Closed));
        let mut dispatcher = CommandDispatcher::new(sink);

        // Act
        let accepted = dispatcher.dispatch(vec![MotorCommand::set_motor_speed(
            MotorSide::Right,
            Speed::from(10),
        )]);

        // Assert: one attempt, counted as dropped
        assert_eq!(accepted, 0);
        assert_eq!(dispatcher.dropped_count(), 1);
        assert_eq!(dispatcher.sent_count(), 0);
    }

    #[test]
    fn test_vec_sink_records_frames_in_order() {
        let mut dispatcher = CommandDispatcher::new(Vec::new());

        dispatcher.dispatch(vec![
            MotorCommand::set_motor_speed(MotorSide::Left, Speed::from(1)),
            MotorCommand::set_motor_speed(MotorSide::Right, Speed::from(2)),
        ]);

        let frames = dispatcher.into_sink();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains(r#""motor_side":"left""#));
        assert!(frames[1].contains(r#""motor_side":"right""#));
    }
}
