//! The client event loop.
//!
//! Exactly one task owns the [`ControlSession`].  Transport events and
//! operator commands arrive on two channels; the loop takes them one at a
//! time, applies each to the session through [`EventLoop::handle`], and hands
//! any resulting commands to the [`CommandDispatcher`].  No handler ever runs
//! concurrently with another, so the session needs no locking.
//!
//! After every event the loop publishes a fresh [`ControlView`] on a
//! `tokio::sync::watch` channel.  Renderers read the latest view from there
//! and never touch the session.
//!
//! # Termination
//!
//! The loop stops when:
//!
//! - the transport reports [`TransportEvent::Closed`] (or its channel ends), or
//! - the operator sends [`OperatorCommand::Quit`].
//!
//! In both cases the session ends `Disconnected`.  Dropping the sink when the
//! loop returns tells the transport writer to send its Close frame.

use motorlink_core::{
    CommandDispatcher, CommandSink, ControlSession, ControlView, MotorSide, Speed,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

// ── Events ────────────────────────────────────────────────────────────────────

/// What the transport reports to the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The WebSocket handshake completed.
    Opened,
    /// One inbound text frame.
    Message(String),
    /// The connection is gone.  Always the last event.
    Closed,
}

/// What the operator asks the loop to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorCommand {
    /// Edit one motor's control value.
    SetMotorSpeed { side: MotorSide, speed: Speed },
    /// Close the connection and stop.
    Quit,
}

/// Either kind of input, as seen by [`EventLoop::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Transport(TransportEvent),
    Operator(OperatorCommand),
}

/// Whether the loop keeps running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

/// Final state handed back when the loop stops.
#[derive(Debug)]
pub struct LoopSummary {
    pub session: ControlSession,
    pub commands_sent: u64,
    pub commands_dropped: u64,
    pub malformed_payloads: u64,
}

// ── EventLoop ─────────────────────────────────────────────────────────────────

/// Session state plus dispatcher; the synchronous core of the loop.
#[derive(Debug)]
pub struct EventLoop<S> {
    session: ControlSession,
    dispatcher: CommandDispatcher<S>,
    malformed: u64,
}

impl<S: CommandSink> EventLoop<S> {
    /// Creates a loop around a fresh session.
    pub fn new(sink: S) -> Self {
        Self {
            session: ControlSession::new(),
            dispatcher: CommandDispatcher::new(sink),
            malformed: 0,
        }
    }

    /// Applies one event to the session.
    pub fn handle(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::Transport(event) => self.handle_transport(event),
            SessionEvent::Operator(command) => self.handle_operator(command),
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) -> Step {
        match event {
            TransportEvent::Opened => {
                self.session.on_open();
                Step::Continue
            }
            TransportEvent::Message(text) => {
                match self.session.ingest(&text) {
                    Ok(commands) => {
                        self.dispatcher.dispatch(commands);
                    }
                    Err(e) => {
                        self.malformed += 1;
                        warn!("ignoring malformed telemetry: {e}");
                    }
                }
                Step::Continue
            }
            TransportEvent::Closed => {
                self.session.on_close();
                Step::Stop
            }
        }
    }

    fn handle_operator(&mut self, command: OperatorCommand) -> Step {
        match command {
            OperatorCommand::SetMotorSpeed { side, speed } => {
                let command = self.session.set_motor_speed(side, speed);
                self.dispatcher.dispatch(command);
                Step::Continue
            }
            OperatorCommand::Quit => {
                info!("closing connection at operator request");
                self.session.on_close();
                Step::Stop
            }
        }
    }

    /// Borrows the session.
    pub fn session(&self) -> &ControlSession {
        &self.session
    }

    /// Borrows the sink, e.g. to inspect captured frames in tests.
    pub fn sink(&self) -> &S {
        self.dispatcher.sink()
    }

    /// Render DTO for the current state.
    pub fn view(&self) -> ControlView {
        self.session.view()
    }

    /// Consumes the loop, dropping the sink.
    pub fn finish(self) -> LoopSummary {
        LoopSummary {
            commands_sent: self.dispatcher.sent_count(),
            commands_dropped: self.dispatcher.dropped_count(),
            malformed_payloads: self.malformed,
            session: self.session,
        }
    }
}

// ── Async driver ──────────────────────────────────────────────────────────────

/// Runs the event loop until the transport closes or the operator quits.
///
/// `transport_rx` is fed by the transport reader, `operator_rx` by the console
/// and the Ctrl+C handler.  Transport events are polled first when both are
/// ready, so an `Opened` or `Closed` event is never overtaken by an edit that
/// arrived at the same time.
///
/// If every operator sender is dropped the loop keeps mirroring telemetry
/// until the transport closes.
pub async fn run_event_loop<S: CommandSink>(
    mut transport_rx: mpsc::Receiver<TransportEvent>,
    mut operator_rx: mpsc::Receiver<OperatorCommand>,
    sink: S,
    view_tx: watch::Sender<ControlView>,
) -> LoopSummary {
    let mut event_loop = EventLoop::new(sink);
    let mut operator_open = true;
    view_tx.send_replace(event_loop.view());

    loop {
        let event = tokio::select! {
            biased;

            event = transport_rx.recv() => {
                SessionEvent::Transport(event.unwrap_or(TransportEvent::Closed))
            }

            command = operator_rx.recv(), if operator_open => match command {
                Some(command) => SessionEvent::Operator(command),
                None => {
                    debug!("operator input closed; mirroring telemetry only");
                    operator_open = false;
                    continue;
                }
            },
        };

        let step = event_loop.handle(event);
        view_tx.send_replace(event_loop.view());
        if step == Step::Stop {
            break;
        }
    }

    let summary = event_loop.finish();
    info!(
        "session ended: {} command(s) sent, {} dropped, {} malformed payload(s)",
        summary.commands_sent, summary.commands_dropped, summary.malformed_payloads
    );
    summary
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use motorlink_core::ConnectionStatus;

    const SEED: &str = r#"{"left_motor_speed":0,"right_motor_speed":0}"#;

    fn message(text: &str) -> SessionEvent {
        SessionEvent::Transport(TransportEvent::Message(text.to_string()))
    }

    fn set(side: MotorSide, speed: i32) -> SessionEvent {
        SessionEvent::Operator(OperatorCommand::SetMotorSpeed {
            side,
            speed: Speed::from(speed),
        })
    }

    #[test]
    fn test_handle_open_seed_edit_sends_one_frame() {
        // Arrange
        let mut event_loop = EventLoop::new(Vec::<String>::new());

        // Act
        event_loop.handle(SessionEvent::Transport(TransportEvent::Opened));
        event_loop.handle(message(SEED));
        event_loop.handle(set(MotorSide::Left, 50));

        // Assert
        assert_eq!(
            event_loop.sink(),
            &[r#"{"cmd":"set_motor_speed","params":{"motor_side":"left","speed":50}}"#]
        );
        assert_eq!(event_loop.session().status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_handle_malformed_message_is_counted_and_continues() {
        let mut event_loop = EventLoop::new(Vec::<String>::new());
        event_loop.handle(SessionEvent::Transport(TransportEvent::Opened));

        let step = event_loop.handle(message("{oops"));

        assert_eq!(step, Step::Continue);
        assert!(!event_loop.session().is_initialized());
        assert_eq!(event_loop.finish().malformed_payloads, 1);
    }

    #[test]
    fn test_handle_closed_stops_and_disconnects() {
        let mut event_loop = EventLoop::new(Vec::<String>::new());
        event_loop.handle(SessionEvent::Transport(TransportEvent::Opened));

        let step = event_loop.handle(SessionEvent::Transport(TransportEvent::Closed));

        assert_eq!(step, Step::Stop);
        assert_eq!(event_loop.view().status, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_handle_quit_stops_and_disconnects() {
        let mut event_loop = EventLoop::new(Vec::<String>::new());
        event_loop.handle(SessionEvent::Transport(TransportEvent::Opened));

        let step = event_loop.handle(SessionEvent::Operator(OperatorCommand::Quit));

        assert_eq!(step, Step::Stop);
        assert_eq!(event_loop.session().status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_run_event_loop_publishes_view_and_stops_on_close() {
        // Arrange
        let (transport_tx, transport_rx) = mpsc::channel(8);
        let (operator_tx, operator_rx) = mpsc::channel(8);
        let (view_tx, mut view_rx) = watch::channel(ControlView::default());

        transport_tx.send(TransportEvent::Opened).await.unwrap();
        transport_tx
            .send(TransportEvent::Message(SEED.to_string()))
            .await
            .unwrap();

        let handle = tokio::spawn(run_event_loop(transport_rx, operator_rx, Vec::<String>::new(), view_tx));

        // Act: wait for the seed, edit, then close
        view_rx.wait_for(|view| view.initialized).await.unwrap();
        operator_tx
            .send(OperatorCommand::SetMotorSpeed {
                side: MotorSide::Right,
                speed: Speed::from(-30),
            })
            .await
            .unwrap();
        view_rx
            .wait_for(|view| view.right_motor_speed == Speed::from(-30))
            .await
            .unwrap();
        transport_tx.send(TransportEvent::Closed).await.unwrap();
        let summary = handle.await.unwrap();

        // Assert
        assert_eq!(summary.commands_sent, 1);
        assert_eq!(summary.session.status(), ConnectionStatus::Disconnected);
        assert_eq!(view_rx.borrow().status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_run_event_loop_treats_dropped_transport_as_closed() {
        let (transport_tx, transport_rx) = mpsc::channel(1);
        let (_operator_tx, operator_rx) = mpsc::channel(1);
        let (view_tx, _view_rx) = watch::channel(ControlView::default());
        drop(transport_tx);

        let summary = run_event_loop(transport_rx, operator_rx, Vec::<String>::new(), view_tx).await;

        assert_eq!(summary.session.status(), ConnectionStatus::Disconnected);
        assert_eq!(summary.commands_sent, 0);
    }

    #[tokio::test]
    async fn test_run_event_loop_keeps_running_without_operator() {
        // Arrange: operator input is gone before the loop starts
        let (transport_tx, transport_rx) = mpsc::channel(4);
        let (operator_tx, operator_rx) = mpsc::channel(1);
        let (view_tx, _view_rx) = watch::channel(ControlView::default());
        drop(operator_tx);
        transport_tx.send(TransportEvent::Opened).await.unwrap();
        transport_tx
            .send(TransportEvent::Message(SEED.to_string()))
            .await
            .unwrap();
        transport_tx.send(TransportEvent::Closed).await.unwrap();

        // Act
        let summary = run_event_loop(transport_rx, operator_rx, Vec::<String>::new(), view_tx).await;

        // Assert: telemetry was still processed
        assert!(summary.session.is_initialized());
    }
}
