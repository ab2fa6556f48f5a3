//! Terminal console: reads operator lines and prints the control view.
//!
//! [`run_console`] is generic over its input and output so tests can drive it
//! with in-memory buffers; `main.rs` passes stdin and stdout.

use motorlink_core::ControlView;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::application::{parse_console_line, ConsoleCommand, OperatorCommand};

/// Reads lines until EOF, `quit`, or the event loop goes away.
///
/// Edits are forwarded to the event loop.  `status` prints the latest view
/// from `view_rx`.  Parse errors are printed and the line is ignored.
///
/// # Errors
///
/// Returns any I/O error from reading `input` or writing `output`.
pub async fn run_console<R, W>(
    input: R,
    mut output: W,
    operator_tx: mpsc::Sender<OperatorCommand>,
    view_rx: watch::Receiver<ControlView>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_console_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                output.write_all(format!("error: {e}\n").as_bytes()).await?;
                output.flush().await?;
                continue;
            }
        };

        if command == ConsoleCommand::Status {
            let text = match render_view(&view_rx.borrow()) {
                Ok(text) => text,
                Err(e) => format!("error: failed to render status: {e}\n"),
            };
            output.write_all(text.as_bytes()).await?;
            output.flush().await?;
            continue;
        }

        for operator_command in command.into_operator_commands() {
            if operator_tx.send(operator_command).await.is_err() {
                debug!("event loop gone; console stopping");
                return Ok(());
            }
        }
        if command == ConsoleCommand::Quit {
            return Ok(());
        }
    }

    debug!("console input closed");
    Ok(())
}

/// Formats a [`ControlView`] for the terminal as pretty-printed JSON.
///
/// # Errors
///
/// Returns the serializer error if a telemetry value cannot be encoded.
pub fn render_view(view: &ControlView) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(view)?;
    text.push('\n');
    Ok(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
