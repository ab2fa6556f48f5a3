//! motorlink: entry point.
//!
//! Connects to a device's telemetry WebSocket, mirrors its state, and sends
//! `set_motor_speed` commands for operator edits typed at the terminal.
//!
//! # Usage
//!
//! ```text
//! motorlink [OPTIONS]
//!
//! Options:
//!   --url <URL>          Device WebSocket URL [default: ws://127.0.0.1:8000/ws]
//!   --config <PATH>      TOML config file
//!   --log-level <LEVEL>  Log filter when RUST_LOG is unset [default: info]
//!   --print-config       Print the effective configuration and exit
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present; either takes precedence
//! over the config file.
//!
//! | Variable            | Description                   |
//! |---------------------|-------------------------------|
//! | `MOTORLINK_URL`     | Device WebSocket URL          |
//! | `MOTORLINK_CONFIG`  | Path to the TOML config file  |
//! | `MOTORLINK_LOG`     | Log filter                    |
//! | `RUST_LOG`          | Overrides every log setting   |
//!
//! # Console commands
//!
//! `left <speed>`, `right <speed>`, `both <speed>`, `status`, `quit`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use motorlink_client::application::{run_event_loop, OperatorCommand};
use motorlink_client::infrastructure::{connect, run_console, ClientConfig};
use motorlink_core::ControlView;

/// How long to wait for the Close frame to go out after the loop stops.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// How long runtime shutdown waits for background tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote motor control client.
#[derive(Debug, Parser)]
#[command(
    name = "motorlink",
    about = "Mirror device telemetry and send motor speed commands over WebSocket",
    version
)]
struct Cli {
    /// Device WebSocket URL (ws:// or wss://).  Overrides the config file.
    #[arg(long, env = "MOTORLINK_URL")]
    url: Option<String>,

    /// Path to a TOML config file.  A missing file means defaults.
    #[arg(long, env = "MOTORLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.  Overrides the config file.
    #[arg(long, env = "MOTORLINK_LOG")]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Loads the config file (if any) and applies the CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        let base = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };

        let cfg = base.with_overrides(self.url.clone(), self.log_level.clone());
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// All session work happens on one task, so a current-thread runtime is
/// enough.  The runtime is built by hand so that shutdown can be bounded:
/// the stdin reader sits in a blocking read that cannot be cancelled.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and merged over the config file.
/// 2. `tracing_subscriber` is initialised from `RUST_LOG`, or the configured
///    level when `RUST_LOG` is absent or invalid.
/// 3. The WebSocket connection is opened.
/// 4. The console reader and a Ctrl+C handler are spawned; both feed the
///    operator channel.
/// 5. [`run_event_loop`] runs until the device closes the connection or the
///    operator quits.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let session_id = Uuid::new_v4();
    let span = tracing::info_span!("session", id = %session_id);
    let result = runtime.block_on(run_session(config).instrument(span));

    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Connects, wires the channels, and runs one session to completion.
async fn run_session(config: ClientConfig) -> anyhow::Result<()> {
    info!("motorlink starting: device={}", config.connection.url);

    let connection = connect(&config.connection.url, config.connection.channel_capacity)
        .await
        .context("could not reach the device")?;

    let (operator_tx, operator_rx) = mpsc::channel::<OperatorCommand>(16);
    let (view_tx, view_rx) = watch::channel(ControlView::default());

    // ── Console ───────────────────────────────────────────────────────────────
    let console_tx = operator_tx.clone();
    tokio::spawn(
        async move {
            let stdin = BufReader::new(tokio::io::stdin());
            if let Err(e) = run_console(stdin, tokio::io::stdout(), console_tx, view_rx).await {
                warn!("console stopped: {e}");
            }
        }
        .in_current_span(),
    );

    // ── Graceful shutdown ─────────────────────────────────────────────────────
    tokio::spawn(
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received Ctrl+C, closing connection");
                    let _ = operator_tx.send(OperatorCommand::Quit).await;
                }
                Err(e) => {
                    tracing::error!("failed to listen for Ctrl+C signal: {e}");
                }
            }
        }
        .in_current_span(),
    );

    // ── Main event loop ───────────────────────────────────────────────────────
    let summary = run_event_loop(connection.events, operator_rx, connection.sink, view_tx).await;

    // The sink was dropped with the loop, so the writer is now sending Close.
    if tokio::time::timeout(CLOSE_GRACE, connection.writer)
        .await
        .is_err()
    {
        warn!("timed out waiting for the connection to close");
    }
    connection.reader.abort();

    info!(
        "motorlink stopped: status={}, sent={}, dropped={}",
        summary.session.status(),
        summary.commands_sent,
        summary.commands_dropped
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_everything_unset() {
        // Arrange: parse with no arguments
        let cli = Cli::try_parse_from(["motorlink"]).unwrap();

        // Assert
        assert!(cli.config.is_none());
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_url_override() {
        let cli = Cli::parse_from(["motorlink", "--url", "ws://10.0.0.7:8000/ws"]);
        assert_eq!(cli.url.as_deref(), Some("ws://10.0.0.7:8000/ws"));
    }

    #[test]
    fn test_cli_log_level_override() {
        let cli = Cli::parse_from(["motorlink", "--log-level", "debug"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_resolve_config_without_file_uses_defaults() {
        let cli = Cli {
            url: None,
            config: None,
            log_level: None,
            print_config: false,
        };

        let cfg = cli.resolve_config().unwrap();

        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_resolve_config_cli_overrides_file() {
        // Arrange: a config file that sets both values
        let path = std::env::temp_dir().join(format!("motorlink-cli-{}.toml", Uuid::new_v4()));
        std::fs::write(
            &path,
            "[connection]\nurl = \"ws://file.example/ws\"\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        let cli = Cli {
            url: Some("ws://cli.example/ws".to_string()),
            config: Some(path.clone()),
            log_level: None,
            print_config: false,
        };

        // Act
        let result = cli.resolve_config();
        let _ = std::fs::remove_file(&path);

        // Assert: URL from the CLI, level from the file
        let cfg = result.unwrap();
        assert_eq!(cfg.connection.url, "ws://cli.example/ws");
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn test_resolve_config_rejects_http_url() {
        let cli = Cli {
            url: Some("http://127.0.0.1:8000/ws".to_string()),
            config: None,
            log_level: None,
            print_config: false,
        };

        assert!(cli.resolve_config().is_err());
    }
}
