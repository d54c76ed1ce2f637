//! `chirp` — line-oriented driver for the chirp contact directory.
//!
//! # Usage
//!
//! ```
//! chirp --account me@example.com --script demo.jsonl
//! chirp --config ~/.config/chirp/chirp.toml
//! ```
//!
//! Inbound events come from the script (one JSON event per line); commands
//! such as `/msg alice@example.com hi` are read from stdin. Logs go to
//! stderr, rendered chat lines to stdout. The session ends on `/quit`, or
//! once both the script and stdin are exhausted.

mod app;
mod network;
mod script;
mod terminal;

use std::{
  io,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use app::{App, Command};
use chirp_core::{contact::PresenceStatus, dispatch::Dispatcher};
use clap::Parser;
use network::ChannelTransport;
use serde::Deserialize;
use terminal::TerminalPresenter;
use tokio::sync::mpsc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

/// Commands buffered between producers and the dispatcher loop.
const QUEUE_DEPTH: usize = 256;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "chirp", version, about = "Contact list and chat sessions over an XMPP-style transport")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "chirp.toml")]
  config: PathBuf,

  /// JSON-lines file of inbound events to replay.
  #[arg(short, long, value_name = "FILE")]
  script: Option<PathBuf>,

  /// Account (bare JID) we are logged in as.
  #[arg(long, env = "CHIRP_ACCOUNT")]
  account: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Settings merged from the config file and `CHIRP_*` environment variables.
#[derive(Debug, Deserialize)]
struct ClientConfig {
  #[serde(default)]
  account:              String,
  #[serde(default)]
  script:               Option<PathBuf>,
  #[serde(default = "default_presence")]
  presence_status:      PresenceStatus,
  #[serde(default)]
  presence_description: Option<String>,
  /// Feed every sent message back as a reply.
  #[serde(default)]
  echo:                 bool,
  #[serde(default = "default_log_level")]
  log_level:            String,
}

fn default_presence() -> PresenceStatus { PresenceStatus::Normal }

fn default_log_level() -> String { "info".to_string() }

fn load_config(path: &Path) -> Result<ClientConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("CHIRP"))
    .build()
    .with_context(|| format!("failed to read config file {}", path.display()))?;

  settings
    .try_deserialize()
    .context("failed to deserialise client config")
}

fn init_tracing(level: &str) -> Result<()> {
  let level: LevelFilter = level
    .parse()
    .with_context(|| format!("invalid log level {level:?}"))?;
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let mut cfg = load_config(&cli.config)?;
  init_tracing(&cfg.log_level)?;

  // CLI flags override config file and environment.
  if let Some(account) = cli.account {
    cfg.account = account;
  }
  if cli.script.is_some() {
    cfg.script = cli.script;
  }
  if cfg.account.is_empty() {
    bail!("no account configured; pass --account or set CHIRP_ACCOUNT");
  }

  let (queue_tx, queue_rx) = mpsc::channel(QUEUE_DEPTH);
  let (out_tx, out_rx) = mpsc::unbounded_channel();

  let dispatcher = Dispatcher::new(
    TerminalPresenter::new(io::stdout()),
    ChannelTransport::new(out_tx),
  );
  let mut app = App::new(dispatcher);
  app
    .announce_presence(&cfg.presence_status, cfg.presence_description.as_deref())
    .context("setting initial presence")?;
  info!(account = %cfg.account, "logged in");

  let echo = cfg.echo.then(|| queue_tx.downgrade());
  let network = tokio::spawn(network::drain(cfg.account.clone(), out_rx, echo));

  if let Some(path) = cfg.script.clone() {
    let queue = queue_tx.clone();
    tokio::spawn(async move {
      if let Err(e) = script::replay(&path, queue).await {
        warn!(error = %e, "script replay failed");
      }
    });
  }
  std::thread::spawn(move || read_commands(queue_tx));

  app.run(queue_rx).await;

  // Dropping the dispatcher closes the outbound channel.
  drop(app);
  network.await.context("network task panicked")?;
  Ok(())
}

/// Turn stdin lines into commands until EOF.
///
/// Runs on a plain thread: a blocking stdin read must not hold up runtime
/// shutdown after `/quit`.
fn read_commands(queue: mpsc::Sender<Command>) {
  for line in io::stdin().lines() {
    let line = match line {
      Ok(line) => line,
      Err(e) => {
        warn!(error = %e, "failed to read stdin");
        break;
      }
    };
    if line.trim().is_empty() {
      continue;
    }
    match Command::parse(&line) {
      Ok(command) => {
        if queue.blocking_send(command).is_err() {
          break;
        }
      }
      Err(e) => eprintln!("{e}"),
    }
  }
}
