//! Replays a JSON-lines event script as if it came off the wire.
//!
//! Each non-blank line is one inbound event, optionally delayed:
//!
//! ```text
//! # roster first, then a message two seconds later
//! {"type":"roster_push","entries":[{"jid":"a@x.com","name":"Alice","subscription":"both"}]}
//! {"type":"incoming_message","delay_ms":2000,"jid":"a@x.com/phone","body":"hi"}
//! ```

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use chirp_core::event::InboundEvent;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app::Command;

#[derive(Debug, Deserialize)]
pub struct ScriptLine {
  /// Wait this long before delivering the event.
  #[serde(default)]
  pub delay_ms: u64,
  #[serde(flatten)]
  pub event:    InboundEvent,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptLine>> {
  let line = line.trim();
  if line.is_empty() || line.starts_with('#') {
    return Ok(None);
  }
  serde_json::from_str(line)
    .map(Some)
    .context("malformed script line")
}

/// Feed every event in `path` into the command queue.
///
/// Malformed lines are logged and skipped. Stops early if the queue closes.
pub async fn replay(path: &Path, queue: mpsc::Sender<Command>) -> Result<()> {
  let raw = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("reading script {}", path.display()))?;

  for (idx, line) in raw.lines().enumerate() {
    let entry = match parse_line(line) {
      Ok(Some(entry)) => entry,
      Ok(None) => continue,
      Err(e) => {
        warn!(line = idx + 1, error = %e, "skipping script line");
        continue;
      }
    };
    if entry.delay_ms > 0 {
      tokio::time::sleep(Duration::from_millis(entry.delay_ms)).await;
    }
    if queue.send(Command::Inbound(entry.event)).await.is_err() {
      debug!("command queue closed; script replay stopped");
      break;
    }
  }
  Ok(())
}
