//! Error types for `chirp-core`.

use thiserror::Error;

use crate::{jid::BareJid, transport::TransportError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("contact not found: {0}")]
  UnknownContact(BareJid),

  #[error("no open chat session with {0}")]
  SessionNotOpen(BareJid),

  #[error("transport error: {0}")]
  Transport(#[from] TransportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
