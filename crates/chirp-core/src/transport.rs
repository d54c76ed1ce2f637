//! The outbound half of the transport collaborator.

use thiserror::Error;

use crate::{contact::PresenceStatus, jid::BareJid};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
  #[error("connection closed")]
  Closed,

  #[error("rejected: {0}")]
  Rejected(String),
}

/// Hands stanzas to the network. Implementations own the logged-in account.
///
/// Both calls are fire-and-forget: `Ok` means the hand-off succeeded, not
/// that the server acknowledged anything.
pub trait Transport {
  fn send(&mut self, to: &BareJid, body: &str) -> Result<(), TransportError>;

  fn set_presence(
    &mut self,
    status: &PresenceStatus,
    description: Option<&str>,
  ) -> Result<(), TransportError>;
}
