//! Stand-in for the network side of the transport.
//!
//! [`ChannelTransport`] hands outbound stanzas to an unbounded channel and
//! returns immediately; [`drain`] consumes that channel on its own task.

use chirp_core::{
  contact::PresenceStatus,
  event::{InboundEvent, IncomingMessage},
  jid::BareJid,
  transport::{Transport, TransportError},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::Command;

/// Resource our echoed messages appear to come from.
const ECHO_RESOURCE: &str = "echo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
  Message {
    to:   BareJid,
    body: String,
  },
  Presence {
    status:      PresenceStatus,
    description: Option<String>,
  },
}

pub struct ChannelTransport {
  tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelTransport {
  pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self { Self { tx } }

  fn hand_off(&self, stanza: Outbound) -> Result<(), TransportError> {
    self.tx.send(stanza).map_err(|_| TransportError::Closed)
  }
}

impl Transport for ChannelTransport {
  fn send(&mut self, to: &BareJid, body: &str) -> Result<(), TransportError> {
    self.hand_off(Outbound::Message {
      to:   to.clone(),
      body: body.to_owned(),
    })
  }

  fn set_presence(
    &mut self,
    status: &PresenceStatus,
    description: Option<&str>,
  ) -> Result<(), TransportError> {
    self.hand_off(Outbound::Presence {
      status:      status.clone(),
      description: description.map(str::to_owned),
    })
  }
}

/// Log every outbound stanza for `account`.
///
/// With `echo` set, each message is fed back as if the contact had replied
/// from another resource. The sender is weak so this task never keeps the
/// command queue open on its own. Returns once the transport is dropped.
pub async fn drain(
  account: String,
  mut rx: mpsc::UnboundedReceiver<Outbound>,
  echo: Option<mpsc::WeakSender<Command>>,
) {
  while let Some(stanza) = rx.recv().await {
    match stanza {
      Outbound::Message { to, body } => {
        info!(%account, %to, bytes = body.len(), "message handed to network");
        let Some(queue) = echo.as_ref().and_then(mpsc::WeakSender::upgrade)
        else {
          continue;
        };
        let reply = InboundEvent::IncomingMessage(IncomingMessage {
          jid: format!("{to}/{ECHO_RESOURCE}"),
          body,
        });
        if queue.send(Command::Inbound(reply)).await.is_err() {
          debug!("command queue closed; echo dropped");
        }
      }
      Outbound::Presence {
        status,
        description,
      } => {
        info!(%account, status = status.label(), ?description, "presence set");
      }
    }
  }
  debug!("outbound channel closed");
}
