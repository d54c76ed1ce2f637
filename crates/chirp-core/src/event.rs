//! Inbound events from the transport collaborator.
//!
//! These are shapes, not wire formats: whatever parses the XML stream turns
//! stanzas into these values before they reach the dispatcher.

use serde::{Deserialize, Serialize};

use crate::{contact::PresenceStatus, directory::RosterEntry};

/// The classes of event the dispatcher subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  Roster,
  Presence,
  Message,
}

impl EventKind {
  pub const ALL: [Self; 3] = [Self::Roster, Self::Presence, Self::Message];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
  /// Possibly resource-qualified.
  pub jid:         String,
  pub status:      PresenceStatus,
  #[serde(default)]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
  /// Possibly resource-qualified.
  pub jid:  String,
  pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
  RosterPush { entries: Vec<RosterEntry> },
  PresenceUpdate(PresenceUpdate),
  IncomingMessage(IncomingMessage),
  /// Any sub-kind this build does not understand.
  #[serde(other)]
  Unsupported,
}

impl InboundEvent {
  /// The subscription that must be active for this event to be handled.
  pub fn kind(&self) -> Option<EventKind> {
    match self {
      Self::RosterPush { .. } => Some(EventKind::Roster),
      Self::PresenceUpdate(_) => Some(EventKind::Presence),
      Self::IncomingMessage(_) => Some(EventKind::Message),
      Self::Unsupported => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::contact::Subscription;

  #[test]
  fn parses_roster_push() {
    let raw = r#"{"type":"roster_push","entries":[
      {"jid":"a@x.com","name":"Alice","subscription":"both"},
      {"jid":"b@x.com"}
    ]}"#;
    let InboundEvent::RosterPush { entries } =
      serde_json::from_str::<InboundEvent>(raw).unwrap()
    else {
      panic!("expected roster push");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].subscription, Subscription::Both);
    assert_eq!(entries[1].name, None);
    assert_eq!(entries[1].subscription, Subscription::None);
  }

  #[test]
  fn parses_presence_and_message() {
    let presence: InboundEvent = serde_json::from_str(
      r#"{"type":"presence_update","jid":"a@x.com/phone","status":"xa"}"#,
    )
    .unwrap();
    assert_eq!(presence.kind(), Some(EventKind::Presence));

    let message: InboundEvent = serde_json::from_str(
      r#"{"type":"incoming_message","jid":"a@x.com/phone","body":"hi"}"#,
    )
    .unwrap();
    assert_eq!(
      message,
      InboundEvent::IncomingMessage(IncomingMessage {
        jid:  "a@x.com/phone".into(),
        body: "hi".into(),
      })
    );
  }

  #[test]
  fn unknown_type_is_unsupported() {
    let event: InboundEvent =
      serde_json::from_str(r#"{"type":"vcard_update","jid":"a@x.com"}"#)
        .unwrap();
    assert_eq!(event, InboundEvent::Unsupported);
    assert_eq!(event.kind(), None);
  }
}
