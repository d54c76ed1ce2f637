//! Contact records and the enumerations they carry.

use serde::{Deserialize, Serialize};

use crate::{jid::BareJid, presenter::ViewHandle};

// ─── Subscription ────────────────────────────────────────────────────────────

/// How far presence sharing goes between us and a roster entry.
///
/// Ordered: everything above [`Subscription::None`] is listed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
  #[default]
  None,
  /// They see our presence.
  From,
  /// We see theirs.
  To,
  Both,
}

impl Subscription {
  pub fn is_listed(self) -> bool { self > Self::None }
}

// ─── Presence ────────────────────────────────────────────────────────────────

/// Availability as reported by a presence update.
///
/// Values the transport sends that we don't recognise are kept verbatim in
/// [`PresenceStatus::Unknown`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PresenceStatus {
  #[default]
  None,
  Normal,
  Away,
  Chat,
  Dnd,
  Xa,
  Unknown(String),
}

impl PresenceStatus {
  /// Label shown next to a contact. Total over every status.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Normal => "Normal",
      Self::Away => "Away",
      Self::Chat => "Chat",
      Self::Dnd => "Busy",
      Self::Xa => "Very Away",
      Self::None | Self::Unknown(_) => "Offline?",
    }
  }

  fn wire_name(&self) -> &str {
    match self {
      Self::None => "none",
      Self::Normal => "normal",
      Self::Away => "away",
      Self::Chat => "chat",
      Self::Dnd => "dnd",
      Self::Xa => "xa",
      Self::Unknown(raw) => raw,
    }
  }
}

impl From<&str> for PresenceStatus {
  fn from(raw: &str) -> Self {
    match raw.to_ascii_lowercase().as_str() {
      "none" | "unavailable" | "offline" => Self::None,
      "normal" | "available" => Self::Normal,
      "away" => Self::Away,
      "chat" => Self::Chat,
      "dnd" => Self::Dnd,
      "xa" => Self::Xa,
      _ => Self::Unknown(raw.to_owned()),
    }
  }
}

impl From<String> for PresenceStatus {
  fn from(raw: String) -> Self { Self::from(raw.as_str()) }
}

impl From<PresenceStatus> for String {
  fn from(status: PresenceStatus) -> Self { status.wire_name().to_owned() }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// One roster entry, as held by the directory.
///
/// Every field is an owned copy; nothing borrows from the event that created
/// the record.
#[derive(Debug, Clone)]
pub struct Contact {
  pub bare_jid:           BareJid,
  pub display_name:       Option<String>,
  pub subscription:       Subscription,
  pub presence_status:    PresenceStatus,
  pub status_description: Option<String>,
  pub(crate) list_view:   Option<ViewHandle>,
}

impl Contact {
  pub fn new(
    bare_jid: BareJid,
    display_name: Option<String>,
    subscription: Subscription,
  ) -> Self {
    Self {
      bare_jid,
      display_name,
      subscription,
      presence_status: PresenceStatus::None,
      status_description: None,
      list_view: None,
    }
  }

  /// Display name, falling back to the bare JID.
  pub fn label(&self) -> &str {
    self
      .display_name
      .as_deref()
      .unwrap_or_else(|| self.bare_jid.as_str())
  }

  /// Status label, with the free-text description appended when present.
  pub fn status_line(&self) -> String {
    let label = self.presence_status.label();
    match &self.status_description {
      Some(desc) => format!("{label}: {desc}"),
      None => label.to_owned(),
    }
  }

  /// Whether the contact appears in the contact list.
  pub fn is_listed(&self) -> bool { self.subscription.is_listed() }

  /// The list row's handle, if the presentation layer still holds it.
  pub fn list_view(&self) -> Option<&ViewHandle> {
    self.list_view.as_ref().filter(|h| h.is_live())
  }

  /// Forget the list row. Called when the presentation layer deletes it.
  pub fn detach(&mut self) { self.list_view = None; }
}
