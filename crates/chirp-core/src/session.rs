//! Per-contact chat sessions.
//!
//! A session is a small state machine with an append-only log:
//!
//! ```text
//! Unopened ──open / incoming──▶ Open ──close──▶ Closed
//!                                 ▲                │
//!                                 └─open / incoming┘
//! ```
//!
//! It never builds widgets itself; it asks the [`Presenter`] for a view and
//! keeps only a weak handle to it.

use std::fmt;

use chrono::{DateTime, Local};
use quick_xml::escape::escape;
use tracing::debug;

use crate::{
  Error, Result,
  contact::Contact,
  jid::BareJid,
  presenter::{Presenter, ViewHandle},
  transport::Transport,
};

/// Sender label used for messages we sent ourselves.
pub const SELF_LABEL: &str = "me";

// ─── Message ─────────────────────────────────────────────────────────────────

/// One line of a chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub timestamp:    DateTime<Local>,
  pub sender_label: String,
  /// Markup-escaped body. Escaped exactly once, on construction.
  pub body:         String,
}

impl Message {
  /// Build a message from raw, unescaped text.
  pub fn new(
    timestamp: DateTime<Local>,
    sender_label: impl Into<String>,
    raw_body: &str,
  ) -> Self {
    Self {
      timestamp,
      sender_label: sender_label.into(),
      body: escape(raw_body).into_owned(),
    }
  }

  /// `[HH:MM:SS] sender: body`, ready to embed in a markup buffer.
  pub fn render(&self) -> String { self.to_string() }
}

impl fmt::Display for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}] {}: {}",
      self.timestamp.format("%H:%M:%S"),
      self.sender_label,
      self.body
    )
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Unopened,
  Open,
  Closed,
}

/// How [`ChatSession::open`] satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
  /// A new view was created.
  Opened,
  /// The session was already open; its view was raised.
  Raised,
  /// The session was already open and was left where it is.
  Reused,
}

#[derive(Debug)]
pub struct ChatSession {
  contact: BareJid,
  state:   SessionState,
  log:     Vec<Message>,
  view:    Option<ViewHandle>,
}

impl ChatSession {
  pub fn new(contact: BareJid) -> Self {
    Self {
      contact,
      state: SessionState::Unopened,
      log: Vec::new(),
      view: None,
    }
  }

  pub fn contact(&self) -> &BareJid { &self.contact }

  pub fn state(&self) -> SessionState { self.state }

  pub fn log(&self) -> &[Message] { &self.log }

  /// The chat view, if one is bound and still alive.
  pub fn view(&self) -> Option<&ViewHandle> {
    self.view.as_ref().filter(|h| h.is_live())
  }

  /// Open the session, or raise it if it is already open.
  ///
  /// Reopening a closed session replays the retained log into the new view.
  pub fn open(
    &mut self,
    contact: &Contact,
    presenter: &mut dyn Presenter,
  ) -> OpenOutcome {
    self.open_with(contact, presenter, true)
  }

  /// Open the session if it is not already open, without raising a live
  /// view. Used when a message arrives.
  pub fn ensure_open(
    &mut self,
    contact: &Contact,
    presenter: &mut dyn Presenter,
  ) -> OpenOutcome {
    self.open_with(contact, presenter, false)
  }

  fn open_with(
    &mut self,
    contact: &Contact,
    presenter: &mut dyn Presenter,
    raise: bool,
  ) -> OpenOutcome {
    debug_assert_eq!(contact.bare_jid, self.contact);
    self.reap_dead_view();

    if self.state == SessionState::Open
      && let Some(view) = self.view().and_then(ViewHandle::get)
    {
      if !raise {
        return OpenOutcome::Reused;
      }
      presenter.session_raised(&view);
      return OpenOutcome::Raised;
    }

    let view = presenter.session_opened(contact);
    for message in &self.log {
      presenter.message_appended(&view, &message.render());
    }
    debug!(jid = %self.contact, from = ?self.state, "chat session opened");
    self.view = Some(ViewHandle::bind(&view));
    self.state = SessionState::Open;
    OpenOutcome::Opened
  }

  /// Append a message built from raw text and push it to the view.
  pub fn append_message(
    &mut self,
    sender_label: &str,
    body: &str,
    timestamp: DateTime<Local>,
    presenter: &mut dyn Presenter,
  ) -> &Message {
    self.reap_dead_view();
    let message = Message::new(timestamp, sender_label, body);
    if let Some(view) = self.view().and_then(ViewHandle::get) {
      presenter.message_appended(&view, &message.render());
    }
    self.log.push(message);
    &self.log[self.log.len() - 1]
  }

  /// Hand `body` to the transport and echo it locally on success.
  ///
  /// A failed hand-off is reported to the presenter and nothing is logged.
  pub fn send(
    &mut self,
    body: &str,
    timestamp: DateTime<Local>,
    transport: &mut dyn Transport,
    presenter: &mut dyn Presenter,
  ) -> Result<()> {
    if self.state != SessionState::Open {
      return Err(Error::SessionNotOpen(self.contact.clone()));
    }
    if let Err(e) = transport.send(&self.contact, body) {
      presenter.send_failed(&self.contact, &e);
      return Err(e.into());
    }
    self.append_message(SELF_LABEL, body, timestamp, presenter);
    Ok(())
  }

  /// Close the session at the presentation layer's request. The log is kept.
  pub fn close(&mut self) -> Result<()> {
    if self.state != SessionState::Open {
      return Err(Error::SessionNotOpen(self.contact.clone()));
    }
    self.detach();
    self.state = SessionState::Closed;
    debug!(jid = %self.contact, "chat session closed");
    Ok(())
  }

  /// Drop the view handle without changing state.
  pub(crate) fn detach(&mut self) { self.view = None; }

  /// An open session whose view was deleted without `close` is closed.
  fn reap_dead_view(&mut self) {
    if self.state == SessionState::Open && self.view().is_none() {
      debug!(jid = %self.contact, "chat view gone; session closed");
      self.detach();
      self.state = SessionState::Closed;
    }
  }
}
