//! Routes inbound events and user actions into the directory.
//!
//! The dispatcher owns the [`Directory`], the [`Presenter`] and the
//! [`Transport`] for one login session. Every mutation goes through
//! `&mut self`, so each event runs to completion before the next one is
//! looked at.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::{
  Result,
  directory::{Directory, RosterEntry},
  event::{EventKind, InboundEvent, IncomingMessage, PresenceUpdate},
  jid::normalize,
  presenter::Presenter,
  session::OpenOutcome,
  transport::Transport,
};

pub struct Dispatcher<P, T> {
  directory:  Directory,
  presenter:  P,
  transport:  T,
  subscribed: HashSet<EventKind>,
}

impl<P: Presenter, T: Transport> Dispatcher<P, T> {
  /// Create an empty directory and subscribe to every event kind.
  pub fn new(presenter: P, transport: T) -> Self {
    info!("subscribing to roster, presence and message events");
    Self {
      directory: Directory::new(),
      presenter,
      transport,
      subscribed: EventKind::ALL.into_iter().collect(),
    }
  }

  pub fn directory(&self) -> &Directory { &self.directory }

  pub fn presenter(&self) -> &P { &self.presenter }

  pub fn presenter_mut(&mut self) -> &mut P { &mut self.presenter }

  pub fn transport(&self) -> &T { &self.transport }

  pub fn transport_mut(&mut self) -> &mut T { &mut self.transport }

  pub fn is_subscribed(&self, kind: EventKind) -> bool {
    self.subscribed.contains(&kind)
  }

  // ── Inbound ───────────────────────────────────────────────────────────────

  /// Handle one inbound event, stamping messages with the current time.
  pub fn dispatch(&mut self, event: InboundEvent) {
    self.dispatch_at(event, Local::now());
  }

  /// Handle one inbound event received at `now`.
  ///
  /// Nothing here fails: malformed input is logged and dropped, and events
  /// for unknown contacts are ignored.
  pub fn dispatch_at(&mut self, event: InboundEvent, now: DateTime<Local>) {
    let Some(kind) = event.kind() else {
      debug!(?event, "ignoring unsupported event");
      return;
    };
    if !self.is_subscribed(kind) {
      debug!(?kind, "event arrived after unsubscribe; dropped");
      return;
    }

    match event {
      InboundEvent::RosterPush { entries } => self.on_roster(&entries),
      InboundEvent::PresenceUpdate(update) => self.on_presence(update),
      InboundEvent::IncomingMessage(message) => self.on_message(message, now),
      InboundEvent::Unsupported => {}
    }
  }

  fn on_roster(&mut self, entries: &[RosterEntry]) {
    let inserted =
      self.directory.upsert_from_roster(entries, &mut self.presenter);
    info!(received = entries.len(), inserted, "roster push applied");
  }

  fn on_presence(&mut self, update: PresenceUpdate) {
    if let Err(e) = self.directory.apply_presence(
      &update.jid,
      update.status,
      update.description,
      &mut self.presenter,
    ) {
      warn!(jid = ?update.jid, error = %e, "dropping presence update");
    }
  }

  fn on_message(&mut self, message: IncomingMessage, now: DateTime<Local>) {
    let jid = match normalize(&message.jid) {
      Ok(jid) => jid,
      Err(e) => {
        warn!(jid = ?message.jid, error = %e, "dropping incoming message");
        return;
      }
    };
    let Some(contact) = self.directory.find(jid.as_str()) else {
      debug!(%jid, "message from unknown contact dropped");
      return;
    };
    let sender = contact.label().to_owned();

    match self.directory.session_for_incoming(&jid, &mut self.presenter) {
      Ok((session, _)) => {
        session.append_message(
          &sender,
          &message.body,
          now,
          &mut self.presenter,
        );
      }
      Err(e) => warn!(%jid, error = %e, "dropping incoming message"),
    }
  }

  // ── User actions ──────────────────────────────────────────────────────────

  /// Open the chat with `jid`, or bring it to the front if already open.
  pub fn open_chat(&mut self, jid: &str) -> Result<OpenOutcome> {
    let jid = normalize(jid)?;
    let (_, outcome) = self.directory.open_session(&jid, &mut self.presenter)?;
    Ok(outcome)
  }

  /// Send `body` to `jid` through an open session.
  pub fn send(&mut self, jid: &str, body: &str) -> Result<()> {
    self.send_at(jid, body, Local::now())
  }

  pub fn send_at(
    &mut self,
    jid: &str,
    body: &str,
    now: DateTime<Local>,
  ) -> Result<()> {
    let jid = normalize(jid)?;
    let session = self.directory.session_mut(&jid)?;
    session.send(body, now, &mut self.transport, &mut self.presenter)
  }

  /// The chat window for `jid` was closed by the user.
  pub fn close_chat(&mut self, jid: &str) -> Result<()> {
    let jid = normalize(jid)?;
    self.directory.session_mut(&jid)?.close()
  }

  /// The list row for `jid` was deleted by the presentation layer.
  pub fn detach_contact(&mut self, jid: &str) -> Result<()> {
    let jid = normalize(jid)?;
    self.directory.detach_contact(&jid)
  }

  // ── Teardown ──────────────────────────────────────────────────────────────

  /// Unsubscribe from every event kind, then release directory state.
  ///
  /// Idempotent. Events dispatched afterwards are dropped.
  pub fn teardown(&mut self) {
    if self.subscribed.is_empty() {
      return;
    }
    self.subscribed.clear();
    info!(contacts = self.directory.len(), "unsubscribed; releasing directory");
    self.directory.remove_all(&mut self.presenter);
  }
}
