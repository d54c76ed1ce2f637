//! The contact directory: every roster entry for one login session, keyed by
//! bare JID, plus the chat sessions hanging off those entries.
//!
//! The roster is additive. The first entry seen for a bare JID wins and later
//! duplicates are ignored, so a second roster push can only add contacts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  contact::{Contact, PresenceStatus, Subscription},
  jid::{BareJid, normalize},
  presenter::{Presenter, ViewHandle},
  session::{ChatSession, OpenOutcome},
};

/// One item of a roster push, exactly as the transport delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
  pub jid:          String,
  #[serde(default)]
  pub name:         Option<String>,
  #[serde(default)]
  pub subscription: Subscription,
}

#[derive(Debug, Default)]
pub struct Directory {
  contacts: HashMap<BareJid, Contact>,
  sessions: HashMap<BareJid, ChatSession>,
}

impl Directory {
  pub fn new() -> Self { Self::default() }

  // ── Roster ────────────────────────────────────────────────────────────────

  /// Insert every entry whose bare JID is not already known.
  ///
  /// Listed entries (subscription above `none`) are announced to the
  /// presenter. Returns how many contacts were inserted.
  pub fn upsert_from_roster(
    &mut self,
    entries: &[RosterEntry],
    presenter: &mut dyn Presenter,
  ) -> usize {
    let mut inserted = 0;
    for entry in entries {
      let jid = match normalize(&entry.jid) {
        Ok(jid) => jid,
        Err(e) => {
          warn!(jid = ?entry.jid, error = %e, "skipping roster entry");
          continue;
        }
      };
      if self.contacts.contains_key(&jid) {
        debug!(%jid, "duplicate roster entry ignored");
        continue;
      }

      let mut contact =
        Contact::new(jid.clone(), entry.name.clone(), entry.subscription);
      if contact.is_listed() {
        let view = presenter.contact_added(&contact);
        contact.list_view = Some(ViewHandle::bind(&view));
      }
      self.contacts.insert(jid, contact);
      inserted += 1;
    }
    inserted
  }

  // ── Lookup ────────────────────────────────────────────────────────────────

  pub fn find(&self, jid: &str) -> Option<&Contact> { self.contacts.get(jid) }

  pub fn len(&self) -> usize { self.contacts.len() }

  pub fn is_empty(&self) -> bool { self.contacts.is_empty() }

  /// Contacts shown in the contact list, sorted by label.
  pub fn visible(&self) -> Vec<&Contact> {
    let mut listed: Vec<_> =
      self.contacts.values().filter(|c| c.is_listed()).collect();
    listed.sort_by(|a, b| a.label().cmp(b.label()));
    listed
  }

  pub fn session(&self, jid: &str) -> Option<&ChatSession> {
    self.sessions.get(jid)
  }

  // ── Presence ──────────────────────────────────────────────────────────────

  /// Record a presence update for `jid`, which may carry a resource.
  ///
  /// Unknown contacts are ignored; returns whether a contact was updated.
  pub fn apply_presence(
    &mut self,
    jid: &str,
    status: PresenceStatus,
    description: Option<String>,
    presenter: &mut dyn Presenter,
  ) -> Result<bool> {
    let jid = normalize(jid)?;
    let Some(contact) = self.contacts.get_mut(&jid) else {
      debug!(%jid, "presence for unknown contact dropped");
      return Ok(false);
    };

    contact.presence_status = status;
    contact.status_description = description;

    if let Some(view) = contact.list_view().and_then(ViewHandle::get) {
      presenter.contact_presence_changed(&view, contact);
    }
    if let Some(view) = self
      .sessions
      .get(&jid)
      .and_then(ChatSession::view)
      .and_then(ViewHandle::get)
    {
      presenter.contact_presence_changed(&view, contact);
    }
    Ok(true)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  /// Open (or raise) the chat session for a known contact, creating it on
  /// first use.
  pub fn open_session(
    &mut self,
    jid: &BareJid,
    presenter: &mut dyn Presenter,
  ) -> Result<(&mut ChatSession, OpenOutcome)> {
    self.with_session(jid, |session, contact| session.open(contact, presenter))
  }

  /// Session for a message that just arrived: opened if needed, an already
  /// open view is left in place.
  pub fn session_for_incoming(
    &mut self,
    jid: &BareJid,
    presenter: &mut dyn Presenter,
  ) -> Result<(&mut ChatSession, OpenOutcome)> {
    self.with_session(jid, |session, contact| {
      session.ensure_open(contact, presenter)
    })
  }

  fn with_session(
    &mut self,
    jid: &BareJid,
    open: impl FnOnce(&mut ChatSession, &Contact) -> OpenOutcome,
  ) -> Result<(&mut ChatSession, OpenOutcome)> {
    let contact = self
      .contacts
      .get(jid)
      .ok_or_else(|| Error::UnknownContact(jid.clone()))?;
    let session = self
      .sessions
      .entry(jid.clone())
      .or_insert_with(|| ChatSession::new(jid.clone()));
    let outcome = open(session, contact);
    Ok((session, outcome))
  }

  pub fn session_mut(&mut self, jid: &BareJid) -> Result<&mut ChatSession> {
    self
      .sessions
      .get_mut(jid)
      .ok_or_else(|| Error::SessionNotOpen(jid.clone()))
  }

  /// Forget a contact's list row after the presentation layer deleted it.
  pub fn detach_contact(&mut self, jid: &BareJid) -> Result<()> {
    self
      .contacts
      .get_mut(jid)
      .ok_or_else(|| Error::UnknownContact(jid.clone()))?
      .detach();
    Ok(())
  }

  // ── Teardown ──────────────────────────────────────────────────────────────

  /// Detach every session's view, then release every contact.
  pub fn remove_all(&mut self, presenter: &mut dyn Presenter) {
    for session in self.sessions.values_mut() {
      session.detach();
    }
    self.sessions.clear();

    for (_, mut contact) in self.contacts.drain() {
      if let Some(view) = contact.list_view().and_then(ViewHandle::get) {
        presenter.contact_removed(&view, &contact);
      }
      contact.detach();
    }
  }
}
