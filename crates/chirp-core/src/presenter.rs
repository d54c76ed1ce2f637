//! The observer seam between the core and whatever renders it.
//!
//! The presentation layer owns its views. The core only ever holds a
//! [`ViewHandle`], a weak reference that goes dead as soon as the
//! presentation layer drops the corresponding [`View`] or explicitly detaches
//! it. Notifications flow one way: the core calls [`Presenter`] methods, and
//! the presentation layer never mutates core state except through the
//! dispatcher's user actions.

use std::sync::{Arc, Weak};

use uuid::Uuid;

use crate::{contact::Contact, jid::BareJid, transport::TransportError};

// ─── Views ───────────────────────────────────────────────────────────────────

/// What kind of widget a view stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
  /// A row in the contact list.
  ListItem,
  /// A chat window for one contact.
  Chat,
}

/// Identity token for a presentation-side widget.
#[derive(Debug, PartialEq, Eq)]
pub struct View {
  pub id:   Uuid,
  pub kind: ViewKind,
}

impl View {
  pub fn new(kind: ViewKind) -> Arc<Self> {
    Arc::new(Self { id: Uuid::new_v4(), kind })
  }
}

/// Non-owning reference from a core record to its view.
#[derive(Debug, Clone)]
pub struct ViewHandle(Weak<View>);

impl ViewHandle {
  pub fn bind(view: &Arc<View>) -> Self { Self(Arc::downgrade(view)) }

  /// The view, if the presentation layer still holds it.
  pub fn get(&self) -> Option<Arc<View>> { self.0.upgrade() }

  pub fn is_live(&self) -> bool { self.0.strong_count() > 0 }
}

// ─── Presenter ───────────────────────────────────────────────────────────────

/// Receives every change the core makes that a user could see.
///
/// Methods returning `Arc<View>` hand ownership of the new view to the
/// implementor, which must keep it alive for as long as the widget exists.
pub trait Presenter {
  /// A contact with a subscription above `none` entered the directory.
  fn contact_added(&mut self, contact: &Contact) -> Arc<View>;

  /// Presence changed for a contact with a live view (list row or chat
  /// window status line).
  fn contact_presence_changed(&mut self, view: &View, contact: &Contact);

  /// A chat window must be created for `contact`.
  fn session_opened(&mut self, contact: &Contact) -> Arc<View>;

  /// An already-open chat window should be brought to the front.
  fn session_raised(&mut self, view: &View);

  /// A formatted log entry was appended to a session with a live view.
  fn message_appended(&mut self, view: &View, entry: &str);

  /// The transport refused an outbound message; nothing was echoed locally.
  fn send_failed(&mut self, to: &BareJid, error: &TransportError);

  /// The directory is tearing down and this listed contact is going away.
  fn contact_removed(&mut self, view: &View, contact: &Contact);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn handle_dies_with_view() {
    let view = View::new(ViewKind::Chat);
    let handle = ViewHandle::bind(&view);
    assert!(handle.is_live());
    assert_eq!(handle.get().map(|v| v.id), Some(view.id));

    drop(view);
    assert!(!handle.is_live());
    assert!(handle.get().is_none());
  }
}
