//! Line-oriented presenter: every notification becomes one line of output.

use std::{
  collections::HashMap,
  io::Write,
  sync::Arc,
};

use chirp_core::{
  contact::Contact,
  jid::BareJid,
  presenter::{Presenter, View, ViewKind},
  transport::TransportError,
};
use quick_xml::escape::unescape;
use tracing::warn;
use uuid::Uuid;

/// Owns the views it hands out; dropping a view here is the terminal's
/// equivalent of a widget being deleted.
pub struct TerminalPresenter<W: Write> {
  out:   W,
  /// Live views with the contact label they were created for.
  views: HashMap<Uuid, (Arc<View>, String)>,
}

impl<W: Write> TerminalPresenter<W> {
  pub fn new(out: W) -> Self {
    Self {
      out,
      views: HashMap::new(),
    }
  }

  /// Delete a view, e.g. after the user closed a chat.
  pub fn drop_view(&mut self, id: Uuid) { self.views.remove(&id); }

  pub fn live_views(&self) -> usize { self.views.len() }

  /// Write one line, or log if the terminal is gone.
  pub fn line(&mut self, text: &str) {
    if let Err(e) = writeln!(self.out, "{text}") {
      warn!(error = %e, "failed to write to terminal");
    }
  }

  fn keep(&mut self, kind: ViewKind, label: &str) -> Arc<View> {
    let view = View::new(kind);
    self.views.insert(view.id, (view.clone(), label.to_owned()));
    view
  }

  fn label_of(&self, view: &View) -> &str {
    self
      .views
      .get(&view.id)
      .map(|(_, label)| label.as_str())
      .unwrap_or("?")
  }

  #[cfg(test)]
  pub fn into_inner(self) -> W { self.out }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
  fn contact_added(&mut self, contact: &Contact) -> Arc<View> {
    self.line(&format!(
      "+ {} <{}> [{}]",
      contact.label(),
      contact.bare_jid,
      contact.status_line()
    ));
    self.keep(ViewKind::ListItem, contact.label())
  }

  fn contact_presence_changed(&mut self, view: &View, contact: &Contact) {
    let text = match view.kind {
      ViewKind::ListItem => {
        format!("~ {} [{}]", contact.label(), contact.status_line())
      }
      ViewKind::Chat => {
        format!("[{}] status: {}", contact.label(), contact.status_line())
      }
    };
    self.line(&text);
  }

  fn session_opened(&mut self, contact: &Contact) -> Arc<View> {
    self.line(&format!("== chat with {} ==", contact.label()));
    self.keep(ViewKind::Chat, contact.label())
  }

  fn session_raised(&mut self, view: &View) {
    let text = format!("== chat with {} (raised) ==", self.label_of(view));
    self.line(&text);
  }

  fn message_appended(&mut self, view: &View, entry: &str) {
    // Entries are markup-escaped; a terminal shows them as literal text.
    let literal = unescape(entry)
      .map(|s| s.into_owned())
      .unwrap_or_else(|_| entry.to_owned());
    let text = format!("[{}] {literal}", self.label_of(view));
    self.line(&text);
  }

  fn send_failed(&mut self, to: &BareJid, error: &TransportError) {
    self.line(&format!("! could not send to {to}: {error}"));
  }

  fn contact_removed(&mut self, view: &View, contact: &Contact) {
    self.line(&format!("- {}", contact.label()));
    self.views.remove(&view.id);
  }
}

#[cfg(test)]
mod tests {
  use chirp_core::{contact::Subscription, jid::normalize};

  use super::*;

  fn output(p: TerminalPresenter<Vec<u8>>) -> String {
    String::from_utf8(p.into_inner()).unwrap()
  }

  fn alice() -> Contact {
    Contact::new(
      normalize("a@x.com").unwrap(),
      Some("Alice".into()),
      Subscription::Both,
    )
  }

  #[test]
  fn renders_contact_and_chat_lines() {
    let mut p = TerminalPresenter::new(Vec::new());
    let contact = alice();
    let _row = p.contact_added(&contact);
    let chat = p.session_opened(&contact);
    p.message_appended(&chat, "[10:00:00] Alice: 1 &lt; 2");
    p.session_raised(&chat);

    assert_eq!(
      output(p),
      "+ Alice <a@x.com> [Offline?]\n\
       == chat with Alice ==\n\
       [Alice] [10:00:00] Alice: 1 < 2\n\
       == chat with Alice (raised) ==\n"
    );
  }

  #[test]
  fn removal_drops_the_view() {
    let mut p = TerminalPresenter::new(Vec::new());
    let contact = alice();
    let row = p.contact_added(&contact);
    assert_eq!(p.live_views(), 1);

    p.contact_removed(&row, &contact);
    assert_eq!(p.live_views(), 0);
  }
}
