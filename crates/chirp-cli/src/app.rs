//! Command queue and the loop that owns the dispatcher.
//!
//! Inbound events and user input arrive from different tasks. They all go
//! through one [`mpsc`] queue so the dispatcher only ever sees one command at
//! a time.

use std::io::Write;

use anyhow::{Result, bail};
use chirp_core::{
  contact::PresenceStatus,
  dispatch::Dispatcher,
  event::InboundEvent,
  presenter::ViewHandle,
  session::OpenOutcome,
  transport::Transport,
};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{network::ChannelTransport, terminal::TerminalPresenter};

// ─── Command ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// An event from the transport.
  Inbound(InboundEvent),
  Open(String),
  Close(String),
  Send { jid: String, body: String },
  /// List visible contacts, optionally fuzzy-filtered.
  List(Option<String>),
  Help,
  Quit,
}

impl Command {
  /// Parse one line of user input.
  pub fn parse(line: &str) -> Result<Self> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
      bail!("commands start with '/'; try /help");
    };
    let (verb, args) = match rest.split_once(char::is_whitespace) {
      Some((verb, args)) => (verb, args.trim()),
      None => (rest, ""),
    };

    match verb {
      "open" | "o" if !args.is_empty() => Ok(Self::Open(args.to_owned())),
      "close" | "c" if !args.is_empty() => Ok(Self::Close(args.to_owned())),
      "msg" | "m" => match args.split_once(char::is_whitespace) {
        Some((jid, body)) if !body.trim().is_empty() => Ok(Self::Send {
          jid:  jid.to_owned(),
          body: body.trim().to_owned(),
        }),
        _ => bail!("usage: /msg <jid> <text>"),
      },
      "list" | "l" => {
        Ok(Self::List((!args.is_empty()).then(|| args.to_owned())))
      }
      "help" | "h" | "?" => Ok(Self::Help),
      "quit" | "q" => Ok(Self::Quit),
      "open" | "o" | "close" | "c" => bail!("usage: /{verb} <jid>"),
      _ => bail!("unknown command /{verb}; try /help"),
    }
  }
}

pub const HELP: &str = "\
/open <jid>        open a chat (or bring it to the front)
/close <jid>       close a chat
/msg <jid> <text>  send a message
/list [filter]     list contacts
/help              show this text
/quit              tear down and exit";

// ─── App ──────────────────────────────────────────────────────────────────────

pub type ChatDispatcher<W> = Dispatcher<TerminalPresenter<W>, ChannelTransport>;

pub struct App<W: Write> {
  dispatcher: ChatDispatcher<W>,
}

impl<W: Write> App<W> {
  pub fn new(dispatcher: ChatDispatcher<W>) -> Self { Self { dispatcher } }

  #[cfg(test)]
  pub fn dispatcher(&self) -> &ChatDispatcher<W> { &self.dispatcher }

  /// Announce our own presence. Called once, right after login.
  pub fn announce_presence(
    &mut self,
    status: &PresenceStatus,
    description: Option<&str>,
  ) -> Result<()> {
    self
      .dispatcher
      .transport_mut()
      .set_presence(status, description)?;
    Ok(())
  }

  /// Drain `queue` until `/quit` or until every producer hangs up, then
  /// tear down.
  pub async fn run(&mut self, mut queue: mpsc::Receiver<Command>) {
    while let Some(command) = queue.recv().await {
      if !self.handle(command) {
        break;
      }
    }
    queue.close();
    self.dispatcher.teardown();
    info!(
      live_views = self.dispatcher.presenter().live_views(),
      "session torn down"
    );
  }

  /// Apply one command. Returns `false` when the loop should stop.
  pub fn handle(&mut self, command: Command) -> bool {
    debug!(?command, "handling command");
    let result = match command {
      Command::Inbound(event) => {
        self.dispatcher.dispatch(event);
        Ok(())
      }
      Command::Open(jid) => self.dispatcher.open_chat(&jid).map(|outcome| {
        if outcome == OpenOutcome::Raised {
          debug!(%jid, "chat already open");
        }
      }),
      Command::Close(jid) => self.close(&jid),
      Command::Send { jid, body } => self.dispatcher.send(&jid, &body),
      Command::List(filter) => {
        let lines = self.list(filter.as_deref());
        let presenter = self.dispatcher.presenter_mut();
        for line in lines {
          presenter.line(&line);
        }
        Ok(())
      }
      Command::Help => {
        let presenter = self.dispatcher.presenter_mut();
        for line in HELP.lines() {
          presenter.line(line);
        }
        Ok(())
      }
      Command::Quit => return false,
    };

    if let Err(e) = result {
      warn!(error = %e, "command failed");
      self.dispatcher.presenter_mut().line(&format!("! {e}"));
    }
    true
  }

  /// Close the session and delete its view, like a window being destroyed.
  fn close(&mut self, jid: &str) -> chirp_core::Result<()> {
    let view_id = self
      .dispatcher
      .directory()
      .session(jid_key(jid))
      .and_then(|s| s.view())
      .and_then(ViewHandle::get)
      .map(|v| v.id);

    self.dispatcher.close_chat(jid)?;
    if let Some(id) = view_id {
      self.dispatcher.presenter_mut().drop_view(id);
    }
    Ok(())
  }

  /// Visible contacts as display lines, fuzzy-matched on label and JID.
  pub fn list(&self, filter: Option<&str>) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    self
      .dispatcher
      .directory()
      .visible()
      .into_iter()
      .filter(|c| match filter {
        None => true,
        Some(q) => {
          matcher.fuzzy_match(c.label(), q).is_some()
            || matcher.fuzzy_match(c.bare_jid.as_str(), q).is_some()
        }
      })
      .map(|c| format!("  {} <{}> [{}]", c.label(), c.bare_jid, c.status_line()))
      .collect()
  }
}

/// Bare-JID lookup key for user-typed input; the dispatcher does the real
/// normalisation and error reporting.
fn jid_key(jid: &str) -> &str {
  jid.split_once('/').map_or(jid, |(bare, _)| bare)
}

#[cfg(test)]
mod tests {
  use chirp_core::{
    contact::Subscription,
    directory::RosterEntry,
    event::IncomingMessage,
    session::SessionState,
  };

  use super::*;
  use crate::network::Outbound;

  fn app() -> (App<Vec<u8>>, mpsc::UnboundedReceiver<Outbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(
      TerminalPresenter::new(Vec::new()),
      ChannelTransport::new(tx),
    );
    (App::new(dispatcher), rx)
  }

  fn roster() -> Command {
    let entry = |jid: &str, name: &str, subscription| RosterEntry {
      jid: jid.into(),
      name: Some(name.into()),
      subscription,
    };
    Command::Inbound(InboundEvent::RosterPush {
      entries: vec![
        entry("alice@x.com", "Alice", Subscription::Both),
        entry("bob@x.com", "Bob", Subscription::To),
        entry("zed@x.com", "Zed", Subscription::None),
      ],
    })
  }

  #[test]
  fn parses_commands() {
    assert_eq!(
      Command::parse("/open a@x.com").unwrap(),
      Command::Open("a@x.com".into())
    );
    assert_eq!(
      Command::parse("  /msg a@x.com  hello there ").unwrap(),
      Command::Send {
        jid:  "a@x.com".into(),
        body: "hello there".into(),
      }
    );
    assert_eq!(Command::parse("/list").unwrap(), Command::List(None));
    assert_eq!(
      Command::parse("/l ali").unwrap(),
      Command::List(Some("ali".into()))
    );
    assert_eq!(Command::parse("/?").unwrap(), Command::Help);
    assert_eq!(Command::parse("/q").unwrap(), Command::Quit);
  }

  #[test]
  fn rejects_bad_commands() {
    assert!(Command::parse("hello").is_err());
    assert!(Command::parse("/open").is_err());
    assert!(Command::parse("/msg a@x.com").is_err());
    assert!(Command::parse("/dance").is_err());
  }

  #[test]
  fn list_hides_unsubscribed_and_filters() {
    let (mut app, _rx) = app();
    app.handle(roster());

    assert_eq!(app.list(None).len(), 2);
    let filtered = app.list(Some("ali"));
    assert_eq!(filtered, vec!["  Alice <alice@x.com> [Offline?]"]);
  }

  #[test]
  fn send_goes_out_through_the_transport() {
    let (mut app, mut rx) = app();
    app.handle(roster());
    app.handle(Command::Open("alice@x.com".into()));
    app.handle(Command::Send {
      jid:  "alice@x.com".into(),
      body: "hi".into(),
    });

    let Ok(Outbound::Message { to, body }) = rx.try_recv() else {
      panic!("expected an outbound message");
    };
    assert_eq!(to.as_str(), "alice@x.com");
    assert_eq!(body, "hi");
  }

  #[test]
  fn close_deletes_the_chat_view() {
    let (mut app, _rx) = app();
    app.handle(roster());
    app.handle(Command::Inbound(InboundEvent::IncomingMessage(
      IncomingMessage {
        jid:  "alice@x.com/phone".into(),
        body: "hi".into(),
      },
    )));
    // Two list rows plus the chat window.
    assert_eq!(app.dispatcher().presenter().live_views(), 3);

    app.handle(Command::Close("alice@x.com".into()));
    assert_eq!(app.dispatcher().presenter().live_views(), 2);
    assert_eq!(
      app.dispatcher().directory().session("alice@x.com").unwrap().state(),
      SessionState::Closed
    );
  }

  #[test]
  fn failures_do_not_stop_the_loop() {
    let (mut app, _rx) = app();
    assert!(app.handle(Command::Open("ghost@x.com".into())));
    assert!(app.handle(Command::Send {
      jid:  "ghost@x.com".into(),
      body: "hi".into(),
    }));
    assert!(!app.handle(Command::Quit));
  }

  #[tokio::test]
  async fn run_tears_down_when_producers_hang_up() {
    let (mut app, _rx) = app();
    let (tx, rx) = mpsc::channel(8);
    tx.send(roster()).await.unwrap();
    drop(tx);

    app.run(rx).await;
    assert!(app.dispatcher().directory().is_empty());
    assert_eq!(app.dispatcher().presenter().live_views(), 0);
  }
}
