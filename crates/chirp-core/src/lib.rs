//! Contact directory and chat-session state for an XMPP-style client.
//!
//! This crate holds no sockets, widgets or runtime. Inbound protocol events go
//! into a [`dispatch::Dispatcher`], which keeps the [`directory::Directory`] in
//! sync and reports every visible change to a [`presenter::Presenter`].
//! Outbound messages leave through a [`transport::Transport`].

pub mod contact;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod jid;
pub mod presenter;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
