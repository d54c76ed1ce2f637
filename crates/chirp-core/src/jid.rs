//! Bare JIDs — the directory key.
//!
//! A full JID looks like `user@domain/resource`. Everything in the directory
//! is keyed by the bare form, so a presence or message from any of a
//! contact's resources lands on the same record.

use std::{borrow::Borrow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A JID with its resource suffix removed.
///
/// Only [`normalize`] constructs one, so a `BareJid` never contains `/` and
/// is never empty.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct BareJid(String);

impl BareJid {
  pub fn as_str(&self) -> &str { &self.0 }
}

/// Strip the resource suffix from `jid`.
///
/// Truncates at the first `/`; input without one is returned unchanged.
/// Idempotent: normalising a bare JID yields the same bare JID.
pub fn normalize(jid: &str) -> Result<BareJid> {
  let bare = match jid.find('/') {
    Some(idx) => &jid[..idx],
    None => jid,
  };
  if bare.is_empty() {
    return Err(Error::InvalidInput(format!("cannot normalise JID {jid:?}")));
  }
  Ok(BareJid(bare.to_owned()))
}

impl fmt::Display for BareJid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for BareJid {
  fn as_ref(&self) -> &str { &self.0 }
}

impl Borrow<str> for BareJid {
  fn borrow(&self) -> &str { &self.0 }
}

impl FromStr for BareJid {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { normalize(s) }
}

impl TryFrom<String> for BareJid {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { normalize(&s) }
}

impl From<BareJid> for String {
  fn from(jid: BareJid) -> Self { jid.0 }
}
