//! Incrementally mirror remote IMAP mailboxes.
//!
//! This crate is the retrieval side of a mailbox backup: it logs in, lists folders, enumerates
//! the durable identity of every message in a folder, and streams full messages out of it while
//! staying cancellable. Deciding which messages are new, and writing them to disk, is left to the
//! caller; [`ExtendedUid`]'s string form `"<uid validity>/<uid>"` is the key to remember.
//!
//! # Usage
//!
//! ```no_run
//! use imapgrab::{
//!     authenticate, ImapConfig, Interrupt, TcpConnector, WaitGroup, PASSWORD_ENV_VAR,
//! };
//!
//! fn main() -> imapgrab::Result<()> {
//!     let config = ImapConfig::new("imap.example.com", "someone@example.com")
//!         .with_password_from_env(PASSWORD_ENV_VAR);
//!     let session = authenticate(&config, &TcpConnector)?;
//!
//!     for folder in session.list_folders()? {
//!         println!("{}", folder);
//!     }
//!
//!     let status = session.select_folder("INBOX")?;
//!     let ids = session.enumerate_ids(&status).into_result()?;
//!     let uids: Vec<_> = ids.iter().map(|id| id.msg).collect();
//!
//!     let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
//!     let retrieval = session.retrieve(&uids, &start, &tracker, &Interrupt::new())?;
//!     drop(start);
//!     for msg in retrieval.messages() {
//!         println!("{}/{}: {} bytes", status.uid_validity, msg.uid, msg.body.len());
//!     }
//!     println!("{} errors", retrieval.error_count());
//!
//!     session.logout()
//! }
//! ```
//!
//! # Concurrency
//!
//! A [`Session`] owns one connection and serializes the operations issued on it. Run one session
//! per folder to mirror folders in parallel; the `start` and `tracker` wait groups passed to
//! [`Session::retrieve`] let a scheduler launch a batch of retrievals that only begin fetching once
//! all of them are registered.
//!
//! # Logging
//!
//! Progress is reported through the [`log`] facade; install any logger to see it. Protocol
//! traffic is logged at `trace` level, without the password.
//!
//! # Testing
//!
//! With the `test_helpers` feature, [`testing::FakeClient`] stands in for a server. It plugs in
//! through the [`ImapOps`] and [`Connector`] traits.

#![warn(missing_docs)]

mod client;
mod completion;
mod conn;
mod enumerate;
mod folders;
mod interrupt;
mod ops;
mod parse;
mod retrieve;
mod session;
mod utils;

pub mod config;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "test_helpers"))]
pub mod testing;

pub use crate::client::Client;
pub use crate::completion::Completion;
pub use crate::config::{ImapConfig, DEFAULT_PORT, PASSWORD_ENV_VAR};
pub use crate::conn::{
    connect, split_address, Connection, Connector, Hangup, ImapConnection, TcpConnector, LOOPBACK,
};
pub use crate::enumerate::{Enumerated, MESSAGE_RETRIEVAL_BUFFER};
pub use crate::error::{Error, Result};
pub use crate::folders::{get_all_folders, FOLDER_LIST_BUFFER};
pub use crate::interrupt::Interrupt;
pub use crate::ops::ImapOps;
pub use crate::retrieve::{ErrorCount, Retrieval};
pub use crate::session::{authenticate, Session};
pub use crate::types::*;

/// The wait group type used for the start barrier and tracker of [`Session::retrieve`].
pub use crossbeam::sync::WaitGroup;

#[cfg(test)]
mod mock_stream;
