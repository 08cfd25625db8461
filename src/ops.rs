//! The protocol capability the mirroring pipeline is built on.
//!
//! [`ImapOps`] is the small subset of IMAP the pipeline needs. [`crate::client::Client`] implements
//! it over a real connection; tests substitute a scripted implementation (see
//! [`crate::testing`] with the `test_helpers` feature).

use crossbeam::channel::Sender;

use crate::error::Result;
use crate::types::{FetchItem, FolderInfo, MailboxStatus, RawMessage, SequenceSet};

/// The protocol primitives of one IMAP connection.
///
/// Streaming commands push their results into `sink` as they arrive and return once the server
/// has completed the command. A disconnected `sink` is not an error: implementations keep reading
/// the response so that the connection stays usable.
///
/// Implementations are not re-entrant; callers serialize operations on one connection.
pub trait ImapOps: Send {
    /// Authenticate with a plain `LOGIN`.
    fn login(&mut self, username: &str, password: &str) -> Result<()>;

    /// Stream the folders matching `pattern` below `reference_name`.
    fn list(
        &mut self,
        reference_name: &str,
        pattern: &str,
        sink: &Sender<FolderInfo>,
    ) -> Result<()>;

    /// Open a folder, read-only (`EXAMINE`) or read-write (`SELECT`).
    fn select(&mut self, mailbox_name: &str, read_only: bool) -> Result<MailboxStatus>;

    /// Stream the requested items for the messages at the given sequence numbers.
    fn fetch(
        &mut self,
        sequence_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()>;

    /// Stream the requested items for the messages with the given UIDs.
    fn uid_fetch(
        &mut self,
        uid_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()>;

    /// Tell the server we are done and wait for it to confirm.
    fn logout(&mut self) -> Result<()>;

    /// Drop the connection without a `LOGOUT`.
    fn terminate(&mut self) -> Result<()>;
}

impl<T: ImapOps + ?Sized> ImapOps for Box<T> {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        (**self).login(username, password)
    }

    fn list(
        &mut self,
        reference_name: &str,
        pattern: &str,
        sink: &Sender<FolderInfo>,
    ) -> Result<()> {
        (**self).list(reference_name, pattern, sink)
    }

    fn select(&mut self, mailbox_name: &str, read_only: bool) -> Result<MailboxStatus> {
        (**self).select(mailbox_name, read_only)
    }

    fn fetch(
        &mut self,
        sequence_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        (**self).fetch(sequence_set, items, sink)
    }

    fn uid_fetch(
        &mut self,
        uid_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        (**self).uid_fetch(uid_set, items, sink)
    }

    fn logout(&mut self) -> Result<()> {
        (**self).logout()
    }

    fn terminate(&mut self) -> Result<()> {
        (**self).terminate()
    }
}
