//! Enable the test_helpers feature to get a scripted [`ImapOps`] implementation for testing code
//! built on this crate without a server.
//!
//! ```toml
//! [dev-dependencies]
//! imapgrab = { version = "0.1", features = ["test_helpers"] }
//! ```
//!
//! ```
//! # #[cfg(feature = "test_helpers")]
//! # fn main() {
//! use imapgrab::testing::FakeClient;
//! use imapgrab::{MailboxStatus, Session};
//!
//! let mut status = MailboxStatus::new(42);
//! status.exists = 2;
//! let client = FakeClient::default()
//!     .with_mailbox("INBOX", status)
//!     .with_message(1, "Subject: one\r\n\r\nhello\r\n")
//!     .with_message(2, "Subject: two\r\n\r\nworld\r\n");
//! let calls = client.call_log();
//!
//! let session = Session::login(client, "user", "secret").unwrap();
//! let status = session.select_folder("INBOX").unwrap();
//! assert_eq!(status.exists, 2);
//! assert_eq!(calls.lock().unwrap()[1], "EXAMINE INBOX");
//! # }
//! # #[cfg(not(feature = "test_helpers"))]
//! # fn main() {}
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam::channel::{Receiver, Sender};

use crate::error::{Error, Result};
use crate::ops::ImapOps;
use crate::types::{FetchItem, FolderInfo, MailboxStatus, RawMessage, SequenceSet, Uid};
use crate::utils::iter_join;

/// The `INTERNALDATE` given to scripted messages.
pub const FAKE_INTERNAL_DATE: &str = "17-Jul-1996 02:44:25 -0700";

/// Every command a [`FakeClient`] received, in order, e.g. `"UID FETCH 1:3 (UID RFC822)"`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// A scripted IMAP server behind the [`ImapOps`] interface.
///
/// Fetch commands serve the scripted records whose sequence number (`FETCH`) or UID
/// (`UID FETCH`) is in the requested set; placeholders (records without a UID) are served to
/// every fetch, the way a misbehaving transport would.
#[derive(Debug, Default)]
pub struct FakeClient {
    password: Option<String>,
    folders: Vec<FolderInfo>,
    mailboxes: HashMap<String, MailboxStatus>,
    messages: Vec<RawMessage>,
    list_error: Option<String>,
    fetch_error: Option<String>,
    uid_fetch_error: Option<String>,
    uid_fetch_gate: Option<Receiver<()>>,
    calls: CallLog,
}

impl FakeClient {
    /// Only accept this password; any password is accepted otherwise.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Add a folder to the `LIST` output.
    pub fn with_folder(mut self, folder: FolderInfo) -> Self {
        self.folders.push(folder);
        self
    }

    /// Make `name` selectable with the given status.
    pub fn with_mailbox(mut self, name: &str, status: MailboxStatus) -> Self {
        self.mailboxes.insert(name.to_string(), status);
        self
    }

    /// Add a complete message with the next sequence number.
    pub fn with_message(mut self, uid: Uid, body: impl Into<Vec<u8>>) -> Self {
        let seq = self.messages.len() as u32 + 1;
        self.messages.push(RawMessage {
            seq,
            uid: Some(uid),
            internal_date: Some(FAKE_INTERNAL_DATE.to_string()),
            flags: Vec::new(),
            body: Some(body.into()),
        });
        self
    }

    /// Add an empty record that carries no identity.
    pub fn with_placeholder(mut self) -> Self {
        let seq = self.messages.len() as u32 + 1;
        self.messages.push(RawMessage {
            seq,
            ..RawMessage::default()
        });
        self
    }

    /// Answer `LIST` with `NO` after streaming the folders.
    pub fn fail_list(mut self, reason: &str) -> Self {
        self.list_error = Some(reason.to_string());
        self
    }

    /// Answer `FETCH` with `NO` after streaming the records.
    pub fn fail_fetch(mut self, reason: &str) -> Self {
        self.fetch_error = Some(reason.to_string());
        self
    }

    /// Answer `UID FETCH` with `NO` after streaming the records.
    pub fn fail_uid_fetch(mut self, reason: &str) -> Self {
        self.uid_fetch_error = Some(reason.to_string());
        self
    }

    /// Hold every `UID FETCH` until `gate` yields a value or is disconnected.
    pub fn with_uid_fetch_gate(mut self, gate: Receiver<()>) -> Self {
        self.uid_fetch_gate = Some(gate);
        self
    }

    /// A handle on the commands received, usable after the client has been moved into a session.
    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn serve<F>(&self, wanted: F, sink: &Sender<RawMessage>, failure: &Option<String>) -> Result<()>
    where
        F: Fn(&RawMessage) -> bool,
    {
        for msg in &self.messages {
            if msg.uid.is_none() || wanted(msg) {
                // a consumer that went away is not an error
                let _ = sink.send(msg.clone());
            }
        }
        match failure {
            Some(reason) => Err(Error::No(reason.clone())),
            None => Ok(()),
        }
    }
}

impl ImapOps for FakeClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.record(format!("LOGIN {}", username));
        match self.password {
            Some(ref expected) if expected != password => Err(Error::No(
                "[AUTHENTICATIONFAILED] Authentication failed.".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn list(
        &mut self,
        reference_name: &str,
        pattern: &str,
        sink: &Sender<FolderInfo>,
    ) -> Result<()> {
        self.record(format!("LIST {:?} {:?}", reference_name, pattern));
        for folder in &self.folders {
            let _ = sink.send(folder.clone());
        }
        match self.list_error {
            Some(ref reason) => Err(Error::No(reason.clone())),
            None => Ok(()),
        }
    }

    fn select(&mut self, mailbox_name: &str, read_only: bool) -> Result<MailboxStatus> {
        let verb = if read_only { "EXAMINE" } else { "SELECT" };
        self.record(format!("{} {}", verb, mailbox_name));
        self.mailboxes
            .get(mailbox_name)
            .cloned()
            .ok_or_else(|| Error::No(format!("Mailbox doesn't exist: {}", mailbox_name)))
    }

    fn fetch(
        &mut self,
        sequence_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        let call = format!("FETCH {} ({})", sequence_set, iter_join(items, " "));
        self.record(call);
        self.serve(|m| sequence_set.contains(m.seq), sink, &self.fetch_error)
    }

    fn uid_fetch(
        &mut self,
        uid_set: &SequenceSet,
        items: &[FetchItem],
        sink: &Sender<RawMessage>,
    ) -> Result<()> {
        let call = format!("UID FETCH {} ({})", uid_set, iter_join(items, " "));
        self.record(call);
        if let Some(ref gate) = self.uid_fetch_gate {
            let _ = gate.recv();
        }
        self.serve(
            |m| m.uid.map_or(false, |uid| uid_set.contains(uid)),
            sink,
            &self.uid_fetch_error,
        )
    }

    fn logout(&mut self) -> Result<()> {
        self.record("LOGOUT".to_string());
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.record("TERMINATE".to_string());
        Ok(())
    }
}
