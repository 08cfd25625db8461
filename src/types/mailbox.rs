use super::{Flag, Uid, UidValidity};
use crate::utils::iter_join;
use std::fmt;

/// Meta-information about an IMAP mailbox, as returned by `SELECT` and `EXAMINE`.
///
/// This is a snapshot taken when the mailbox was opened; it is not kept up to date with
/// unsolicited `EXISTS` or `EXPUNGE` responses.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MailboxStatus {
    /// Defined flags in the mailbox.
    pub flags: Vec<Flag<'static>>,
    /// The number of messages in the mailbox.
    pub exists: u32,
    /// The number of messages with the \Recent flag set.
    pub recent: u32,
    /// The next unique identifier value, if the server announced one.
    pub uid_next: Option<Uid>,
    /// The unique identifier validity value. See [`UidValidity`] for more details.
    pub uid_validity: UidValidity,
}

impl MailboxStatus {
    /// Make an empty status for a mailbox with the given validity marker.
    pub fn new(uid_validity: UidValidity) -> Self {
        MailboxStatus {
            flags: Vec::new(),
            exists: 0,
            recent: 0,
            uid_next: None,
            uid_validity,
        }
    }
}

impl fmt::Display for MailboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "flags: [{}], exists: {}, recent: {}, uid_next: {:?}, uid_validity: {}",
            iter_join(&self.flags, " "),
            self.exists,
            self.recent,
            self.uid_next,
            self.uid_validity
        )
    }
}
