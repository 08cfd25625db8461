use std::fmt;
use std::str::FromStr;

use super::{Uid, UidValidity};
use crate::error::{Error, ValidateError};

/// The durable identity of a message: the [`UidValidity`] of its mailbox together with its
/// [`Uid`] within that mailbox.
///
/// This is the key used to decide, across mirroring runs, whether a message has already been
/// stored locally. Its canonical string form is `"<uid validity>/<uid>"`, e.g. `"42/7"`, and
/// [`FromStr`] parses that form back.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExtendedUid {
    /// The validity marker of the mailbox the message belongs to.
    pub folder: UidValidity,
    /// The message's unique identifier within that mailbox.
    pub msg: Uid,
}

impl ExtendedUid {
    /// Make a new identity from a mailbox validity marker and a message UID.
    pub fn new(folder: UidValidity, msg: Uid) -> Self {
        ExtendedUid { folder, msg }
    }
}

impl fmt::Display for ExtendedUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.msg)
    }
}

impl FromStr for ExtendedUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Validate(ValidateError::ExtendedUid(s.to_string()));
        let (folder, msg) = s.split_once('/').ok_or_else(invalid)?;
        let folder = folder.parse().map_err(|_| invalid())?;
        let msg: Uid = msg.parse().map_err(|_| invalid())?;
        if msg == 0 {
            return Err(invalid());
        }
        Ok(ExtendedUid { folder, msg })
    }
}
