use chrono::{DateTime, FixedOffset};
use std::fmt;

use super::{Flag, Seq, Uid};

/// IMAP `date-time` as used by `INTERNALDATE`, e.g. `17-Jul-1996 02:44:25 -0700`.
const INTERNAL_DATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

/// A data item requested by a `FETCH` or `UID FETCH` command.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FetchItem {
    /// The unique identifier of the message.
    Uid,
    /// The internal date of the message, as assigned by the server.
    InternalDate,
    /// The full [RFC 822](https://tools.ietf.org/html/rfc822) message.
    Rfc822,
}

impl fmt::Display for FetchItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FetchItem::Uid => f.write_str("UID"),
            FetchItem::InternalDate => f.write_str("INTERNALDATE"),
            FetchItem::Rfc822 => f.write_str("RFC822"),
        }
    }
}

/// A single `FETCH` response as delivered by the transport.
///
/// Servers interleave unilateral `FETCH` responses (e.g. flag updates) with the ones that were
/// asked for, so any field may be missing. A record without a UID carries no identity and is
/// treated as an empty placeholder by the pipeline.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawMessage {
    /// The ordinal number of this message in its containing mailbox.
    pub seq: Seq,
    /// The unique identifier of the message, if it was part of the response.
    pub uid: Option<Uid>,
    /// The unparsed `INTERNALDATE`, if it was part of the response.
    pub internal_date: Option<String>,
    /// Flags included in the response.
    pub flags: Vec<Flag<'static>>,
    /// The full message, if `RFC822` (or `BODY[]`) was part of the response.
    pub body: Option<Vec<u8>>,
}

impl RawMessage {
    /// The message's UID, unless this record is an empty placeholder.
    pub fn valid_uid(&self) -> Option<Uid> {
        self.uid.filter(|&uid| uid > 0)
    }
}

/// A fully retrieved message, ready to be handed to storage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetrievedMessage {
    /// The message's unique identifier within the selected mailbox.
    pub uid: Uid,
    /// When the server received the message, if it reported a parseable date.
    pub internal_date: Option<DateTime<FixedOffset>>,
    /// The message's flags at retrieval time.
    pub flags: Vec<Flag<'static>>,
    /// The full RFC 822 message.
    pub body: Vec<u8>,
}

impl RetrievedMessage {
    /// Translate a transport record; returns `None` for records that lack a UID or a body.
    pub fn from_raw(raw: RawMessage) -> Option<Self> {
        let uid = raw.valid_uid()?;
        let body = raw.body?;
        let internal_date = raw.internal_date.as_deref().and_then(parse_internal_date);
        Some(RetrievedMessage {
            uid,
            internal_date,
            flags: raw.flags,
            body,
        })
    }
}

pub(crate) fn parse_internal_date(date: &str) -> Option<DateTime<FixedOffset>> {
    // single-digit days are space padded
    match DateTime::parse_from_str(date.trim(), INTERNAL_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            log::debug!("ignoring unparseable internal date {:?}: {}", date, e);
            None
        }
    }
}
