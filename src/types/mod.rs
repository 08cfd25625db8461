//! This module contains the identity and message types that flow through the mirroring pipeline.

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// A 32-bit value assigned to each message, which when used with the unique identifier validity
/// value (see [`UidValidity`]) forms a 64-bit value that will not refer to any other message in
/// the mailbox or any subsequent mailbox with the same name forever.  Unique identifiers are
/// assigned in a strictly ascending fashion in the mailbox; as each message is added to the
/// mailbox it is assigned a higher UID than the message(s) which were added previously.  Unlike
/// message sequence numbers, unique identifiers are not necessarily contiguous.
///
/// A UID is always strictly positive. The value `0` is never sent to a server; operations that
/// accept UIDs reject it with [`crate::error::ValidateError::InvalidUid`].
pub type Uid = u32;

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// The unique identifier validity value is sent in a `UIDVALIDITY` response code in an `OK`
/// untagged response at mailbox selection time. If unique identifiers from an earlier session fail
/// to persist in this session, the unique identifier validity value will be greater than the one
/// used in the earlier session. A changed value invalidates every [`Uid`] previously seen for the
/// mailbox, which is why it is part of every [`ExtendedUid`].
pub type UidValidity = u32;

/// From section [2.3.1.2 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.2).
///
/// A relative position from 1 to the number of messages in the mailbox.
/// This position is ordered by ascending unique identifier.  Message sequence numbers can be
/// reassigned during the session, so they are only used to enumerate a freshly selected mailbox.
pub type Seq = u32;

mod flag;
pub use self::flag::Flag;

mod ids;
pub use self::ids::ExtendedUid;

mod mailbox;
pub use self::mailbox::MailboxStatus;

mod message;
pub use self::message::{FetchItem, RawMessage, RetrievedMessage};

mod name;
pub use self::name::{FolderInfo, NameAttribute};

mod sequence_set;
pub use self::sequence_set::SequenceSet;
