//! Listing the durable identity of every message in a selected mailbox.

use std::sync::Mutex;

use crossbeam::channel::bounded;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::ops::ImapOps;
use crate::session::{lock, Session};
use crate::types::{ExtendedUid, FetchItem, MailboxStatus, SequenceSet};

/// Capacity of the channels fetched messages are streamed through.
pub const MESSAGE_RETRIEVAL_BUFFER: usize = 20;

const ENUMERATE_ITEMS: [FetchItem; 2] = [FetchItem::Uid, FetchItem::InternalDate];

/// The identities found in a mailbox, together with the error that cut the listing short, if any.
#[derive(Debug, Default)]
pub struct Enumerated {
    /// Every identity the server reported, in the order it reported them.
    pub uids: Vec<ExtendedUid>,
    /// Why the listing may be incomplete.
    pub error: Option<Error>,
}

impl Enumerated {
    /// The identities, or the error if there was one.
    pub fn into_result(self) -> Result<Vec<ExtendedUid>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.uids),
        }
    }
}

impl<C: ImapOps + 'static> Session<C> {
    /// The identity of every message in the selected mailbox described by `status`.
    ///
    /// An empty mailbox is answered without asking the server. Records the server sends without
    /// a UID are skipped.
    pub fn enumerate_ids(&self, status: &MailboxStatus) -> Enumerated {
        info!("retrieving information about emails stored on server");
        if status.exists == 0 {
            return Enumerated::default();
        }

        let set = SequenceSet::range(1, status.exists);
        let (tx, rx) = bounded(MESSAGE_RETRIEVAL_BUFFER);
        let client: &Mutex<C> = &self.client;

        let scoped = crossbeam::scope(|s| {
            let producer = s.spawn(move |_| lock(client).fetch(&set, &ENUMERATE_ITEMS, &tx));
            // EXISTS comes from the server and is not trusted as an allocation size
            let mut uids = Vec::new();
            for raw in rx.iter() {
                match raw.valid_uid() {
                    Some(uid) => uids.push(ExtendedUid::new(status.uid_validity, uid)),
                    None => debug!("skipping fetch record {} without a UID", raw.seq),
                }
            }
            (uids, producer.join())
        });

        let (uids, error) = match scoped {
            Ok((uids, Ok(Ok(())))) => (uids, None),
            Ok((uids, Ok(Err(e)))) => (uids, Some(e)),
            Ok((uids, Err(_))) => (uids, Some(Error::WorkerPanicked)),
            Err(_) => (Vec::new(), Some(Error::WorkerPanicked)),
        };
        info!("received information for {} emails", uids.len());
        Enumerated { uids, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;

    fn status(uid_validity: u32, exists: u32) -> MailboxStatus {
        let mut status = MailboxStatus::new(uid_validity);
        status.exists = exists;
        status
    }

    #[test]
    fn empty_mailbox_makes_no_call() {
        let client = FakeClient::default().with_message(1, "unreachable");
        let log = client.call_log();
        let session = Session::login(client, "user", "secret").unwrap();
        let found = session.enumerate_ids(&status(42, 0));
        assert!(found.uids.is_empty());
        assert!(found.error.is_none());
        assert_eq!(*log.lock().unwrap(), ["LOGIN user"]);
    }

    #[test]
    fn identities_carry_uid_validity() {
        let client = FakeClient::default()
            .with_message(1, "a")
            .with_message(2, "b")
            .with_message(3, "c");
        let log = client.call_log();
        let session = Session::login(client, "user", "secret").unwrap();
        let mut uids = session.enumerate_ids(&status(42, 3)).into_result().unwrap();
        uids.sort();
        assert_eq!(
            uids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["42/1", "42/2", "42/3"]
        );
        assert_eq!(log.lock().unwrap()[1], "FETCH 1:3 (UID INTERNALDATE)");
    }

    #[test]
    fn placeholders_are_skipped() {
        let client = FakeClient::default()
            .with_message(10, "a")
            .with_placeholder()
            .with_message(12, "c");
        let session = Session::login(client, "user", "secret").unwrap();
        let found = session.enumerate_ids(&status(7, 3));
        assert!(found.error.is_none());
        assert_eq!(
            found.uids,
            [ExtendedUid::new(7, 10), ExtendedUid::new(7, 12)]
        );
    }

    #[test]
    fn more_messages_than_the_buffer_holds() {
        let n = MESSAGE_RETRIEVAL_BUFFER as u32 * 3;
        let client = (1..=n).fold(FakeClient::default(), |c, uid| c.with_message(uid, "x"));
        let session = Session::login(client, "user", "secret").unwrap();
        let found = session.enumerate_ids(&status(1, n));
        assert_eq!(found.uids.len(), n as usize);
    }

    #[test]
    fn bogus_exists_count_is_not_preallocated() {
        let client = FakeClient::default()
            .with_message(1, "a")
            .with_message(2, "b");
        let log = client.call_log();
        let session = Session::login(client, "user", "secret").unwrap();
        let found = session.enumerate_ids(&status(3, u32::MAX));
        assert!(found.error.is_none());
        assert_eq!(found.uids.len(), 2);
        assert_eq!(
            log.lock().unwrap()[1],
            "FETCH 1:4294967295 (UID INTERNALDATE)"
        );
    }

    #[test]
    fn error_travels_with_partial_result() {
        let client = FakeClient::default()
            .with_message(1, "a")
            .with_message(2, "b")
            .fail_fetch("connection reset");
        let session = Session::login(client, "user", "secret").unwrap();
        let found = session.enumerate_ids(&status(5, 2));
        assert_eq!(found.uids.len(), 2);
        assert!(matches!(found.error, Some(Error::No(_))));
        assert!(found.into_result().is_err());
    }
}
