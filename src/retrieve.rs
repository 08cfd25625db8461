//! Streaming retrieval of full messages.
//!
//! A retrieval runs on two threads. The *fetch* thread waits for the start barrier, then issues
//! one `UID FETCH` and hands every record to the *translate* thread over an unbounded channel.
//! The translate thread drops records without identity or body, converts the rest into
//! [`RetrievedMessage`]s and sends them on a bounded channel to the consumer.
//!
//! Both threads share one [`Completion`]. The fetch thread fires it when the command finished.
//! The translate thread fires it when it is interrupted, then stops at once; the fetch keeps the
//! session busy in the background until the server completes it, and whatever it reports after
//! that is not observed. Errors of either thread are counted in an [`ErrorCount`] that the
//! consumer should read after the message channel is closed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, bounded, select, unbounded, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use log::{debug, error, info, warn};

use crate::completion::Completion;
use crate::enumerate::MESSAGE_RETRIEVAL_BUFFER;
use crate::error::{Result, ValidateError};
use crate::interrupt::Interrupt;
use crate::ops::ImapOps;
use crate::session::{lock, Session};
use crate::types::{FetchItem, RawMessage, RetrievedMessage, SequenceSet, Uid};

const RETRIEVE_ITEMS: [FetchItem; 3] = [FetchItem::Uid, FetchItem::InternalDate, FetchItem::Rfc822];

/// The number of errors seen by a retrieval, shared between its threads and its consumer.
#[derive(Clone, Debug, Default)]
pub struct ErrorCount(Arc<AtomicUsize>);

impl ErrorCount {
    /// Count one more error.
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// The errors counted so far.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running retrieval.
///
/// Messages can be consumed once, in the order the server delivered them.
#[derive(Debug)]
pub struct Retrieval {
    messages: Receiver<RetrievedMessage>,
    errors: ErrorCount,
    completion: Completion,
}

impl Retrieval {
    /// Block for the next message until the retrieval is over.
    pub fn messages(&self) -> channel::Iter<'_, RetrievedMessage> {
        self.messages.iter()
    }

    /// Errors counted so far, including an interrupt. Final once [`Retrieval::messages`] ended.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// The signal that fires when the fetch finished or the retrieval was interrupted.
    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Take the retrieval apart, e.g. to hand the messages to another thread.
    pub fn into_parts(self) -> (Receiver<RetrievedMessage>, ErrorCount, Completion) {
        (self.messages, self.errors, self.completion)
    }
}

impl<C: ImapOps + 'static> Session<C> {
    /// Start retrieving the messages with the given `uids` from the selected mailbox.
    ///
    /// Every UID must be positive; otherwise this fails before anything is sent to the server.
    ///
    /// The fetch only starts once every other holder of `start` has dropped it, so that a batch of
    /// retrievals can all be registered before any of them runs. `tracker` is held until the
    /// retrieval completes. Triggering `interrupt` ends the retrieval early and counts as one
    /// error.
    pub fn retrieve(
        &self,
        uids: &[Uid],
        start: &WaitGroup,
        tracker: &WaitGroup,
        interrupt: &Interrupt,
    ) -> Result<Retrieval> {
        if let Some(&uid) = uids.iter().find(|&&uid| uid == 0) {
            return Err(ValidateError::InvalidUid(uid).into());
        }
        let uid_set = SequenceSet::from_nums(uids.iter().copied());

        let registered = tracker.clone();
        let completion = Completion::new(move || drop(registered));
        let errors = ErrorCount::default();
        let (out_tx, out_rx) = bounded(MESSAGE_RETRIEVAL_BUFFER);

        if uid_set.is_empty() {
            debug!("nothing to retrieve");
            completion.call();
            return Ok(Retrieval {
                messages: out_rx,
                errors,
                completion,
            });
        }
        info!("retrieving {} emails", uid_set.len());

        let (raw_tx, raw_rx) = unbounded();

        let fetch = {
            let client = Arc::clone(&self.client);
            let start = start.clone();
            let completion = completion.clone();
            let errors = errors.clone();
            move || {
                start.wait();
                let result = lock(&client).uid_fetch(&uid_set, &RETRIEVE_ITEMS, &raw_tx);
                if let Err(e) = result {
                    error!("{}", e);
                    errors.increment();
                }
                completion.call();
            }
        };
        thread::Builder::new()
            .name("imapgrab-fetch".to_string())
            .spawn(fetch)?;

        let translate = Translate {
            raw: raw_rx,
            out: out_tx,
            interrupt: interrupt.clone(),
            errors: errors.clone(),
            completion: completion.clone(),
        };
        thread::Builder::new()
            .name("imapgrab-translate".to_string())
            .spawn(move || translate.run())?;

        Ok(Retrieval {
            messages: out_rx,
            errors,
            completion,
        })
    }
}

struct Translate {
    raw: Receiver<RawMessage>,
    out: Sender<RetrievedMessage>,
    interrupt: Interrupt,
    errors: ErrorCount,
    completion: Completion,
}

impl Translate {
    /// Runs until the fetch is done and drained, the consumer is gone, or an interrupt arrives.
    /// The output channel closes when this returns.
    fn run(self) {
        loop {
            let raw = select! {
                recv(self.raw) -> raw => match raw {
                    Ok(raw) => raw,
                    Err(_) => return,
                },
                recv(self.interrupt.receiver()) -> _ => return self.interrupted(),
            };

            let seq = raw.seq;
            let msg = match RetrievedMessage::from_raw(raw) {
                Some(msg) => msg,
                None => {
                    debug!("dropping empty fetch record {}", seq);
                    continue;
                }
            };

            select! {
                send(self.out, msg) -> sent => if sent.is_err() {
                    debug!("consumer went away, stopping retrieval");
                    return;
                },
                recv(self.interrupt.receiver()) -> _ => return self.interrupted(),
            }
        }
    }

    fn interrupted(&self) {
        self.errors.increment();
        self.completion.call();
        warn!("caught keyboard interrupt, closing connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::FakeClient;
    use std::collections::HashSet;
    use std::time::Duration;

    fn session(client: FakeClient) -> Session<FakeClient> {
        Session::login(client, "user", "secret").unwrap()
    }

    fn three_messages() -> FakeClient {
        FakeClient::default()
            .with_message(1, "Subject: 1\r\n\r\none\r\n")
            .with_message(2, "Subject: 2\r\n\r\ntwo\r\n")
            .with_message(3, "Subject: 3\r\n\r\nthree\r\n")
    }

    #[test]
    fn zero_uid_is_rejected_without_a_call() {
        let client = three_messages();
        let log = client.call_log();
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        match session.retrieve(&[1, 0, 3], &start, &tracker, &Interrupt::new()) {
            Err(Error::Validate(ValidateError::InvalidUid(0))) => {}
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
        assert_eq!(*log.lock().unwrap(), ["LOGIN user"]);
        // nothing was registered with the tracker
        tracker.wait();
    }

    #[test]
    fn retrieves_requested_messages() {
        let client = three_messages();
        let log = client.call_log();
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let retrieval = session
            .retrieve(&[3, 1, 2], &start, &tracker, &Interrupt::new())
            .unwrap();
        drop(start);

        let mut uids: Vec<Uid> = retrieval.messages().map(|m| m.uid).collect();
        uids.sort_unstable();
        assert_eq!(uids, [1, 2, 3]);
        assert_eq!(retrieval.error_count(), 0);
        tracker.wait();
        assert!(retrieval.completion().has_fired());
        assert_eq!(
            log.lock().unwrap()[1],
            "UID FETCH 1:3 (UID INTERNALDATE RFC822)"
        );
    }

    #[test]
    fn subset_and_placeholders() {
        let client = three_messages().with_placeholder().with_placeholder();
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let retrieval = session
            .retrieve(&[1, 3, 3, 9], &start, &tracker, &Interrupt::new())
            .unwrap();
        drop(start);

        let messages: Vec<_> = retrieval.messages().collect();
        let distinct: HashSet<Uid> = messages.iter().map(|m| m.uid).collect();
        assert_eq!(messages.len(), distinct.len());
        assert_eq!(distinct, [1, 3].into_iter().collect());
        assert!(messages[0].internal_date.is_some());
        assert_eq!(retrieval.error_count(), 0);
    }

    #[test]
    fn fetch_error_is_counted() {
        let client = three_messages().fail_uid_fetch("UID FETCH failed");
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let retrieval = session
            .retrieve(&[1, 2], &start, &tracker, &Interrupt::new())
            .unwrap();
        drop(start);

        assert_eq!(retrieval.messages().count(), 2);
        assert_eq!(retrieval.error_count(), 1);
        tracker.wait();
    }

    #[test]
    fn fetch_waits_for_start_barrier() {
        let client = three_messages();
        let log = client.call_log();
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let retrieval = session
            .retrieve(&[1], &start, &tracker, &Interrupt::new())
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(!retrieval.completion().has_fired());

        drop(start);
        assert_eq!(retrieval.messages().count(), 1);
        assert!(retrieval.completion().has_fired());
    }

    #[test]
    fn interrupt_ends_retrieval() {
        let (gate_tx, gate_rx) = crossbeam::channel::bounded::<()>(0);
        let client = three_messages().with_uid_fetch_gate(gate_rx);
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let interrupt = Interrupt::new();
        let retrieval = session
            .retrieve(&[1, 2, 3], &start, &tracker, &interrupt)
            .unwrap();
        drop(start);

        interrupt.trigger();
        // the fetch is still held at the gate, yet the output closes
        assert_eq!(retrieval.messages().count(), 0);
        assert_eq!(retrieval.error_count(), 1);
        assert!(retrieval.completion().has_fired());
        tracker.wait();

        // the background fetch finishing later fires nothing twice and counts nothing
        drop(gate_tx);
        session.logout().unwrap();
        assert_eq!(retrieval.error_count(), 1);
        assert!(!retrieval.completion().call());
    }

    #[test]
    fn empty_request() {
        let client = three_messages();
        let log = client.call_log();
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let retrieval = session
            .retrieve(&[], &start, &tracker, &Interrupt::new())
            .unwrap();
        assert_eq!(retrieval.messages().count(), 0);
        assert!(retrieval.completion().has_fired());
        tracker.wait();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn consumer_on_another_thread() {
        let client = (1..=MESSAGE_RETRIEVAL_BUFFER as u32 * 2)
            .fold(FakeClient::default(), |c, uid| c.with_message(uid, "x"));
        let session = session(client);
        let (start, tracker) = (WaitGroup::new(), WaitGroup::new());
        let uids: Vec<Uid> = (1..=MESSAGE_RETRIEVAL_BUFFER as u32 * 2).collect();
        let (messages, errors, _completion) = session
            .retrieve(&uids, &start, &tracker, &Interrupt::new())
            .unwrap()
            .into_parts();
        let consumer = thread::spawn(move || messages.iter().count());
        drop(start);
        assert_eq!(consumer.join().unwrap(), uids.len());
        tracker.wait();
        assert_eq!(errors.get(), 0);
    }
}
