//! Cooperative cancellation of a running retrieval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam::channel::{bounded, Receiver, Sender};

/// A user interrupt, e.g. wired to Ctrl-C.
///
/// Triggering closes an internal channel, so workers can wait on [`Interrupt::receiver`] in a
/// `select!` next to their data channel instead of polling a flag.
#[derive(Clone, Debug)]
pub struct Interrupt {
    triggered: Arc<AtomicBool>,
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl Interrupt {
    /// A fresh, untriggered interrupt.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Interrupt {
            triggered: Arc::new(AtomicBool::new(false)),
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    /// Request cancellation. Triggering more than once has no further effect.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Whether cancellation has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Becomes ready (disconnected) once the interrupt is triggered. Nothing is ever sent on it.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Interrupt::new()
    }
}
