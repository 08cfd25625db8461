//! A signal that fires exactly once.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

type Hook = Box<dyn FnOnce() + Send>;

struct Inner {
    fired: AtomicBool,
    hook: Mutex<Option<Hook>>,
    done: Condvar,
}

/// Marks the end of a retrieval.
///
/// Both the fetching and the translating side of a retrieval may decide that it is over; whichever
/// calls [`Completion::call`] first runs the hook, every later call is a no-op. Clones share the
/// same state.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

impl Completion {
    /// A signal that runs `hook` when it fires.
    pub fn new(hook: impl FnOnce() + Send + 'static) -> Self {
        Completion {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                hook: Mutex::new(Some(Box::new(hook))),
                done: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Hook>> {
        self.inner
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire the signal. Returns `true` for the one call that ran the hook.
    ///
    /// The signal counts as fired before the hook runs, so nothing the hook releases can observe
    /// [`Completion::has_fired`] returning `false`. Concurrent callers are held back until the
    /// hook has finished.
    pub fn call(&self) -> bool {
        let mut hook = self.lock();
        let hook = match hook.take() {
            Some(hook) => hook,
            None => return false,
        };
        self.inner.fired.store(true, Ordering::Release);
        hook();
        self.inner.done.notify_all();
        true
    }

    /// Whether the signal has fired.
    pub fn has_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Block until the signal has fired.
    pub fn wait(&self) {
        let mut guard = self.lock();
        while !self.has_fired() {
            guard = self
                .inner
                .done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("fired", &self.has_fired())
            .finish()
    }
}
