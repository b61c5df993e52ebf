//! State observers
//!
//! Observers are plain callbacks invoked with every committed state, in
//! commit order. Each registration hands back a [`Subscription`] token;
//! dropping the token (or calling [`Subscription::cancel`]) unregisters the
//! observer.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback receiving each committed state
pub(crate) type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Inner<S> {
    next_id: u64,
    observers: BTreeMap<u64, Observer<S>>,
}

/// The set of observers registered on one Store
pub(crate) struct Observers<S> {
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S> Clone for Observers<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Default for Observers<S> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                observers: BTreeMap::new(),
            })),
        }
    }
}

fn lock<S>(inner: &Mutex<Inner<S>>) -> MutexGuard<'_, Inner<S>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: 'static> Observers<S> {
    /// Register an observer
    pub(crate) fn add(&self, observer: Observer<S>) -> Subscription {
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.insert(id, observer);
            id
        };

        let weak: Weak<Mutex<Inner<S>>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner).observers.remove(&id);
                }
            })),
        }
    }

    /// Invoke every observer with `state`, in registration order
    pub(crate) fn notify(&self, state: &S) {
        // Snapshot so observers may unsubscribe (or subscribe) from inside the callback
        let observers: Vec<Observer<S>> = lock(&self.inner).observers.values().cloned().collect();
        for observer in observers {
            observer(state);
        }
    }

    /// Number of registered observers
    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).observers.len()
    }
}

/// Token returned by `Store::subscribe`
///
/// The observer stays registered for as long as the token is alive.
#[must_use = "dropping a Subscription immediately unsubscribes the observer"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Unregister the observer now
    pub fn cancel(mut self) {
        self.unsubscribe_now();
    }

    /// Keep the observer registered for the lifetime of the Store
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    fn unsubscribe_now(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
