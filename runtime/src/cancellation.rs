//! Registry of in-flight cancellable effect tasks
//!
//! Every effect task the Store spawns is registered under the ids of the
//! `Effect::Cancellable` wrappers that enclose it. Cancelling an id aborts
//! those tasks and removes them, so a task finishing afterwards can tell it
//! was cancelled and must not dispatch its action.

use futures::future::AbortHandle;
use reflux_core::effect::EffectId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of one spawned effect task
pub(crate) type TaskId = u64;

#[derive(Debug, Default)]
struct Registry {
    next_task: TaskId,
    by_id: HashMap<EffectId, HashMap<TaskId, AbortHandle>>,
}

/// Shared, lock-protected cancellation registry
#[derive(Debug, Default)]
pub(crate) struct Cancellations {
    registry: Mutex<Registry>,
}

impl Cancellations {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A panic while holding the lock leaves the maps consistent
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a task under every id in `scope`
    pub(crate) fn register(&self, scope: &[EffectId], handle: &AbortHandle) -> TaskId {
        let mut registry = self.lock();
        let task = registry.next_task;
        registry.next_task = registry.next_task.wrapping_add(1);

        for id in scope {
            registry
                .by_id
                .entry(id.clone())
                .or_default()
                .insert(task, handle.clone());
        }

        task
    }

    /// Deregister a finished task
    ///
    /// Returns `false` when the task was cancelled under any of its ids, in
    /// which case its output must be discarded.
    pub(crate) fn complete(&self, task: TaskId, scope: &[EffectId]) -> bool {
        let mut registry = self.lock();
        let mut live = true;

        for id in scope {
            let removed = registry
                .by_id
                .get_mut(id)
                .and_then(|tasks| tasks.remove(&task))
                .is_some();
            live &= removed;

            if registry.by_id.get(id).is_some_and(HashMap::is_empty) {
                registry.by_id.remove(id);
            }
        }

        live
    }

    /// Abort every task registered under `id`, returning how many were aborted
    pub(crate) fn cancel(&self, id: &EffectId) -> usize {
        let tasks = self.lock().by_id.remove(id).unwrap_or_default();
        for handle in tasks.values() {
            handle.abort();
        }
        tasks.len()
    }

    /// Number of tasks currently registered under `id`
    pub(crate) fn in_flight(&self, id: &EffectId) -> usize {
        self.lock().by_id.get(id).map_or(0, HashMap::len)
    }

    /// Register a task and get a guard that deregisters it when dropped
    pub(crate) fn track(self: &Arc<Self>, scope: Vec<EffectId>, handle: &AbortHandle) -> Registration {
        let task = self.register(&scope, handle);
        Registration {
            cancellations: Arc::clone(self),
            task,
            scope,
            finished: false,
        }
    }
}

/// Registration of one running task
///
/// Dropping it without calling [`Registration::finish`] (the task panicked)
/// still deregisters the task.
pub(crate) struct Registration {
    cancellations: Arc<Cancellations>,
    task: TaskId,
    scope: Vec<EffectId>,
    finished: bool,
}

impl Registration {
    /// Deregister the task, returning `false` if it was cancelled
    pub(crate) fn finish(mut self) -> bool {
        self.finished = true;
        self.cancellations.complete(self.task, &self.scope)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !self.finished {
            self.cancellations.complete(self.task, &self.scope);
        }
    }
}
