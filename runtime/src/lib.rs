//! # Reflux Runtime
//!
//! Runtime implementation for the Reflux architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect scheduling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, serializes reducer application and publishes every commit
//! - **Effect Scheduler**: Runs effect descriptions on tokio tasks and feeds their actions back
//! - **Cancellation**: Aborts in-flight effects by [`EffectId`] and suppresses their results
//! - **Subscriptions**: Synchronous observers and broadcast streams of committed states
//!
//! ## Example
//!
//! ```ignore
//! use reflux_runtime::Store;
//!
//! let store = Store::new(TimeEntriesState::new(today), TimeEntriesReducer, environment);
//!
//! let _subscription = store.subscribe(|state| println!("{} entries", state.entries.len()));
//!
//! // Send an action
//! store.send(TimeEntriesAction::LoadEntries).await?;
//!
//! // Read state
//! let date = store.state(|s| s.active_date).await;
//! ```

use reflux_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metric names and descriptions
pub mod metrics;

mod cancellation;
mod subscription;

pub use subscription::Subscription;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Effect failures are never reported here: effects turn their failures
    /// into actions, which travel the normal dispatch path.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for an action or for effects to finish
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

use cancellation::Cancellations;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use reflux_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_state_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.state_broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Buffer size of the committed-state broadcast channel
    pub state_broadcast_capacity: usize,
    /// Buffer size of the effect-action broadcast channel
    pub action_broadcast_capacity: usize,
    /// Timeout used by [`Store::shutdown_with_default_timeout`]
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(
        state_broadcast_capacity: usize,
        action_broadcast_capacity: usize,
        default_shutdown_timeout: Duration,
    ) -> Self {
        Self {
            state_broadcast_capacity,
            action_broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the committed-state broadcast capacity
    #[must_use]
    pub const fn with_state_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.state_broadcast_capacity = capacity;
        self
    }

    /// Set the effect-action broadcast capacity
    #[must_use]
    pub const fn with_action_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.action_broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_broadcast_capacity: 16,
            action_broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects of that
/// action to complete. An effect counts as complete once the action it
/// produced has been reduced, or once it was cancelled.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(TimeEntriesAction::LoadEntries).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // EntriesLoaded has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a handle and the tracking context effects report to
    fn new(scope: Vec<EffectId>) -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
            scope,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects of this action still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            // Every sender is gone only once every effect guard has dropped
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
///
/// Carries the completion counter of one `send` and the cancellation ids of
/// every `Effect::Cancellable` enclosing the effect being executed.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
    scope: Vec<EffectId>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }

    /// The same tracking, nested inside one more cancellation id
    fn within(&self, id: EffectId) -> Self {
        let mut scope = self.scope.clone();
        if !scope.contains(&id) {
            scope.push(id);
        }

        Self {
            counter: Arc::clone(&self.counter),
            notifier: Arc::clone(&self.notifier),
            scope,
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect scheduling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, Cancellations, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectTracking, Ordering, Reducer, RwLock,
        StoreConfig, StoreError, Subscription,
    };
    use crate::metrics::{
        COMMANDS_TOTAL, EFFECTS_CANCELLED, EFFECTS_EXECUTED, EFFECTS_PER_ACTION,
        REDUCER_DURATION, SHUTDOWN_COMPLETED, SHUTDOWN_INITIATED, SHUTDOWN_REJECTED,
        SHUTDOWN_TIMEOUT,
    };
    use crate::cancellation::Registration;
    use crate::subscription::Observers;
    use futures::future::{AbortHandle, Abortable};
    use std::future::Future;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, mutated only by the reducer)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect scheduling (with feedback loop and cancellation)
    /// 5. Publication of every committed state to observers
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// # Ordering
    ///
    /// Reducer application and publication happen under the same write lock,
    /// so observers see states in commit order. Effects returned by the
    /// reducer are scheduled only after observers have seen the state that
    /// produced them.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        observers: Observers<S>,
        state_broadcast: broadcast::Sender<S>,
        /// Every action produced by an effect, sent before it is dispatched
        action_broadcast: broadcast::Sender<A>,
        cancellations: Arc<Cancellations>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        config: StoreConfig,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```ignore
        /// let config = StoreConfig::default().with_shutdown_timeout(Duration::from_secs(5));
        /// let store = Store::with_config(state, TimeEntriesReducer, environment, config);
        /// ```
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (state_broadcast, _) = broadcast::channel(config.state_broadcast_capacity.max(1));
            let (action_broadcast, _) =
                broadcast::channel(config.action_broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                observers: Observers::default(),
                state_broadcast,
                action_broadcast,
                cancellations: Arc::new(Cancellations::default()),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                config,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Publishes the committed state to observers, still under the lock
        /// 4. Releases the lock and schedules the returned effects
        ///
        /// `send()` returns once effects are scheduled, not when they finish.
        /// Use the returned [`EffectHandle`] to wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        /// Reducers should be pure functions that do not panic.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            let handle = self.commit(action, None).await?;
            Ok(handle.unwrap_or_else(EffectHandle::completed))
        }

        /// Reduce, publish and schedule one action
        ///
        /// An action produced by an effect carries the effect's
        /// `registration`. It is finished only once the write lock is held,
        /// so a cancellation that lands while the action waits for the lock
        /// still suppresses it. Returns `None` when the action was suppressed.
        async fn commit(
            &self,
            action: A,
            registration: Option<Registration>,
        ) -> Result<Option<EffectHandle>, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!(SHUTDOWN_REJECTED).increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!(COMMANDS_TOTAL).increment(1);

            let (handle, tracking) = EffectHandle::new(Vec::new());

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                if let Some(registration) = registration {
                    if !registration.finish() {
                        return Ok(None);
                    }
                    let _ = self.action_broadcast.send(action.clone());
                }

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!(REDUCER_DURATION)
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Note: Precision loss acceptable for metrics (effect counts < 2^52)
                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!(EFFECTS_PER_ACTION).record(effects.len() as f64);

                self.publish(&state);
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }
            tracing::debug!("Action processing completed, returning handle");

            Ok(Some(handle))
        }

        /// Alias of [`Store::send`]
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn dispatch(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send(action).await
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let entry_count = store.state(|s| s.entries.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// A snapshot of the current state
        pub async fn current_state(&self) -> S {
            self.state.read().await.clone()
        }

        /// Observe every committed state
        ///
        /// The observer is called synchronously for each commit, in commit
        /// order, including commits that left the state unchanged. It is not
        /// called with the state current at subscription time.
        ///
        /// The observer runs while the Store holds its commit lock: it must
        /// not call back into this Store, and should hand long work off to a
        /// task or channel.
        ///
        /// Dropping the returned [`Subscription`] unsubscribes.
        pub fn subscribe<F>(&self, observer: F) -> Subscription
        where
            F: Fn(&S) + Send + Sync + 'static,
        {
            tracing::debug!(observers = self.observers.len() + 1, "Observer subscribed");
            self.observers.add(Arc::new(observer))
        }

        /// Receive every committed state on a broadcast channel
        ///
        /// Suited to async consumers. A receiver that falls more than
        /// [`StoreConfig::state_broadcast_capacity`] states behind observes
        /// `RecvError::Lagged`.
        #[must_use]
        pub fn subscribe_states(&self) -> broadcast::Receiver<S> {
            self.state_broadcast.subscribe()
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions sent through [`Store::send`] by callers are not broadcast.
        /// Cancelled effects produce nothing.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Send an action and wait for a matching action produced by effects
        ///
        /// Subscribes before sending so no matching action can be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before a matching action was produced
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        ///
        /// # Example
        ///
        /// ```ignore
        /// let loaded = store
        ///     .send_and_wait_for(
        ///         TimeEntriesAction::LoadEntries,
        ///         |a| matches!(a, TimeEntriesAction::EntriesLoaded { .. }),
        ///         Duration::from_secs(5),
        ///     )
        ///     .await?;
        /// ```
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // If the matching action was dropped, the timeout catches it
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Cancel every in-flight effect tagged with `id`
        ///
        /// Same as a reducer returning `Effect::Cancel(id)`. Returns the
        /// number of effect tasks that were cancelled.
        pub fn cancel(&self, id: &EffectId) -> usize {
            let cancelled = self.cancellations.cancel(id);
            if cancelled > 0 {
                tracing::debug!(effect_id = %id, cancelled, "Cancelled in-flight effects");
                metrics::counter!(EFFECTS_CANCELLED)
                    .increment(u64::try_from(cancelled).unwrap_or(u64::MAX));
            }
            cancelled
        }

        /// Number of effect tasks currently running under `id`
        #[must_use]
        pub fn effects_in_flight(&self, id: &EffectId) -> usize {
            self.cancellations.in_flight(id)
        }

        /// Number of effect tasks currently running in this Store
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown
        ///
        /// New actions are rejected with [`StoreError::ShutdownInProgress`].
        /// Running effects are not cancelled; they finish normally, but the
        /// actions they produce are dropped because dispatch is closed.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!(SHUTDOWN_INITIATED).increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(100);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!(SHUTDOWN_COMPLETED).increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    metrics::counter!(SHUTDOWN_TIMEOUT).increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval.min(timeout)).await;
            }
        }

        /// Shut down using [`StoreConfig::default_shutdown_timeout`]
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when the timeout elapses.
        pub async fn shutdown_with_default_timeout(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Publish a committed state to observers and state subscribers
        fn publish(&self, state: &S) {
            self.observers.notify(state);

            if self.state_broadcast.receiver_count() > 0 {
                let _ = self.state_broadcast.send(state.clone());
            }
        }

        /// Execute an effect
        ///
        /// Leaf effects (`Future`, `Delay`) each get their own task.
        /// Composite effects recurse; `Sequential` gets a driver task that
        /// waits for each step before starting the next.
        #[tracing::instrument(skip(self, effect, tracking), name = "execute_effect")]
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "future").increment(1);
                    self.spawn_tracked(fut, tracking);
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "delay").increment(1);
                    self.spawn_tracked(
                        async move {
                            tokio::time::sleep(duration).await;
                            Some(*action)
                        },
                        tracking,
                    );
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "sequential")
                        .increment(1);

                    let store = self.clone();
                    let scope = tracking.scope.clone();
                    self.spawn_tracked(
                        async move {
                            for (idx, effect) in effects.into_iter().enumerate() {
                                tracing::trace!(
                                    "Executing sequential effect {} of {}",
                                    idx + 1,
                                    effect_count
                                );

                                let (mut step, step_tracking) = EffectHandle::new(scope.clone());
                                store.execute_effect(effect, &step_tracking);
                                drop(step_tracking);
                                step.wait().await;
                            }
                            tracing::trace!("Effect::Sequential completed");
                            None
                        },
                        tracking,
                    );
                },
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => {
                    tracing::trace!(effect_id = %id, cancel_in_flight, "Executing Effect::Cancellable");
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "cancellable")
                        .increment(1);

                    if cancel_in_flight {
                        self.cancel(&id);
                    }
                    self.execute_effect(*effect, &tracking.within(id));
                },
                Effect::Cancel(id) => {
                    tracing::trace!(effect_id = %id, "Executing Effect::Cancel");
                    metrics::counter!(EFFECTS_EXECUTED, "type" => "cancel").increment(1);
                    self.cancel(&id);
                },
            }
        }

        /// Run one effect task
        ///
        /// The task is registered under the tracking's cancellation scope and
        /// counted both in the per-send handle and in the Store's pending
        /// total. Its action is broadcast and dispatched only if the task was
        /// not cancelled.
        fn spawn_tracked<F>(&self, work: F, tracking: &EffectTracking)
        where
            F: Future<Output = Option<A>> + Send + 'static,
        {
            tracking.increment();
            let decrement_guard = DecrementGuard(tracking.clone());

            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let (abort_handle, abort_registration) = AbortHandle::new_pair();
            let registration = self
                .cancellations
                .track(tracking.scope.clone(), &abort_handle);

            let store = self.clone();

            tokio::spawn(async move {
                let _guard = decrement_guard;
                let _pending_guard = pending_guard;

                match Abortable::new(work, abort_registration).await {
                    Ok(Some(action)) => {
                        tracing::trace!("Effect produced an action, sending to store");

                        match store.commit(action, Some(registration)).await {
                            Ok(Some(_)) => {},
                            Ok(None) => {
                                tracing::debug!("Effect cancelled, completion suppressed");
                            },
                            Err(error) => {
                                tracing::debug!(%error, "Dropped effect action");
                            },
                        }
                    },
                    Ok(None) => {
                        drop(registration);
                        tracing::trace!("Effect completed with no action");
                    },
                    Err(_) => {
                        drop(registration);
                        tracing::debug!("Effect cancelled, completion suppressed");
                    },
                }
            });
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                observers: self.observers.clone(),
                state_broadcast: self.state_broadcast.clone(),
                action_broadcast: self.action_broadcast.clone(),
                cancellations: Arc::clone(&self.cancellations),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                config: self.config.clone(),
            }
        }
    }

}

// Re-export for convenience
pub use store::Store;
