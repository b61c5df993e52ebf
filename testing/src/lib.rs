//! # Reflux Testing
//!
//! Testing utilities and helpers for the Reflux architecture.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then tests of a reducer in isolation
//! - [`TestStore`]: Exhaustive, step-by-step Store that asserts every state change
//!   and every effect action
//! - [`assertions`]: Helpers for inspecting returned effects
//! - [`helpers`]: Waiting on a runtime Store and test logging
//!
//! ## Example
//!
//! ```ignore
//! use reflux_testing::TestStore;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_date_change_reloads() {
//!     let mut store = TestStore::new(TimeEntriesState::new(d0), TimeEntriesReducer, env);
//!
//!     store.send(TimeEntriesAction::SetActiveDate(d1), |state| state.active_date = d1);
//!     store
//!         .receive_matching(
//!             |action| matches!(action, TimeEntriesAction::EntriesLoaded { .. }),
//!             |state| state.entries = rows(&[7, 9]),
//!         )
//!         .await;
//!     store.finish();
//! }
//! ```

mod reducer_test;
mod test_store;

pub use reducer_test::{assertions, ReducerTest};
pub use test_store::TestStore;

/// Test helpers and utilities.
pub mod helpers {
    use reflux_core::reducer::Reducer;
    use reflux_runtime::{Store, StoreError};
    use std::time::Duration;
    use tokio::sync::broadcast::error::RecvError;

    /// Wait until the Store commits a state matching `predicate`
    ///
    /// The current state is checked first, so a state committed before the
    /// call is not missed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching state is committed in time
    /// - [`StoreError::ChannelClosed`] if the state stream closes
    pub async fn wait_for_state<S, A, E, R, P>(
        store: &Store<S, A, E, R>,
        predicate: P,
        timeout: Duration,
    ) -> Result<S, StoreError>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        P: Fn(&S) -> bool,
    {
        // Subscribe before reading so no commit falls in between
        let mut states = store.subscribe_states();

        let current = store.current_state().await;
        if predicate(&current) {
            return Ok(current);
        }

        tokio::time::timeout(timeout, async {
            loop {
                match states.recv().await {
                    Ok(state) if predicate(&state) => return Ok(state),
                    Ok(_) | Err(RecvError::Lagged(_)) => {},
                    Err(RecvError::Closed) => return Err(StoreError::ChannelClosed),
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
