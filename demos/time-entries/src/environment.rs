//! Injected dependencies of the time entries screen.

use crate::types::{Entry, LoadError};
use chrono::NaiveDate;
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Source of the entries recorded on a date
///
/// Implementations report failures as [`LoadError`]; the reducer turns the
/// outcome into an `EntriesLoaded` action either way.
pub trait EntryLoader: Send + Sync {
    /// Load the entries recorded on `date`
    fn load_entries(
        &self,
        date: NaiveDate,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Entry>, LoadError>> + Send + '_>>;
}

/// Loader that fabricates entries after a fixed delay
///
/// Each load yields `count` entries with random ids, or fails with
/// [`LoadError::Unavailable`] with probability `failure_rate`.
#[derive(Clone, Debug)]
pub struct StubEntryLoader {
    delay: Duration,
    count: usize,
    failure_rate: f64,
}

impl StubEntryLoader {
    /// Stub answering after `delay` with `count` entries
    #[must_use]
    pub const fn new(delay: Duration, count: usize) -> Self {
        Self {
            delay,
            count,
            failure_rate: 0.0,
        }
    }

    /// Fail loads with probability `failure_rate` (clamped to `0.0..=1.0`, NaN means never)
    #[must_use]
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        self
    }
}

impl EntryLoader for StubEntryLoader {
    fn load_entries(
        &self,
        date: NaiveDate,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Entry>, LoadError>> + Send + '_>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;

            let mut rng = rand::thread_rng();
            if rng.gen_bool(self.failure_rate) {
                return Err(LoadError::Unavailable(format!("stub failure for {date}")));
            }

            let entries: Vec<Entry> = (0..self.count).map(|_| Entry { id: rng.r#gen() }).collect();
            tracing::debug!(%date, count = entries.len(), "Stub loaded entries");
            Ok(entries)
        })
    }
}

/// Environment of the time entries reducers
#[derive(Clone)]
pub struct TimeEntriesEnvironment {
    /// Where entries are loaded from
    pub loader: Arc<dyn EntryLoader>,
    /// Upper bound on a single load
    pub load_timeout: Duration,
}

impl TimeEntriesEnvironment {
    /// Default bound on a single load
    pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

    /// Environment loading through `loader`
    #[must_use]
    pub fn new(loader: Arc<dyn EntryLoader>) -> Self {
        Self {
            loader,
            load_timeout: Self::DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// Bound every load by `load_timeout`
    #[must_use]
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }
}

impl std::fmt::Debug for TimeEntriesEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeEntriesEnvironment")
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}
