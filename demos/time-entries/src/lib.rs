//! Time entries example for the Reflux architecture.
//!
//! A screen lists the time entries recorded on a selected date, with a
//! calendar overlay flag and selectable rows. It demonstrates:
//!
//! - Loading through an injected [`EntryLoader`] with `Effect::task`
//! - Superseding loads with `cancel_in_flight` and ignoring stale results
//! - Row state in an [`IdentifiedVec`](reflux_core::IdentifiedVec) driven by `for_each_reducer`
//! - Scoping the screen into an application state with `scope_reducer`
//!
//! # Quick Start
//!
//! ```no_run
//! use reflux_runtime::Store;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use time_entries::{
//!     StubEntryLoader, TimeEntriesAction, TimeEntriesEnvironment, TimeEntriesReducer,
//!     TimeEntriesState,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = Arc::new(StubEntryLoader::new(Duration::from_millis(300), 3));
//! let env = TimeEntriesEnvironment::new(loader);
//! let today = chrono::Local::now().date_naive();
//! let store = Store::new(TimeEntriesState::new(today), TimeEntriesReducer::new(), env);
//!
//! let mut handle = store.send(TimeEntriesAction::LoadEntries).await?;
//! handle.wait().await;
//!
//! let count = store.state(|s| s.entries.len()).await;
//! println!("Loaded {count} entries");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod environment;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, DemoConfig};
pub use environment::{EntryLoader, StubEntryLoader, TimeEntriesEnvironment};
pub use reducer::{
    app_reducer, record_load_failure, AppCoreReducer, AppReducer, TimeEntriesReducer,
    TimeEntryReducer, LOAD_ENTRIES_ID,
};
pub use types::{
    AppAction, AppState, Entry, LoadError, TimeEntriesAction, TimeEntriesState, TimeEntryAction,
    TimeEntryState,
};
