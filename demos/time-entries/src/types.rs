//! Domain types for the time entries screen.
//!
//! The screen shows the entries recorded on one date. Changing the date
//! reloads them; each loaded entry becomes a selectable row.

use chrono::NaiveDate;
use reflux_core::{Identifiable, IdentifiedVec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A recorded time entry, as returned by an [`EntryLoader`](crate::EntryLoader)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identity of the entry
    pub id: i64,
}

/// Errors a load of entries can end with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The loader could not produce entries
    #[error("Entries unavailable: {0}")]
    Unavailable(String),

    /// The loader did not answer in time
    #[error("Loading entries timed out")]
    Timeout,
}

/// One row of the list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntryState {
    /// The entry shown by this row
    pub entry: Entry,
    /// Whether the row is selected
    pub is_selected: bool,
}

impl TimeEntryState {
    /// An unselected row for `entry`
    #[must_use]
    pub const fn new(entry: Entry) -> Self {
        Self {
            entry,
            is_selected: false,
        }
    }
}

impl Identifiable for TimeEntryState {
    type Id = i64;

    fn id(&self) -> i64 {
        self.entry.id
    }
}

/// Actions of a single row
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeEntryAction {
    /// The row was tapped; toggles its selection
    Tapped,
}

/// State of the time entries screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeEntriesState {
    /// Date whose entries are shown
    pub active_date: NaiveDate,
    /// Whether the calendar overlay is shown
    pub calendar_visible: bool,
    /// Rows for the entries of `active_date`, in load order
    pub entries: IdentifiedVec<TimeEntryState>,
}

impl TimeEntriesState {
    /// Empty screen for `active_date`, calendar hidden
    #[must_use]
    pub fn new(active_date: NaiveDate) -> Self {
        Self {
            active_date,
            calendar_visible: false,
            entries: IdentifiedVec::new(),
        }
    }

    /// Ids of the loaded entries, in display order
    pub fn entry_ids(&self) -> Vec<i64> {
        self.entries.ids().collect()
    }

    /// Ids of the selected rows, in display order
    pub fn selected_ids(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter(|row| row.is_selected)
            .map(|row| row.entry.id)
            .collect()
    }
}

/// Actions of the time entries screen
#[derive(Clone, Debug, PartialEq)]
pub enum TimeEntriesAction {
    /// Show or hide the calendar overlay
    ToggleCalendar,

    /// The user picked another date
    SetActiveDate(NaiveDate),

    /// Load the entries of the active date (screen appeared, refresh)
    LoadEntries,

    /// A load finished
    EntriesLoaded {
        /// The date the load was issued for
        date: NaiveDate,
        /// Loaded entries or the failure
        result: Result<Vec<Entry>, LoadError>,
    },

    /// An action of the row with this id
    Entry {
        /// Row id
        id: i64,
        /// The row's action
        action: TimeEntryAction,
    },
}

/// Application state; hosts the time entries screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// The time entries screen
    pub time_entries: TimeEntriesState,
}

impl AppState {
    /// Application starting on `active_date`
    #[must_use]
    pub fn new(active_date: NaiveDate) -> Self {
        Self {
            time_entries: TimeEntriesState::new(active_date),
        }
    }
}

/// Application actions
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// An action of the time entries screen
    TimeEntries(TimeEntriesAction),
}
