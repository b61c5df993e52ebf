//! Reducers of the time entries screen and of the application hosting it.
//!
//! - [`TimeEntryReducer`]: one row; toggles selection
//! - [`TimeEntriesReducer`]: the screen; date, calendar flag, loads, and row
//!   routing through [`for_each_reducer`]
//! - [`app_reducer`]: the application; the screen scoped into [`AppState`]

use crate::environment::TimeEntriesEnvironment;
use crate::types::{
    AppAction, AppState, LoadError, TimeEntriesAction, TimeEntriesState, TimeEntryAction,
    TimeEntryState,
};
use chrono::NaiveDate;
use reflux_core::{
    composition::{combine_reducers, for_each_reducer, scope_reducer, CombinedReducer, ForEachReducer},
    effect::{Effect, EffectId},
    reducer::Reducer,
    smallvec, CasePath, IdentifiedVec, Lens, SmallVec,
};
use std::sync::Arc;

/// Cancellation id shared by every entries load
///
/// Loads are started with `cancel_in_flight`, so a new load supersedes the
/// one still running.
pub const LOAD_ENTRIES_ID: EffectId = EffectId::from_static("time-entries.load");

/// Reducer for a single row
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeEntryReducer;

impl Reducer for TimeEntryReducer {
    type State = TimeEntryState;
    type Action = TimeEntryAction;
    type Environment = TimeEntriesEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TimeEntryAction::Tapped => state.is_selected = !state.is_selected,
        }
        SmallVec::new()
    }
}

fn entries(state: &TimeEntriesState) -> &IdentifiedVec<TimeEntryState> {
    &state.entries
}

fn entries_mut(state: &mut TimeEntriesState) -> &mut IdentifiedVec<TimeEntryState> {
    &mut state.entries
}

fn extract_entry(action: TimeEntriesAction) -> Option<(i64, TimeEntryAction)> {
    match action {
        TimeEntriesAction::Entry { id, action } => Some((id, action)),
        _ => None,
    }
}

fn embed_entry((id, action): (i64, TimeEntryAction)) -> TimeEntriesAction {
    TimeEntriesAction::Entry { id, action }
}

/// Reducer for the time entries screen
#[derive(Clone)]
pub struct TimeEntriesReducer {
    rows: ForEachReducer<TimeEntryReducer, TimeEntriesState, TimeEntriesAction>,
}

impl TimeEntriesReducer {
    /// Creates a new `TimeEntriesReducer`
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: for_each_reducer(
                TimeEntryReducer,
                Lens::new(entries, entries_mut),
                CasePath::new(extract_entry, embed_entry),
            ),
        }
    }

    /// Load the entries of `date`, superseding any load in flight
    fn load_entries(env: &TimeEntriesEnvironment, date: NaiveDate) -> Effect<TimeEntriesAction> {
        let loader = Arc::clone(&env.loader);
        let timeout = env.load_timeout;

        Effect::task(
            async move {
                tokio::time::timeout(timeout, loader.load_entries(date))
                    .await
                    .unwrap_or(Err(LoadError::Timeout))
            },
            move |result| TimeEntriesAction::EntriesLoaded { date, result },
        )
        .cancellable(LOAD_ENTRIES_ID, true)
    }
}

impl Default for TimeEntriesReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimeEntriesReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeEntriesReducer").finish_non_exhaustive()
    }
}

impl Reducer for TimeEntriesReducer {
    type State = TimeEntriesState;
    type Action = TimeEntriesAction;
    type Environment = TimeEntriesEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TimeEntriesAction::ToggleCalendar => {
                state.calendar_visible = !state.calendar_visible;
                SmallVec::new()
            },

            TimeEntriesAction::SetActiveDate(date) => {
                state.active_date = date;
                smallvec![Self::load_entries(env, date)]
            },

            TimeEntriesAction::LoadEntries => {
                smallvec![Self::load_entries(env, state.active_date)]
            },

            TimeEntriesAction::EntriesLoaded { date, result } => {
                if date != state.active_date {
                    tracing::debug!(%date, active_date = %state.active_date, "Ignoring entries for a stale date");
                    return SmallVec::new();
                }

                match result {
                    Ok(loaded) => {
                        state.entries = loaded.into_iter().map(TimeEntryState::new).collect();
                        tracing::debug!(%date, count = state.entries.len(), "Entries loaded");
                    },
                    Err(error) => record_load_failure(date, &error),
                }
                SmallVec::new()
            },

            action @ TimeEntriesAction::Entry { .. } => self.rows.reduce(state, action, env),
        }
    }
}

/// Hook for surfacing a failed load
///
/// The screen keeps showing its previous entries; the failure is only logged
/// and counted here.
pub fn record_load_failure(date: NaiveDate, error: &LoadError) {
    tracing::warn!(%date, error = %error, "Failed to load time entries");
    metrics::counter!("time_entries.load.failed").increment(1);
}

/// The application's own logic, next to the scoped screen
///
/// The application adds nothing to screen actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppCoreReducer;

impl Reducer for AppCoreReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = TimeEntriesEnvironment;

    fn reduce(
        &self,
        _state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::TimeEntries(_) => SmallVec::new(),
        }
    }
}

fn time_entries(state: &AppState) -> &TimeEntriesState {
    &state.time_entries
}

fn time_entries_mut(state: &mut AppState) -> &mut TimeEntriesState {
    &mut state.time_entries
}

#[allow(clippy::unnecessary_wraps)] // Signature fixed by CasePath
fn extract_time_entries(action: AppAction) -> Option<TimeEntriesAction> {
    match action {
        AppAction::TimeEntries(action) => Some(action),
    }
}

/// The application reducer
pub type AppReducer = CombinedReducer<AppState, AppAction, TimeEntriesEnvironment>;

/// Build the application reducer: [`AppCoreReducer`] followed by the
/// time entries screen scoped to `AppState::time_entries`
#[must_use]
pub fn app_reducer() -> AppReducer {
    combine_reducers(vec![
        Box::new(AppCoreReducer),
        Box::new(scope_reducer(
            TimeEntriesReducer::new(),
            Lens::new(time_entries, time_entries_mut),
            CasePath::new(extract_time_entries, AppAction::TimeEntries),
        )),
    ])
}
