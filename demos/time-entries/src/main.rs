//! Time entries example binary
//!
//! Runs the time entries screen twice, side by side: scoped inside the
//! application state, and directly in its own store. Every committed state of
//! both stores is printed.

use anyhow::Context;
use chrono::{Days, Local};
use reflux_core::composition::debug_reducer;
use reflux_runtime::{metrics::register_metrics, Store};
use std::sync::Arc;
use time_entries::{
    app_reducer, AppAction, AppState, DemoConfig, StubEntryLoader, TimeEntriesAction,
    TimeEntriesEnvironment, TimeEntriesReducer, TimeEntriesState, TimeEntryAction,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn describe(state: &TimeEntriesState) -> String {
    format!(
        "{} | calendar {} | entries {:?} | selected {:?}",
        state.active_date,
        if state.calendar_visible { "shown" } else { "hidden" },
        state.entry_ids(),
        state.selected_ids(),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DemoConfig::from_env().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .context("Invalid log filter")?,
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    register_metrics();

    println!("=== Time Entries Example: Reflux Architecture ===\n");

    let loader = Arc::new(
        StubEntryLoader::new(config.load_delay, config.entries_per_load)
            .with_failure_rate(config.failure_rate),
    );
    let env = TimeEntriesEnvironment::new(loader).with_load_timeout(config.load_timeout);
    let start = config.start_date.unwrap_or_else(|| Local::now().date_naive());

    let scoped = Store::new(AppState::new(start), app_reducer(), env.clone());
    let direct = Store::new(
        TimeEntriesState::new(start),
        debug_reducer(TimeEntriesReducer::new(), "time_entries"),
        env,
    );

    let _scoped_log = scoped.subscribe(|state: &AppState| {
        println!("  [scoped] {}", describe(&state.time_entries));
    });
    let _direct_log = direct.subscribe(|state: &TimeEntriesState| {
        println!("  [direct] {}", describe(state));
    });

    let next_day = start
        .checked_add_days(Days::new(1))
        .context("Start date has no next day")?;
    let day_after = start
        .checked_add_days(Days::new(2))
        .context("Start date has no day after next")?;

    // (label, action, wait for its effects before the next step)
    let steps = [
        ("Screen appeared", TimeEntriesAction::LoadEntries, true),
        ("Open calendar", TimeEntriesAction::ToggleCalendar, true),
        ("Pick next day", TimeEntriesAction::SetActiveDate(next_day), false),
        ("Pick the day after, superseding the load", TimeEntriesAction::SetActiveDate(day_after), true),
        ("Close calendar", TimeEntriesAction::ToggleCalendar, true),
    ];

    for (label, action, wait) in steps {
        println!("\n>>> {label}: {action:?}");
        let mut scoped_handle = scoped.send(AppAction::TimeEntries(action.clone())).await?;
        let mut direct_handle = direct.send(action).await?;

        if wait {
            scoped_handle.wait().await;
            direct_handle.wait().await;
        }
    }

    if let Some(id) = direct.state(|s| s.entry_ids().first().copied()).await {
        println!("\n>>> Tap row {id} (direct)");
        let _ = direct
            .send(TimeEntriesAction::Entry {
                id,
                action: TimeEntryAction::Tapped,
            })
            .await?;
    }

    println!("\n>>> Shutting down");
    scoped
        .shutdown(config.load_timeout)
        .await
        .context("Scoped store did not drain")?;
    direct
        .shutdown(config.load_timeout)
        .await
        .context("Direct store did not drain")?;

    let scoped_state = scoped.current_state().await;
    let direct_state = direct.current_state().await;
    println!("\nFinal scoped: {}", describe(&scoped_state.time_entries));
    println!("Final direct: {}", describe(&direct_state));

    println!("\n=== Example Complete ===");
    println!("\nKey concepts demonstrated:");
    println!("  • Effect::task: the load result becomes an EntriesLoaded action");
    println!("  • cancel_in_flight: a new date supersedes the load still running");
    println!("  • for_each_reducer: row taps reach exactly one row by id");
    println!("  • scope_reducer: the same screen embedded in the application state");

    Ok(())
}
