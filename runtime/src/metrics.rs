//! Metric names and descriptions for observability.
//!
//! The Store and the composition layer emit through the [`metrics`] facade.
//! Nothing is exported from here: install any `metrics` recorder in the
//! application, then call [`register_metrics`] so the recorder knows what
//! each series means.
//!
//! # Example
//!
//! ```rust
//! use reflux_runtime::metrics;
//!
//! // Without a recorder installed this is a no-op
//! metrics::register_metrics();
//! ```

use metrics::{describe_counter, describe_histogram, Unit};

/// Actions received by `Store::send`
pub const COMMANDS_TOTAL: &str = "store.commands.total";
/// Time spent inside the reducer per action
pub const REDUCER_DURATION: &str = "store.reducer.duration_seconds";
/// Effects returned by the reducer per action
pub const EFFECTS_PER_ACTION: &str = "store.effects.count";
/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "store.effects.executed";
/// Effect tasks aborted through a cancellation id
pub const EFFECTS_CANCELLED: &str = "store.effects.cancelled";
/// Shutdowns requested
pub const SHUTDOWN_INITIATED: &str = "store.shutdown.initiated";
/// Shutdowns that drained every effect in time
pub const SHUTDOWN_COMPLETED: &str = "store.shutdown.completed";
/// Shutdowns that gave up with effects still running
pub const SHUTDOWN_TIMEOUT: &str = "store.shutdown.timeout";
/// Actions rejected because the Store was shutting down
pub const SHUTDOWN_REJECTED: &str = "store.shutdown.rejected_actions";
/// Element actions addressed to an id missing from the collection
pub use reflux_core::FOR_EACH_MISSING_ELEMENT;

/// Every metric name this workspace emits
pub const ALL: [&str; 10] = [
    COMMANDS_TOTAL,
    REDUCER_DURATION,
    EFFECTS_PER_ACTION,
    EFFECTS_EXECUTED,
    EFFECTS_CANCELLED,
    SHUTDOWN_INITIATED,
    SHUTDOWN_COMPLETED,
    SHUTDOWN_TIMEOUT,
    SHUTDOWN_REJECTED,
    FOR_EACH_MISSING_ELEMENT,
];

/// Register all metric descriptions with the installed recorder.
pub fn register_metrics() {
    // Store
    describe_counter!(COMMANDS_TOTAL, "Total number of actions sent to stores");
    describe_histogram!(
        REDUCER_DURATION,
        Unit::Seconds,
        "Time taken to reduce one action"
    );
    describe_histogram!(
        EFFECTS_PER_ACTION,
        Unit::Count,
        "Number of effects returned by the reducer for one action"
    );

    // Effects
    describe_counter!(
        EFFECTS_EXECUTED,
        "Total number of effects executed, by effect type"
    );
    describe_counter!(
        EFFECTS_CANCELLED,
        "Total number of in-flight effect tasks cancelled"
    );

    // Shutdown
    describe_counter!(SHUTDOWN_INITIATED, "Total number of shutdowns initiated");
    describe_counter!(
        SHUTDOWN_COMPLETED,
        "Total number of shutdowns that drained all effects"
    );
    describe_counter!(
        SHUTDOWN_TIMEOUT,
        "Total number of shutdowns that timed out with effects running"
    );
    describe_counter!(
        SHUTDOWN_REJECTED,
        "Total number of actions rejected during shutdown"
    );

    // Composition
    describe_counter!(
        FOR_EACH_MISSING_ELEMENT,
        "Total number of element actions addressed to a missing element"
    );
}
