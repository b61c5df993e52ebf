//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! reducers: async work, delayed actions and cancellable work.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use reflux_core::async_effect;
///
/// async_effect! {
///     let entries = loader.load_entries(date).await;
///     Some(TimeEntriesAction::EntriesLoaded { date, result: entries })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use reflux_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_millis(300),
///     action: TimeEntriesAction::LoadEntries
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Wrap an effect so it can be cancelled by id
///
/// `cancel_in_flight` defaults to `false` when omitted.
///
/// # Example
///
/// ```rust,ignore
/// use reflux_core::cancellable;
///
/// cancellable! {
///     id: "load-entries",
///     cancel_in_flight: true,
///     effect: load_effect
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        cancel_in_flight: $cancel_in_flight:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: ::std::convert::Into::<$crate::effect::EffectId>::into($id),
            cancel_in_flight: $cancel_in_flight,
            effect: ::std::boxed::Box::new($effect),
        }
    };
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::cancellable! {
            id: $id,
            cancel_in_flight: false,
            effect: $effect
        }
    };
}
