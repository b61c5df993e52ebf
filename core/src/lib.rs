//! # Reflux Core
//!
//! Core traits and types for the Reflux unidirectional state architecture.
//!
//! This crate provides the pure half of the architecture. Nothing in here
//! performs I/O or spawns tasks; the runtime crate owns execution.
//!
//! ## Core Concepts
//!
//! - **State**: Application-defined value, mutated only by a reducer
//! - **Action**: Everything that can happen (user intent, effect results, child actions)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of asynchronous work whose result feeds back as an action
//! - **Environment**: Injected collaborators (loaders, clocks, clients)
//! - **Identified Collection**: Ordered, key-unique collection of child states
//! - **Scoping**: Embedding a child reducer in a parent's state and actions
//!
//! ## Example
//!
//! ```
//! use reflux_core::{smallvec, Effect, Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct CalendarState {
//!     visible: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CalendarAction {
//!     Toggle,
//! }
//!
//! struct CalendarReducer;
//!
//! impl Reducer for CalendarReducer {
//!     type State = CalendarState;
//!     type Action = CalendarAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CalendarState,
//!         action: CalendarAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CalendarAction>; 4]> {
//!         match action {
//!             CalendarAction::Toggle => state.visible = !state.visible,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CalendarState::default();
//! CalendarReducer.reduce(&mut state, CalendarAction::Toggle, &());
//! assert!(state.visible);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer composition: scoping, for-each routing and combination
pub mod composition;

/// Ordered collections keyed by a stable identity
pub mod identified;

/// Declarative macros for building effects
mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TimeEntriesReducer {
    ///     type State = TimeEntriesState;
    ///     type Action = TimeEntriesAction;
    ///     type Environment = TimeEntriesEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut TimeEntriesState,
    ///         action: TimeEntriesAction,
    ///         env: &TimeEntriesEnvironment,
    ///     ) -> SmallVec<[Effect<TimeEntriesAction>; 4]> {
    ///         match action {
    ///             TimeEntriesAction::ToggleCalendar => {
    ///                 state.calendar_visible = !state.calendar_visible;
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// It must not perform I/O, block, or suspend. Work that does any of
        /// those belongs in a returned [`Effect`].
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }

    impl<R> Reducer for Box<R>
    where
        R: Reducer + ?Sized,
    {
        type State = R::State;
        type Action = R::Action;
        type Environment = R::Environment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            (**self).reduce(state, action, env)
        }
    }

    /// Run a reducer in value form: `(State, Action) → (State, Effects)`.
    ///
    /// The input state is consumed and the new state returned, so callers
    /// that keep the previous value can compare the two.
    ///
    /// ```
    /// use reflux_core::{reducer::reduce_value, Effect, Reducer, SmallVec};
    ///
    /// struct Add;
    ///
    /// impl Reducer for Add {
    ///     type State = i64;
    ///     type Action = i64;
    ///     type Environment = ();
    ///
    ///     fn reduce(&self, state: &mut i64, action: i64, _env: &()) -> SmallVec<[Effect<i64>; 4]> {
    ///         *state += action;
    ///         SmallVec::new()
    ///     }
    /// }
    ///
    /// let before = 40;
    /// let (after, effects) = reduce_value(&Add, before, 2, &());
    /// assert_eq!((before, after), (40, 42));
    /// assert!(effects.is_empty());
    /// ```
    pub fn reduce_value<R>(
        reducer: &R,
        mut state: R::State,
        action: R::Action,
        env: &R::Environment,
    ) -> (R::State, SmallVec<[Effect<R::Action>; 4]>)
    where
        R: Reducer + ?Sized,
    {
        let effects = reducer.reduce(&mut state, action, env);
        (state, effects)
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution), composable and cancellable.
pub mod effect {
    use std::borrow::Cow;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Identity used to cancel in-flight effects
    ///
    /// Every effect tagged with the same id (see [`Effect::cancellable`]) can
    /// be cancelled at once with [`Effect::Cancel`].
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(Cow<'static, str>);

    impl EffectId {
        /// Create an id from a static or owned string
        #[must_use]
        pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
            Self(id.into())
        }

        /// Create an id from a string literal, usable in `const` items
        #[must_use]
        pub const fn from_static(id: &'static str) -> Self {
            Self(Cow::Borrowed(id))
        }

        /// The id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<&'static str> for EffectId {
        fn from(id: &'static str) -> Self {
            Self::from_static(id)
        }
    }

    impl From<String> for EffectId {
        fn from(id: String) -> Self {
            Self(Cow::Owned(id))
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially, each one finishing before the next starts
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (one-shot delay-then-produce)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// An effect whose in-flight work can be cancelled by id
        Cancellable {
            /// Cancellation identity shared by every task the inner effect spawns
            id: EffectId,
            /// Cancel earlier effects with the same id before starting this one
            cancel_in_flight: bool,
            /// The wrapped effect
            effect: Box<Effect<Action>>,
        },

        /// Cancel every in-flight effect tagged with this id
        ///
        /// Cancelled effects never dispatch their completion action. Work they
        /// already performed is not undone.
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("cancel_in_flight", cancel_in_flight)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Cancel every in-flight effect tagged with `id`
        #[must_use]
        pub fn cancel(id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancel(id.into())
        }

        /// Tag this effect with a cancellation id
        ///
        /// With `cancel_in_flight`, any effect still running under the same
        /// id is cancelled before this one starts, so only the newest
        /// survives. A cancelled effect's action is never reduced, even when
        /// the effect had already finished and its action was waiting to be
        /// committed.
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>, cancel_in_flight: bool) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                cancel_in_flight,
                effect: Box::new(self),
            }
        }

        /// Whether executing this effect would do nothing at all
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_none)
                },
                Effect::Delay { .. }
                | Effect::Future(_)
                | Effect::Cancellable { .. }
                | Effect::Cancel(_) => false,
            }
        }
    }

    impl<Action> Effect<Action>
    where
        Action: Send + 'static,
    {
        /// Dispatch `action` back into the store as soon as effects run
        #[must_use]
        pub fn send(action: Action) -> Effect<Action> {
            Effect::Future(Box::pin(async move { Some(action) }))
        }

        /// Run a fallible (or infallible) future and turn its output into exactly one action
        ///
        /// This is how effect failures become data: the closure receives the
        /// `Result` and decides which action represents it.
        ///
        /// ```
        /// use reflux_core::Effect;
        ///
        /// #[derive(Debug)]
        /// enum Action {
        ///     Loaded(Result<u32, String>),
        /// }
        ///
        /// let effect = Effect::task(async { Err::<u32, _>("offline".to_string()) }, Action::Loaded);
        /// assert!(matches!(effect, Effect::Future(_)));
        /// ```
        #[must_use]
        pub fn task<T, Fut, F>(future: Fut, into_action: F) -> Effect<Action>
        where
            Fut: Future<Output = T> + Send + 'static,
            F: FnOnce(T) -> Action + Send + 'static,
        {
            Effect::Future(Box::pin(async move { Some(into_action(future.await)) }))
        }

        /// Transform the actions this effect produces
        ///
        /// Used by scoping to lift child effects into parent effects. The
        /// shape of the effect (delays, cancellation ids, ordering) is kept.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            B: Send + 'static,
            F: Fn(Action) -> B + Send + Sync + 'static,
        {
            self.map_shared(Arc::new(f))
        }

        fn map_shared<B>(self, f: Arc<dyn Fn(Action) -> B + Send + Sync>) -> Effect<B>
        where
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects
                        .into_iter()
                        .map(|effect| effect.map_shared(Arc::clone(&f)))
                        .collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects
                        .into_iter()
                        .map(|effect| effect.map_shared(Arc::clone(&f)))
                        .collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(|action| f(action)) }))
                },
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect: Box::new(effect.map_shared(f)),
                },
                Effect::Cancel(id) => Effect::Cancel(id),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[derive(Debug, Clone, PartialEq)]
        enum Child {
            Loaded(u32),
        }

        #[derive(Debug, Clone, PartialEq)]
        enum Parent {
            Child(Child),
        }

        #[test]
        fn test_map_future_lifts_action() {
            let effect = Effect::send(Child::Loaded(3)).map(Parent::Child);

            let Effect::Future(fut) = effect else {
                unreachable!("map keeps the effect shape");
            };

            // A sent action is ready on first poll
            let mut task = tokio_test::task::spawn(fut);
            tokio_test::assert_ready_eq!(task.poll(), Some(Parent::Child(Child::Loaded(3))));
        }

        #[test]
        fn test_map_delay_maps_eagerly() {
            let effect = Effect::Delay {
                duration: Duration::from_millis(5),
                action: Box::new(Child::Loaded(1)),
            }
            .map(Parent::Child);

            match effect {
                Effect::Delay { duration, action } => {
                    assert_eq!(duration, Duration::from_millis(5));
                    assert_eq!(*action, Parent::Child(Child::Loaded(1)));
                },
                other => unreachable!("unexpected effect {other:?}"),
            }
        }

        #[test]
        fn test_map_keeps_cancellation_id() {
            let effect = Effect::send(Child::Loaded(1))
                .cancellable("load", true)
                .map(Parent::Child);

            match effect {
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => {
                    assert_eq!(id, EffectId::from_static("load"));
                    assert!(cancel_in_flight);
                    assert!(matches!(*effect, Effect::Future(_)));
                },
                other => unreachable!("unexpected effect {other:?}"),
            }
        }

        #[test]
        fn test_task_converts_error_into_action() {
            let effect: Effect<Result<u32, String>> =
                Effect::task(async { Err::<u32, String>("offline".into()) }, |result| result);

            let Effect::Future(fut) = effect else {
                unreachable!("task builds a future effect");
            };
            assert_eq!(tokio_test::block_on(fut), Some(Err("offline".to_string())));
        }

        #[test]
        fn test_is_none() {
            assert!(Effect::<Child>::None.is_none());
            assert!(Effect::<Child>::merge(vec![Effect::None, Effect::chain(vec![])]).is_none());
            assert!(!Effect::<Child>::cancel("load").is_none());
            assert!(!Effect::send(Child::Loaded(0)).is_none());
        }

        #[test]
        fn test_effect_id_display() {
            let id = EffectId::new(format!("load-{}", 7));
            assert_eq!(id.to_string(), "load-7");
            assert_eq!(id.as_str(), "load-7");
            assert_eq!(EffectId::from("x"), EffectId::from("x".to_string()));
        }
    }
}

// Re-export commonly used types
pub use composition::{
    combine_reducers, debug_reducer, for_each_reducer, scope_reducer, CasePath, CompositionError, Lens,
    FOR_EACH_MISSING_ELEMENT,
};
pub use effect::{Effect, EffectId};
pub use identified::{Identifiable, IdentifiedVec};
pub use reducer::Reducer;
