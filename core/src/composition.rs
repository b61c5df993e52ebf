//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Run a child reducer on a sub-region of parent state,
//!   translating child actions and effects to parent ones
//! - **`for_each_reducer`**: Run an element reducer on one element of an
//!   [`IdentifiedVec`], addressed by id
//! - **`debug_reducer`**: Log every action and resulting state of a reducer
//!
//! Sub-state is reached through a [`Lens`], child actions through a
//! [`CasePath`]. Both are plain `fn` pointer pairs, so composed reducers stay
//! `Copy`-cheap and need no reflection.
//!
//! # Examples
//!
//! ## Scoping a child reducer
//!
//! ```
//! use reflux_core::{CasePath, Effect, Lens, Reducer, SmallVec};
//! use reflux_core::composition::scope_reducer;
//!
//! #[derive(Clone, Debug, Default)]
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
//!     fn reduce(&self, state: &mut Self::State, action: Self::Action, _env: &Self::Environment) -> SmallVec<[Effect<Self::Action>; 4]> {
//!         match action {
//!             CalendarAction::Toggle => state.visible = !state.visible,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default)]
//! struct ScreenState {
//!     calendar: CalendarState,
//!     title: String,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ScreenAction {
//!     Calendar(CalendarAction),
//!     Rename(String),
//! }
//!
//! let scoped = scope_reducer(
//!     CalendarReducer,
//!     Lens::new(
//!         |screen: &ScreenState| &screen.calendar,
//!         |screen: &mut ScreenState| &mut screen.calendar,
//!     ),
//!     CasePath::new(
//!         |action: ScreenAction| match action {
//!             ScreenAction::Calendar(action) => Some(action),
//!             ScreenAction::Rename(_) => None,
//!         },
//!         ScreenAction::Calendar,
//!     ),
//! );
//!
//! let mut state = ScreenState::default();
//! scoped.reduce(&mut state, ScreenAction::Calendar(CalendarAction::Toggle), &());
//! assert!(state.calendar.visible);
//!
//! // Actions outside the scope are ignored
//! scoped.reduce(&mut state, ScreenAction::Rename("Entries".into()), &());
//! assert!(state.title.is_empty());
//! ```

use crate::effect::Effect;
use crate::identified::{Identifiable, IdentifiedVec};
use crate::reducer::Reducer;
use smallvec::SmallVec;
use thiserror::Error;

/// Counter bumped when a for-each action addresses a missing element
pub const FOR_EACH_MISSING_ELEMENT: &str = "composition.for_each.missing_element";

/// Errors reported while routing an action through a composed reducer
///
/// These are recoverable: the [`Reducer`] implementations log them and
/// produce no effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    /// A for-each action addressed an element that is not in the collection
    ///
    /// Typically the element was removed while an effect for it was in flight.
    #[error("No element with id {id} in the collection")]
    ElementNotFound {
        /// Debug rendering of the missing id
        id: String,
    },
}

/// A pure accessor pair focusing on a part `T` of a whole `S`
///
/// `get` reads the part; `get_mut` provides the write path, from which
/// [`Lens::set`] is derived.
pub struct Lens<S, T> {
    get: fn(&S) -> &T,
    get_mut: fn(&mut S) -> &mut T,
}

impl<S, T> Lens<S, T> {
    /// Create a lens from a read accessor and a write accessor
    #[must_use]
    pub const fn new(get: fn(&S) -> &T, get_mut: fn(&mut S) -> &mut T) -> Self {
        Self { get, get_mut }
    }

    /// Read the focused part
    pub fn get<'a>(&self, whole: &'a S) -> &'a T {
        (self.get)(whole)
    }

    /// Mutable access to the focused part
    pub fn get_mut<'a>(&self, whole: &'a mut S) -> &'a mut T {
        (self.get_mut)(whole)
    }

    /// Replace the focused part, leaving the rest of `whole` untouched
    pub fn set(&self, whole: &mut S, part: T) {
        *(self.get_mut)(whole) = part;
    }
}

impl<S, T> Clone for Lens<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for Lens<S, T> {}

impl<S, T> std::fmt::Debug for Lens<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lens").finish_non_exhaustive()
    }
}

/// A pure prism between a parent action `A` and a child action `C`
///
/// `extract` returns the child action when the parent action carries one;
/// `embed` wraps a child action (usually an enum variant constructor).
pub struct CasePath<A, C> {
    extract: fn(A) -> Option<C>,
    embed: fn(C) -> A,
}

impl<A, C> CasePath<A, C> {
    /// Create a case path from an extractor and an embedding
    #[must_use]
    pub const fn new(extract: fn(A) -> Option<C>, embed: fn(C) -> A) -> Self {
        Self { extract, embed }
    }

    /// The child action carried by `action`, if any
    pub fn extract(&self, action: A) -> Option<C> {
        (self.extract)(action)
    }

    /// Wrap a child action as a parent action
    pub fn embed(&self, child: C) -> A {
        (self.embed)(child)
    }
}

impl<A, C> Clone for CasePath<A, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, C> Copy for CasePath<A, C> {}

impl<A, C> std::fmt::Debug for CasePath<A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasePath").finish_non_exhaustive()
    }
}

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
/// This is useful when you want to split reducer logic across multiple implementations,
/// for example a parent's own logic next to its scoped children.
///
/// # Examples
///
/// ```
/// use reflux_core::{Reducer, Effect, SmallVec};
/// use reflux_core::composition::combine_reducers;
///
/// #[derive(Clone)]
/// struct AppState {
///     counter: i32,
///     logged: bool,
/// }
///
/// #[derive(Clone)]
/// enum AppAction {
///     Increment,
///     Log,
/// }
///
/// struct CounterReducer;
/// struct LoggingReducer;
///
/// impl Reducer for CounterReducer {
///     type State = AppState;
///     type Action = AppAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut Self::State, action: Self::Action, _env: &Self::Environment) -> SmallVec<[Effect<Self::Action>; 4]> {
///         if matches!(action, AppAction::Increment) {
///             state.counter += 1;
///         }
///         SmallVec::new()
///     }
/// }
///
/// impl Reducer for LoggingReducer {
///     type State = AppState;
///     type Action = AppAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut Self::State, action: Self::Action, _env: &Self::Environment) -> SmallVec<[Effect<Self::Action>; 4]> {
///         if matches!(action, AppAction::Log) {
///             state.logged = true;
///         }
///         SmallVec::new()
///     }
/// }
///
/// let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(LoggingReducer)]);
///
/// let mut state = AppState { counter: 0, logged: false };
/// let _ = combined.reduce(&mut state, AppAction::Increment, &());
/// assert_eq!(state.counter, 1);
/// ```
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer {
        reducers: std::sync::Arc::new(reducers),
    }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`]. Cloning shares the underlying reducers.
pub struct CombinedReducer<S, A, E> {
    #[allow(clippy::type_complexity)] // Boxed trait objects behind a shared list
    reducers: std::sync::Arc<Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>>,
}

impl<S, A, E> Clone for CombinedReducer<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            reducers: std::sync::Arc::clone(&self.reducers),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in self.reducers.iter() {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a child reducer to a sub-region of a larger state and action.
///
/// When the parent action extracts to a child action, the child reducer runs
/// against the lensed sub-state and its effects are lifted back into parent
/// actions with the case path's `embed`. Other parent actions produce
/// nothing.
///
/// The child shares the parent's environment.
pub const fn scope_reducer<R, S, A>(
    reducer: R,
    lens: Lens<S, R::State>,
    case: CasePath<A, R::Action>,
) -> ScopedReducer<R, S, A>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        lens,
        case,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<R, S, A>
where
    R: Reducer,
{
    reducer: R,
    lens: Lens<S, R::State>,
    case: CasePath<A, R::Action>,
}

impl<R, S, A> Clone for ScopedReducer<R, S, A>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            lens: self.lens,
            case: self.case,
        }
    }
}

impl<R, S, A> Reducer for ScopedReducer<R, S, A>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = self.case.extract(action) else {
            return SmallVec::new();
        };

        let child_state = self.lens.get_mut(state);
        let embed = self.case.embed;

        self.reducer
            .reduce(child_state, child_action, env)
            .into_iter()
            .map(|effect| effect.map(embed))
            .collect()
    }
}

/// Runs an element reducer on one element of an identified collection.
///
/// Parent actions that extract to `(id, child_action)` are routed to the
/// element with that id. Only that element is touched, in place. Effects are
/// lifted back with `embed((id, child_action))`, so their results come back
/// to the same element.
///
/// An action for an id no longer in the collection is a recoverable miss:
/// [`ForEachReducer::try_reduce`] reports [`CompositionError::ElementNotFound`],
/// the [`Reducer`] implementation logs it and does nothing.
pub const fn for_each_reducer<R, S, A>(
    reducer: R,
    lens: Lens<S, IdentifiedVec<R::State>>,
    case: CasePath<A, (<R::State as Identifiable>::Id, R::Action)>,
) -> ForEachReducer<R, S, A>
where
    R: Reducer,
    R::State: Identifiable,
{
    ForEachReducer {
        reducer,
        lens,
        case,
    }
}

/// An element reducer lifted over an identified collection.
///
/// Created by [`for_each_reducer`].
pub struct ForEachReducer<R, S, A>
where
    R: Reducer,
    R::State: Identifiable,
{
    reducer: R,
    lens: Lens<S, IdentifiedVec<R::State>>,
    case: CasePath<A, (<R::State as Identifiable>::Id, R::Action)>,
}

impl<R, S, A> Clone for ForEachReducer<R, S, A>
where
    R: Reducer + Clone,
    R::State: Identifiable,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            lens: self.lens,
            case: self.case,
        }
    }
}

impl<R, S, A> ForEachReducer<R, S, A>
where
    R: Reducer,
    R::State: Identifiable,
    <R::State as Identifiable>::Id: Send + Sync + 'static,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    /// Route `action` to its element, reporting a missing element as an error
    ///
    /// Actions that are not element actions yield no effects.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::ElementNotFound`] when the addressed id is
    /// not in the collection. The state is left unchanged in that case.
    pub fn try_reduce(
        &self,
        state: &mut S,
        action: A,
        env: &R::Environment,
    ) -> Result<SmallVec<[Effect<A>; 4]>, CompositionError> {
        let Some((id, child_action)) = self.case.extract(action) else {
            return Ok(SmallVec::new());
        };

        let Some(element) = self.lens.get_mut(state).get_mut(&id) else {
            return Err(CompositionError::ElementNotFound {
                id: format!("{id:?}"),
            });
        };

        let effects = self.reducer.reduce(element, child_action, env);
        debug_assert_eq!(
            element.id(),
            id,
            "element reducer must not change the element's identity"
        );

        let embed = self.case.embed;
        Ok(effects
            .into_iter()
            .map(|effect| {
                let id = id.clone();
                effect.map(move |child_action| embed((id.clone(), child_action)))
            })
            .collect())
    }
}

impl<R, S, A> Reducer for ForEachReducer<R, S, A>
where
    R: Reducer,
    R::State: Identifiable,
    <R::State as Identifiable>::Id: Send + Sync + 'static,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match self.try_reduce(state, action, env) {
            Ok(effects) => effects,
            Err(error) => {
                tracing::warn!(error = %error, "Dropped element action");
                metrics::counter!(FOR_EACH_MISSING_ELEMENT).increment(1);
                SmallVec::new()
            },
        }
    }
}

/// Wraps a reducer so every action and the state it produces are logged
///
/// Logging happens at `debug` level under the given `name`, after the
/// wrapped reducer ran. Effects pass through unchanged.
pub const fn debug_reducer<R>(reducer: R, name: &'static str) -> DebugReducer<R>
where
    R: Reducer,
{
    DebugReducer { reducer, name }
}

/// A reducer that logs actions and resulting states.
///
/// Created by [`debug_reducer`].
#[derive(Clone, Debug)]
pub struct DebugReducer<R> {
    reducer: R,
    name: &'static str,
}

impl<R> Reducer for DebugReducer<R>
where
    R: Reducer,
    R::State: std::fmt::Debug,
    R::Action: std::fmt::Debug,
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
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return self.reducer.reduce(state, action, env);
        }

        let received = format!("{action:?}");
        let effects = self.reducer.reduce(state, action, env);

        tracing::debug!(
            reducer = self.name,
            action = %received,
            state = ?state,
            effects = effects.len(),
            "Reduced action"
        );

        effects
    }
}
