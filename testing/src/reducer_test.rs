//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use reflux_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Several `when_action` calls reduce the actions in order; effect
/// assertions then see the effects of every action, concatenated.
///
/// # Example
///
/// ```ignore
/// use reflux_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(TimeEntriesReducer)
///     .with_env(test_environment())
///     .given_state(TimeEntriesState::new(d0))
///     .when_action(TimeEntriesAction::SetActiveDate(d1))
///     .then_state(move |state| assert_eq!(state.active_date, d1))
///     .then_effects(|effects| assertions::assert_has_cancellable_effect(effects, &LOAD_ENTRIES_ID))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to reduce in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Assert the resulting state equals `expected` (Then)
    #[must_use]
    pub fn then_state_eq(self, expected: S) -> Self
    where
        S: PartialEq + std::fmt::Debug + 'static,
    {
        self.then_state(move |state| assert_eq!(state, &expected))
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, actions, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects.extend(self.reducer.reduce(&mut state, action, &env));
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use reflux_core::effect::{Effect, EffectId};

    fn contains<A>(effects: &[Effect<A>], found: &dyn Fn(&Effect<A>) -> bool) -> bool {
        effects.iter().any(|effect| {
            found(effect)
                || match effect {
                    Effect::Parallel(children) | Effect::Sequential(children) => {
                        contains(children, found)
                    },
                    Effect::Cancellable { effect, .. } => contains(std::slice::from_ref(&**effect), found),
                    _ => false,
                }
        })
    }

    /// Assert that executing the effects would do nothing
    ///
    /// # Panics
    ///
    /// Panics if any effect does work.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect, at any depth
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            contains(effects, &|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Delay effect, at any depth
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            contains(effects, &|e| matches!(e, Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }

    /// Assert that some effect is tagged with cancellation id `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Cancellable` effect with that id is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancellable_effect<A: std::fmt::Debug>(effects: &[Effect<A>], id: &EffectId) {
        assert!(
            contains(effects, &|e| matches!(e, Effect::Cancellable { id: found, .. } if found == id)),
            "Expected an effect cancellable by {id}, found {effects:?}"
        );
    }

    /// Assert that the effects cancel `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Cancel` effect for that id is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A: std::fmt::Debug>(effects: &[Effect<A>], id: &EffectId) {
        assert!(
            contains(effects, &|e| matches!(e, Effect::Cancel(found) if found == id)),
            "Expected a cancellation of {id}, found {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflux_core::effect::{Effect, EffectId};
    use reflux_core::reducer::Reducer;
    use reflux_core::{smallvec, SmallVec};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    struct CounterState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum CounterAction {
        Increment,
        Decrement,
        IncrementLater,
        StopTimers,
    }

    const TIMER: EffectId = EffectId::from_static("timer");

    struct CounterReducer;

    struct CounterEnv;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = CounterEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                CounterAction::Decrement => {
                    state.count -= 1;
                    SmallVec::new()
                },
                CounterAction::IncrementLater => smallvec![Effect::merge(vec![
                    Effect::Delay {
                        duration: Duration::from_secs(1),
                        action: Box::new(CounterAction::Increment),
                    }
                    .cancellable(TIMER, false)
                ])],
                CounterAction::StopTimers => smallvec![Effect::cancel(TIMER)],
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(CounterReducer)
            .with_env(CounterEnv)
            .given_state(CounterState { count: 0 })
            .when_action(CounterAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_several_actions() {
        ReducerTest::new(CounterReducer)
            .with_env(CounterEnv)
            .given_state(CounterState { count: 5 })
            .when_actions([CounterAction::Decrement, CounterAction::Decrement])
            .when_action(CounterAction::Increment)
            .then_state_eq(CounterState { count: 4 })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_nested_effect_assertions() {
        ReducerTest::new(CounterReducer)
            .with_env(CounterEnv)
            .given_state(CounterState { count: 0 })
            .when_action(CounterAction::IncrementLater)
            .when_action(CounterAction::StopTimers)
            .then_state_eq(CounterState { count: 0 })
            .then_effects(|effects| {
                assertions::assert_has_delay_effect(effects);
                assertions::assert_has_cancellable_effect(effects, &TIMER);
                assertions::assert_cancels(effects, &TIMER);
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "Expected at least one Future effect")]
    fn test_missing_future_effect_fails() {
        assertions::assert_has_future_effect::<CounterAction>(&[Effect::None]);
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<CounterAction>(&[Effect::None]);
        assertions::assert_no_effects::<CounterAction>(&[]);
        assertions::assert_no_effects::<CounterAction>(&[Effect::merge(vec![Effect::None])]);
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<CounterAction>::None], 1);
        assertions::assert_effects_count::<CounterAction>(&[], 0);
    }
}
