//! Step-by-step Store for exhaustive tests
//!
//! `TestStore` runs a reducer the way the runtime Store does, but makes the
//! test drive every step: each sent action must state how the state changes,
//! and every action an effect produces must be received explicitly.

#![allow(clippy::module_name_repetitions)]

use reflux_core::effect::{Effect, EffectId};
use reflux_core::reducer::Reducer;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

type Work<A> = Pin<Box<dyn Future<Output = Option<A>> + Send>>;

/// An effect scheduled but not yet received
struct InFlight<A> {
    scope: Vec<EffectId>,
    work: Work<A>,
}

/// Store that asserts on every state change and every effect action
///
/// Effects are awaited in the order they were scheduled, one per
/// [`TestStore::receive`] call. A `Sequential` effect's steps are queued in
/// order, so each step starts only after the previous one was received.
/// Cancellation (`Effect::Cancel` and `cancel_in_flight`) drops queued
/// effects, exactly as the runtime suppresses their completion.
///
/// # Example
///
/// ```ignore
/// let mut store = TestStore::new(TimeEntriesState::new(d0), TimeEntriesReducer, env);
///
/// store.send(TimeEntriesAction::SetActiveDate(d1), |state| state.active_date = d1);
/// store
///     .receive_matching(
///         |action| matches!(action, TimeEntriesAction::EntriesLoaded { .. }),
///         |state| state.entries = rows(&[7, 9]),
///     )
///     .await;
/// store.finish();
/// ```
pub struct TestStore<R>
where
    R: Reducer,
{
    reducer: R,
    environment: R::Environment,
    state: R::State,
    in_flight: VecDeque<InFlight<R::Action>>,
    timeout: Duration,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: Debug + Send + 'static,
{
    /// Create a test store
    #[must_use]
    pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
        Self {
            reducer,
            environment,
            state: initial_state,
            in_flight: VecDeque::new(),
            timeout: Duration::from_secs(1),
        }
    }

    /// How long `receive` waits for an effect before failing
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current state
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// Number of scheduled effects not yet received
    pub fn pending_effects(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of scheduled effects tagged with `id`
    pub fn effects_in_flight(&self, id: &EffectId) -> usize {
        self.in_flight
            .iter()
            .filter(|effect| effect.scope.contains(id))
            .count()
    }

    /// Send an action and assert the resulting state
    ///
    /// `update` receives a copy of the state before the action and must turn
    /// it into the state the reducer is expected to produce.
    ///
    /// # Panics
    ///
    /// Panics if the reduced state differs from the expected state.
    #[allow(clippy::panic)] // Test assertion
    pub fn send<F>(&mut self, action: R::Action, update: F)
    where
        F: FnOnce(&mut R::State),
    {
        let description = format!("{action:?}");
        self.reduce(action, update, &description);
    }

    /// Await the next scheduled effect and assert the action it produces
    ///
    /// Effects that complete without an action are skipped.
    ///
    /// # Panics
    ///
    /// Panics if nothing is in flight, if the effect doesn't finish within
    /// the timeout, if the action differs from `expected`, or if the state
    /// doesn't match.
    #[allow(clippy::panic)] // Test assertion
    pub async fn receive<F>(&mut self, expected: R::Action, update: F)
    where
        R::Action: PartialEq,
        F: FnOnce(&mut R::State),
    {
        let action = self.next_action().await;
        assert_eq!(action, expected, "Received an unexpected action");

        let description = format!("{action:?}");
        self.reduce(action, update, &description);
    }

    /// Await the next scheduled effect and assert its action matches `predicate`
    ///
    /// Returns the received action.
    ///
    /// # Panics
    ///
    /// Same conditions as [`TestStore::receive`], with the predicate in place
    /// of the equality check.
    #[allow(clippy::panic)] // Test assertion
    pub async fn receive_matching<P, F>(&mut self, predicate: P, update: F) -> R::Action
    where
        R::Action: Clone,
        P: FnOnce(&R::Action) -> bool,
        F: FnOnce(&mut R::State),
    {
        let action = self.next_action().await;
        let description = format!("{action:?}");
        assert!(predicate(&action), "Received an unexpected action: {description}");

        self.reduce(action.clone(), update, &description);
        action
    }

    /// Drop every scheduled effect without running it
    pub fn skip_in_flight_effects(&mut self) {
        self.in_flight.clear();
    }

    /// Assert that every scheduled effect was received
    ///
    /// # Panics
    ///
    /// Panics if effects are still in flight.
    #[allow(clippy::panic)] // Test assertion
    pub fn finish(self) {
        assert!(
            self.in_flight.is_empty(),
            "{} effect(s) still in flight; receive them or skip_in_flight_effects()",
            self.in_flight.len()
        );
    }

    #[allow(clippy::panic)] // Test assertion
    fn reduce<F>(&mut self, action: R::Action, update: F, description: &str)
    where
        F: FnOnce(&mut R::State),
    {
        let mut expected = self.state.clone();
        update(&mut expected);

        let effects = self.reducer.reduce(&mut self.state, action, &self.environment);
        assert_eq!(
            self.state, expected,
            "State after {description} does not match the expected state"
        );

        for effect in effects {
            self.schedule(effect, &[]);
        }
    }

    #[allow(clippy::panic)] // Test assertion
    async fn next_action(&mut self) -> R::Action {
        loop {
            let Some(next) = self.in_flight.pop_front() else {
                panic!("Expected an effect action, but no effects are in flight");
            };

            match tokio::time::timeout(self.timeout, next.work).await {
                Ok(Some(action)) => return action,
                Ok(None) => {},
                Err(_) => panic!("Effect did not complete within {:?}", self.timeout),
            }
        }
    }

    fn schedule(&mut self, effect: Effect<R::Action>, scope: &[EffectId]) {
        match effect {
            Effect::None => {},
            Effect::Future(work) => self.in_flight.push_back(InFlight {
                scope: scope.to_vec(),
                work,
            }),
            Effect::Delay { duration, action } => self.in_flight.push_back(InFlight {
                scope: scope.to_vec(),
                work: Box::pin(async move {
                    tokio::time::sleep(duration).await;
                    Some(*action)
                }),
            }),
            Effect::Parallel(effects) | Effect::Sequential(effects) => {
                for effect in effects {
                    self.schedule(effect, scope);
                }
            },
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => {
                if cancel_in_flight {
                    self.cancel(&id);
                }
                let mut scope = scope.to_vec();
                scope.push(id);
                self.schedule(*effect, &scope);
            },
            Effect::Cancel(id) => self.cancel(&id),
        }
    }

    fn cancel(&mut self, id: &EffectId) {
        self.in_flight.retain(|effect| !effect.scope.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflux_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, PartialEq, Default)]
    struct SearchState {
        query: String,
        results: Vec<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum SearchAction {
        QueryChanged(String),
        ResultsArrived(Vec<String>),
        Clear,
        Steps,
        Step(u8),
    }

    const SEARCH: EffectId = EffectId::from_static("search");

    struct SearchReducer;

    impl Reducer for SearchReducer {
        type State = SearchState;
        type Action = SearchAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut SearchState,
            action: SearchAction,
            _env: &(),
        ) -> SmallVec<[Effect<SearchAction>; 4]> {
            match action {
                SearchAction::QueryChanged(query) => {
                    state.query.clone_from(&query);
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(300),
                        action: Box::new(SearchAction::ResultsArrived(vec![format!("{query}!")])),
                    }
                    .cancellable(SEARCH, true)]
                },
                SearchAction::ResultsArrived(results) => {
                    state.results = results;
                    SmallVec::new()
                },
                SearchAction::Clear => {
                    state.query.clear();
                    state.results.clear();
                    smallvec![Effect::cancel(SEARCH)]
                },
                SearchAction::Steps => smallvec![Effect::chain(vec![
                    Effect::send(SearchAction::Step(1)),
                    Effect::None,
                    Effect::send(SearchAction::Step(2)),
                ])],
                SearchAction::Step(step) => {
                    state.results.push(step.to_string());
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> TestStore<SearchReducer> {
        TestStore::new(SearchState::default(), SearchReducer, ())
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_receive() {
        let mut store = store();

        store.send(SearchAction::QueryChanged("rust".into()), |state| {
            state.query = "rust".into();
        });
        store
            .receive(SearchAction::ResultsArrived(vec!["rust!".into()]), |state| {
                state.results = vec!["rust!".into()];
            })
            .await;

        store.finish();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_in_flight_drops_older_effect() {
        let mut store = store();

        store.send(SearchAction::QueryChanged("ru".into()), |state| {
            state.query = "ru".into();
        });
        store.send(SearchAction::QueryChanged("rust".into()), |state| {
            state.query = "rust".into();
        });
        assert_eq!(store.effects_in_flight(&SEARCH), 1);

        let received = store
            .receive_matching(
                |action| matches!(action, SearchAction::ResultsArrived(_)),
                |state| state.results = vec!["rust!".into()],
            )
            .await;
        assert_eq!(received, SearchAction::ResultsArrived(vec!["rust!".into()]));

        store.finish();
    }

    #[tokio::test]
    async fn test_cancel_drops_effect() {
        let mut store = store();

        store.send(SearchAction::QueryChanged("x".into()), |state| {
            state.query = "x".into();
        });
        store.send(SearchAction::Clear, |state| state.query.clear());

        assert_eq!(store.pending_effects(), 0);
        store.finish();
    }

    #[tokio::test]
    async fn test_sequential_steps_arrive_in_order() {
        let mut store = store();

        store.send(SearchAction::Steps, |_| {});
        store
            .receive(SearchAction::Step(1), |state| state.results.push("1".into()))
            .await;
        store
            .receive(SearchAction::Step(2), |state| state.results.push("2".into()))
            .await;

        assert_eq!(store.state().results, vec!["1", "2"]);
        store.finish();
    }

    #[test]
    #[should_panic(expected = "does not match the expected state")]
    fn test_wrong_expectation_fails() {
        let mut store = store();
        store.send(SearchAction::QueryChanged("a".into()), |state| {
            state.query = "b".into();
        });
    }

    #[test]
    #[should_panic(expected = "still in flight")]
    fn test_finish_requires_receiving_effects() {
        let mut store = store();
        store.send(SearchAction::QueryChanged("a".into()), |state| {
            state.query = "a".into();
        });
        store.finish();
    }

    #[test]
    fn test_skip_in_flight_effects() {
        let mut store = store();
        store.send(SearchAction::QueryChanged("a".into()), |state| {
            state.query = "a".into();
        });
        store.skip_in_flight_effects();
        store.finish();
    }
}
