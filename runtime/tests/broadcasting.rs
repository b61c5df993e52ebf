//! Integration tests for Store broadcasting
//!
//! Covers the two observation channels of a Store: committed states
//! (synchronous observers and `subscribe_states`) and effect-produced
//! actions (`subscribe_actions`, `send_and_wait_for`).

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use reflux_core::{effect::Effect, reducer::Reducer, smallvec, EffectId, SmallVec};
use reflux_runtime::{Store, StoreError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

const SYNC: EffectId = EffectId::from_static("sync");

#[derive(Debug, Clone, PartialEq)]
enum SyncAction {
    /// Fetch `pages` pages one after another
    StartSync { job: u64, pages: u32 },
    /// One page arrived
    PageFetched { job: u64, page: u32, of: u32 },
    /// Terminal: all pages fetched
    SyncFinished { job: u64 },
    /// Abort the running job
    StopSync,
    /// Local counter change with no effects
    Bump,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct SyncState {
    fetched: Vec<(u64, u32)>,
    finished: Vec<u64>,
    bumps: u32,
}

#[derive(Clone)]
struct SyncEnvironment {
    page_latency: Duration,
}

#[derive(Clone)]
struct SyncReducer;

fn fetch_page(job: u64, page: u32, of: u32, latency: Duration) -> Effect<SyncAction> {
    Effect::Future(Box::pin(async move {
        tokio::time::sleep(latency).await;
        Some(SyncAction::PageFetched { job, page, of })
    }))
    .cancellable(SYNC, false)
}

impl Reducer for SyncReducer {
    type State = SyncState;
    type Action = SyncAction;
    type Environment = SyncEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SyncAction::StartSync { job, pages } => {
                if pages == 0 {
                    return smallvec![Effect::send(SyncAction::SyncFinished { job })];
                }
                smallvec![fetch_page(job, 1, pages, env.page_latency)]
            },
            SyncAction::PageFetched { job, page, of } => {
                state.fetched.push((job, page));
                if page < of {
                    smallvec![fetch_page(job, page + 1, of, env.page_latency)]
                } else {
                    smallvec![Effect::send(SyncAction::SyncFinished { job })]
                }
            },
            SyncAction::SyncFinished { job } => {
                state.finished.push(job);
                smallvec![Effect::None]
            },
            SyncAction::StopSync => smallvec![Effect::cancel(SYNC)],
            SyncAction::Bump => {
                state.bumps += 1;
                SmallVec::new()
            },
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sync_store() -> Store<SyncState, SyncAction, SyncEnvironment, SyncReducer> {
    init_tracing();
    Store::new(
        SyncState::default(),
        SyncReducer,
        SyncEnvironment {
            page_latency: Duration::from_millis(10),
        },
    )
}

// ============================================================================
// Tests
// ============================================================================

/// A multi-step job resolves `send_and_wait_for` only at its terminal action
#[tokio::test(start_paused = true)]
async fn test_send_and_wait_for_multi_step_job() {
    let store = sync_store();

    let result = store
        .send_and_wait_for(
            SyncAction::StartSync { job: 7, pages: 3 },
            |action| matches!(action, SyncAction::SyncFinished { job: 7 }),
            Duration::from_secs(1),
        )
        .await;

    assert_eq!(result, Ok(SyncAction::SyncFinished { job: 7 }));

    let fetched = store.state(|s| s.fetched.clone()).await;
    assert_eq!(fetched, vec![(7, 1), (7, 2), (7, 3)]);
}

/// Concurrent jobs each get their own terminal action
#[tokio::test(start_paused = true)]
async fn test_concurrent_waiters_filter_by_job() {
    let store = sync_store();

    let mut waiters = Vec::new();
    for job in 1..=4 {
        let store = store.clone();
        waiters.push(tokio::spawn(async move {
            store
                .send_and_wait_for(
                    SyncAction::StartSync { job, pages: 2 },
                    move |action| matches!(action, SyncAction::SyncFinished { job: done } if *done == job),
                    Duration::from_secs(1),
                )
                .await
        }));
    }

    for (job, waiter) in (1..=4).zip(waiters) {
        let result = waiter.await.expect("waiter panicked");
        assert_eq!(result, Ok(SyncAction::SyncFinished { job }));
    }

    let mut finished = store.state(|s| s.finished.clone()).await;
    finished.sort_unstable();
    assert_eq!(finished, vec![1, 2, 3, 4]);
}

/// Actions sent by callers are not broadcast, effect actions are, in order
#[tokio::test(start_paused = true)]
async fn test_subscribe_actions_sees_only_effect_actions() {
    let store = sync_store();
    let mut rx = store.subscribe_actions();

    let mut handle = tokio_test::assert_ok!(store.send(SyncAction::StartSync { job: 1, pages: 2 }).await);
    handle.wait().await;

    // The first page's handle only covers page one; wait for the rest
    let finished = tokio::time::timeout(Duration::from_secs(1), async {
        let mut seen = Vec::new();
        loop {
            let action = rx.recv().await.unwrap();
            let done = matches!(action, SyncAction::SyncFinished { .. });
            seen.push(action);
            if done {
                return seen;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(
        finished,
        vec![
            SyncAction::PageFetched { job: 1, page: 1, of: 2 },
            SyncAction::PageFetched { job: 1, page: 2, of: 2 },
            SyncAction::SyncFinished { job: 1 },
        ]
    );
}

/// A cancelled job never broadcasts or dispatches its pending page
#[tokio::test(start_paused = true)]
async fn test_cancelled_effect_is_not_broadcast() {
    let store = sync_store();
    let mut rx = store.subscribe_actions();

    let mut start = store
        .send(SyncAction::StartSync { job: 3, pages: 5 })
        .await
        .unwrap();
    store.send(SyncAction::StopSync).await.unwrap();
    start.wait().await;

    assert!(rx.try_recv().is_err());
    assert_eq!(store.current_state().await, SyncState::default());
}

/// Waiting for an action that never comes times out
#[tokio::test(start_paused = true)]
async fn test_send_and_wait_for_timeout() {
    let store = sync_store();

    let result = store
        .send_and_wait_for(
            SyncAction::Bump,
            |action| matches!(action, SyncAction::SyncFinished { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

/// Observers and state receivers see the same commits in the same order
#[tokio::test]
async fn test_observer_and_state_stream_agree() {
    let store = sync_store();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&observed);
    let _subscription = store.subscribe(move |state: &SyncState| {
        log.lock().unwrap().push(state.bumps);
    });
    let mut states = store.subscribe_states();

    let senders: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.send(SyncAction::Bump).await })
        })
        .collect();
    for sender in senders {
        sender.await.expect("sender panicked").unwrap();
    }

    let mut streamed = Vec::new();
    while let Ok(state) = states.try_recv() {
        streamed.push(state.bumps);
    }

    let observed = observed.lock().unwrap().clone();
    assert_eq!(observed, (1..=8).collect::<Vec<_>>());
    assert_eq!(streamed, observed);
}

/// Several observers are all notified, and each unsubscribes independently
#[tokio::test]
async fn test_multiple_observers_unsubscribe_independently() {
    let store = sync_store();
    let first = Arc::new(Mutex::new(0_u32));
    let second = Arc::new(Mutex::new(0_u32));

    let count = Arc::clone(&first);
    let first_subscription = store.subscribe(move |_: &SyncState| *count.lock().unwrap() += 1);
    let count = Arc::clone(&second);
    let _second_subscription = store.subscribe(move |_: &SyncState| *count.lock().unwrap() += 1);

    store.send(SyncAction::Bump).await.unwrap();
    drop(first_subscription);
    store.send(SyncAction::Bump).await.unwrap();

    assert_eq!(*first.lock().unwrap(), 1);
    assert_eq!(*second.lock().unwrap(), 2);
}

/// A slow state receiver lags instead of blocking commits
#[tokio::test]
async fn test_lagging_state_receiver_does_not_block() {
    let store = Store::with_config(
        SyncState::default(),
        SyncReducer,
        SyncEnvironment {
            page_latency: Duration::from_millis(1),
        },
        reflux_runtime::StoreConfig::default().with_state_broadcast_capacity(2),
    );
    let mut states = store.subscribe_states();

    for _ in 0..5 {
        store.send(SyncAction::Bump).await.unwrap();
    }

    assert!(matches!(
        states.recv().await,
        Err(tokio::sync::broadcast::error::RecvError::Lagged(3))
    ));
    assert_eq!(states.recv().await.map(|s| s.bumps), Ok(4));
    assert_eq!(store.state(|s| s.bumps).await, 5);
}
