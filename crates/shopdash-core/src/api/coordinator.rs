//! Single-flight coordination of token refreshes.
//!
//! `RefreshCoordinator` is the explicit form of the "refresh in progress" flag
//! and the queue of callers waiting on it. The first caller to arrive while
//! idle starts a refresh; everyone who arrives before it settles is queued
//! behind it. When the refresh settles, every queued caller receives the same
//! outcome exactly once. On success each caller also gets a `ReplayTurn`
//! chained to its predecessor's, so replays go out in arrival order on any
//! runtime flavor.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::auth::RefreshError;

pub type RefreshOutcome = Result<String, RefreshError>;

/// What a queued caller receives when the cycle settles.
struct Settled {
    outcome: RefreshOutcome,
    turn: ReplayTurn,
}

type Waiter = oneshot::Sender<Settled>;

enum RefreshState {
    Idle,
    /// Waiters in arrival order; the caller that started the refresh is first.
    Refreshing(Vec<Waiter>),
}

/// A fresh access token plus the caller's place in the replay order.
#[derive(Debug)]
pub struct Refreshed {
    pub token: String,
    pub turn: ReplayTurn,
}

/// Position in the replay chain of one refresh cycle.
///
/// `wait` returns once the caller queued just before this one has released
/// its turn (or gone away). Dropping the turn releases it.
#[derive(Debug)]
pub struct ReplayTurn {
    predecessor: Option<oneshot::Receiver<()>>,
    successor: Option<oneshot::Sender<()>>,
}

impl ReplayTurn {
    pub async fn wait(&mut self) {
        if let Some(predecessor) = self.predecessor.as_mut() {
            // An error means the predecessor was dropped, which also frees the slot
            let _ = predecessor.await;
            self.predecessor = None;
        }
    }

    /// Let the next caller in the chain proceed.
    pub fn release(&mut self) {
        if let Some(successor) = self.successor.take() {
            let _ = successor.send(());
        }
    }
}

impl Drop for ReplayTurn {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), RefreshState::Refreshing(_))
    }

    /// Number of callers waiting on the in-flight refresh (0 when idle).
    pub fn pending(&self) -> usize {
        match &*self.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing(waiters) => waiters.len(),
        }
    }

    /// Wait for a fresh access token.
    ///
    /// If no refresh is running, `refresh` is spawned as the new cycle;
    /// otherwise it is dropped unpolled and the caller joins the queue. The
    /// cycle runs on its own task, so dropping any caller (including the one
    /// that started it) does not strand the others.
    pub async fn refreshed_token<F>(self: &Arc<Self>, refresh: F) -> Result<Refreshed, RefreshError>
    where
        F: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        // Check-and-set and enqueue under one lock acquisition
        let starts_cycle = {
            let mut state = self.lock();
            match &mut *state {
                RefreshState::Refreshing(waiters) => {
                    waiters.push(tx);
                    debug!(queued = waiters.len(), "Refresh in flight, queueing caller");
                    false
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing(vec![tx]);
                    true
                }
            }
        };

        if starts_cycle {
            debug!("Starting refresh cycle");
            let coordinator = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = match AssertUnwindSafe(refresh).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        error!("Refresh task panicked");
                        Err(RefreshError::Abandoned)
                    }
                };
                coordinator.settle(outcome);
            });
        }

        let settled = rx.await.map_err(|_| RefreshError::Abandoned)?;
        settled.outcome.map(|token| Refreshed {
            token,
            turn: settled.turn,
        })
    }

    /// Return to idle and hand `outcome` to every waiter in arrival order,
    /// each turn chained to the one before it.
    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = match std::mem::replace(&mut *self.lock(), RefreshState::Idle) {
            RefreshState::Refreshing(waiters) => waiters,
            RefreshState::Idle => Vec::new(),
        };
        debug!(waiters = waiters.len(), success = outcome.is_ok(), "Refresh cycle settled");

        let mut previous: Option<oneshot::Receiver<()>> = None;
        for waiter in waiters {
            let (next_tx, next_rx) = oneshot::channel();
            let turn = ReplayTurn {
                predecessor: previous.replace(next_rx),
                successor: Some(next_tx),
            };
            // A waiter whose caller went away hands back its turn, and dropping
            // it passes the slot on
            let _ = waiter.send(Settled {
                outcome: outcome.clone(),
                turn,
            });
        }
    }
}
