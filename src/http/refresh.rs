//! Single-flight guard for token refresh.
//!
//! The first request to hit a 401 while no refresh is running becomes the
//! leader and gets a [`RefreshLease`]. Requests that fail while the lease is
//! held become followers: each is parked in a FIFO queue as a `oneshot`
//! receiver. Settling the lease drains the queue and clears the in-flight
//! latch under one lock, so the queue is never observed non-empty while the
//! latch is clear.
//!
//! A request whose token was rotated while it was on the wire does not need a
//! refresh at all. [`RefreshGate::enter`] decides that under the same lock, so
//! a refresh that settles between the check and the claim cannot start a
//! second one.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::AuthError;

pub type RefreshOutcome = Result<(), AuthError>;

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Debug, Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

pub enum Ticket<'a> {
    Leader(RefreshLease<'a>),
    Follower(oneshot::Receiver<RefreshOutcome>),
    /// The credential already changed; re-send without refreshing.
    Replay,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the refresh, join the queue behind the one in flight, or
    /// replay when `rotated` reports that the rejected token is stale.
    ///
    /// `rotated` runs under the gate lock and only while idle. A leader
    /// stores its new token before settling, so an idle gate always sees
    /// the outcome of the last refresh.
    pub fn enter(&self, rotated: impl FnOnce() -> bool) -> Ticket<'_> {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            tracing::debug!(queued = state.waiters.len(), "Request queued behind token refresh");
            Ticket::Follower(rx)
        } else if rotated() {
            Ticket::Replay
        } else {
            state.in_flight = true;
            Ticket::Leader(RefreshLease {
                gate: self,
                settled: false,
            })
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    pub fn queued(&self) -> usize {
        self.lock().waiters.len()
    }

    fn finish(&self, outcome: RefreshOutcome) -> usize {
        let mut state = self.lock();
        let waiters = std::mem::take(&mut state.waiters);
        let drained = waiters.len();
        for waiter in waiters {
            // A follower that was dropped no longer needs an answer.
            let _ = waiter.send(outcome.clone());
        }
        state.in_flight = false;
        drained
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by the leader for the duration of a refresh.
///
/// Dropping an unsettled lease settles it with
/// [`AuthError::RefreshAbandoned`] so followers are never stranded.
pub struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Resolve or reject every queued follower in FIFO order, then release
    /// the latch. Returns how many followers were drained.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.gate.finish(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Token refresh dropped before settling");
            self.gate.finish(Err(AuthError::RefreshAbandoned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(gate: &RefreshGate) -> RefreshLease<'_> {
        match gate.enter(|| false) {
            Ticket::Leader(lease) => lease,
            _ => panic!("expected to lead"),
        }
    }

    fn follower(gate: &RefreshGate) -> oneshot::Receiver<RefreshOutcome> {
        match gate.enter(|| false) {
            Ticket::Follower(rx) => rx,
            _ => panic!("expected to follow"),
        }
    }

    #[test]
    fn first_entrant_leads_rest_follow() {
        let gate = RefreshGate::new();
        let lease = leader(&gate);
        assert!(gate.is_in_flight());
        let _a = follower(&gate);
        let _b = follower(&gate);
        assert_eq!(gate.queued(), 2);
        assert_eq!(lease.settle(Ok(())), 2);
        assert!(!gate.is_in_flight());
        assert_eq!(gate.queued(), 0);
    }

    #[tokio::test]
    async fn success_resolves_all_followers() {
        let gate = RefreshGate::new();
        let lease = leader(&gate);
        let rxs: Vec<_> = (0..4).map(|_| follower(&gate)).collect();
        lease.settle(Ok(()));
        for rx in rxs {
            assert_eq!(rx.await.unwrap(), Ok(()));
        }
    }

    #[tokio::test]
    async fn failure_rejects_all_followers_with_same_error() {
        let gate = RefreshGate::new();
        let lease = leader(&gate);
        let a = follower(&gate);
        let b = follower(&gate);
        let err = AuthError::InvalidRefreshToken("expired".into());
        lease.settle(Err(err.clone()));
        assert_eq!(a.await.unwrap(), Err(err.clone()));
        assert_eq!(b.await.unwrap(), Err(err));
    }

    #[test]
    fn drain_is_fifo() {
        let gate = RefreshGate::new();
        let lease = leader(&gate);
        let mut rxs: Vec<_> = (0..3).map(|_| follower(&gate)).collect();
        lease.settle(Ok(()));
        // Senders fire in enqueue order; every receiver is ready afterwards.
        for rx in rxs.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), Ok(()));
        }
    }

    #[tokio::test]
    async fn dropped_lease_abandons_followers() {
        let gate = RefreshGate::new();
        let lease = leader(&gate);
        let rx = follower(&gate);
        drop(lease);
        assert_eq!(rx.await.unwrap(), Err(AuthError::RefreshAbandoned));
        assert!(!gate.is_in_flight());
    }

    #[test]
    fn gate_reusable_after_settle() {
        let gate = RefreshGate::new();
        leader(&gate).settle(Ok(()));
        let lease = leader(&gate);
        lease.settle(Err(AuthError::NoRefreshToken));
        assert!(!gate.is_in_flight());
    }

    #[test]
    fn dropped_follower_does_not_block_drain() {
        let gate = RefreshGate::new();
        let lease = leader(&gate);
        drop(follower(&gate));
        let rx = follower(&gate);
        assert_eq!(lease.settle(Ok(())), 2);
        drop(rx);
    }

    #[test]
    fn rotated_token_replays_only_when_idle() {
        let gate = RefreshGate::new();
        assert!(matches!(gate.enter(|| true), Ticket::Replay));
        assert!(!gate.is_in_flight());

        let lease = leader(&gate);
        // While a refresh runs, a stale request queues instead.
        assert!(matches!(
            gate.enter(|| panic!("not consulted while in flight")),
            Ticket::Follower(_)
        ));
        lease.settle(Ok(()));
    }

    #[test]
    fn settled_refresh_is_seen_by_next_entrant() {
        let gate = RefreshGate::new();
        let token = std::sync::Mutex::new("old");
        let lease = leader(&gate);
        *token.lock().unwrap() = "new";
        lease.settle(Ok(()));

        let sent = "old";
        let ticket = gate.enter(|| *token.lock().unwrap() != sent);
        assert!(matches!(ticket, Ticket::Replay));
        assert!(!gate.is_in_flight());
    }
}
