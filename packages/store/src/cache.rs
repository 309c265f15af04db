//! # Client-side cache with TTL and optimistic updates
//!
//! [`OptimisticCache`] holds one value fetched from the server, remembers when the
//! server last confirmed it, and supports the optimistic mutation protocol:
//!
//! 1. [`apply`](OptimisticCache::apply) snapshots the current value and applies the
//!    local change immediately, returning a [`Snapshot`];
//! 2. on success, [`confirm`](OptimisticCache::confirm) consumes the snapshot and folds
//!    the server's answer into the value;
//! 3. on failure, [`rollback`](OptimisticCache::rollback) restores the snapshot exactly.
//!
//! Freshness is a plain TTL measured from the last [`replace`](OptimisticCache::replace).
//! A zero TTL means the value is never considered fresh.

use std::time::{Duration, Instant};

/// State captured before an optimistic change.
#[must_use = "a snapshot must be confirmed or rolled back"]
#[derive(Debug)]
pub struct Snapshot<T> {
    value: T,
    confirmed_at: Option<Instant>,
}

#[derive(Clone, Debug)]
pub struct OptimisticCache<T> {
    value: T,
    confirmed_at: Option<Instant>,
    ttl: Duration,
    pending: usize,
}

impl<T: Clone> OptimisticCache<T> {
    /// A cache holding `value` that has never been confirmed by the server.
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            confirmed_at: None,
            ttl,
            pending: 0,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        !self.ttl.is_zero()
            && self
                .confirmed_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.ttl)
    }

    /// Number of optimistic changes still awaiting confirmation.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn invalidate(&mut self) {
        self.confirmed_at = None;
    }

    /// Store a value freshly fetched from the server.
    pub fn replace(&mut self, value: T) {
        self.replace_at(value, Instant::now());
    }

    pub fn replace_at(&mut self, value: T, now: Instant) {
        self.value = value;
        self.confirmed_at = Some(now);
    }

    pub fn apply(&mut self, change: impl FnOnce(&mut T)) -> Snapshot<T> {
        let snapshot = Snapshot {
            value: self.value.clone(),
            confirmed_at: self.confirmed_at,
        };
        change(&mut self.value);
        self.pending += 1;
        snapshot
    }

    pub fn confirm(&mut self, snapshot: Snapshot<T>, confirmed: impl FnOnce(&mut T)) {
        drop(snapshot);
        confirmed(&mut self.value);
        self.pending = self.pending.saturating_sub(1);
    }

    pub fn rollback(&mut self, snapshot: Snapshot<T>) {
        self.value = snapshot.value;
        self.confirmed_at = snapshot.confirmed_at;
        self.pending = self.pending.saturating_sub(1);
    }
}
