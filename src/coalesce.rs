// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Single-flight coalescing of identical concurrent work.
//!
//! The first caller for a key starts the work; callers arriving while it is in
//! flight await the same shared future. The key is released as soon as the
//! leading caller finishes or is dropped, so results are never reused across
//! flights.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

type Flight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

pub struct SingleFlight<K, T, E> {
    inflight: Arc<Mutex<HashMap<K, Flight<T, E>>>>,
}

/// Result of [`SingleFlight::run`].
pub struct FlightOutcome<T, E> {
    pub result: Result<T, E>,
    /// `true` when this caller joined a flight started by another caller.
    pub joined: bool,
}

impl<K, T, E> Clone for SingleFlight<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<K, T, E> Default for SingleFlight<K, T, E> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T, E> SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `start()` for `key`, or join the flight already running for it.
    pub async fn run<F>(&self, key: K, start: F) -> FlightOutcome<T, E>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T, E>>,
    {
        let (flight, leader) = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match inflight.get(&key) {
                Some(existing) => (existing.clone(), None),
                None => {
                    let flight = start().shared();
                    inflight.insert(key.clone(), flight.clone());
                    let guard = LeaderGuard {
                        key,
                        inflight: &self.inflight,
                    };
                    (flight, Some(guard))
                }
            }
        };

        let joined = leader.is_none();
        let result = flight.await;
        drop(leader);

        FlightOutcome { result, joined }
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct LeaderGuard<'a, K: Eq + Hash, T, E> {
    key: K,
    inflight: &'a Mutex<HashMap<K, Flight<T, E>>>,
}

impl<K: Eq + Hash, T, E> Drop for LeaderGuard<'_, K, T, E> {
    fn drop(&mut self) {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
