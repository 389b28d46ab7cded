//! In-flight load coordination.
//!
//! At most one load runs per resource id at any time. The first caller for
//! an id becomes the leader and runs the load on its own thread (the cache
//! does no background scheduling); callers arriving while the load is in
//! flight join it and block until the leader publishes the shared outcome.
//!
//! The in-flight record is unregistered *before* the outcome is published,
//! so a request racing with completion is treated as a fresh load, never
//! joined to the one that just finished. A joiner that stops waiting does
//! not cancel the leader; the result lands in the cache for whoever asks
//! next.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

enum SlotState<T> {
    /// The leader is still running.
    Pending,
    /// The leader published its outcome.
    Done(T),
    /// The leader unwound without publishing; joiners restart as fresh
    /// callers.
    Abandoned,
}

struct Inflight<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Inflight<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        }
    }
}

/// Registry of loads currently in flight, keyed by resource id.
pub(crate) struct InflightLoads<T> {
    pending: Mutex<HashMap<String, Arc<Inflight<T>>>>,
}

/// Unregisters a leader's slot if it unwinds before publishing, so joiners
/// are released and the id is loadable again.
struct LeaderGuard<'a, T> {
    loads: &'a InflightLoads<T>,
    id: &'a str,
    slot: &'a Arc<Inflight<T>>,
    published: bool,
}

impl<T> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        self.loads.pending.lock().unwrap().remove(self.id);
        *self.slot.state.lock().unwrap() = SlotState::Abandoned;
        self.slot.ready.notify_all();
    }
}

impl<T: Clone> InflightLoads<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// True when a load for `id` is currently in flight.
    #[cfg(test)]
    pub fn in_flight(&self, id: &str) -> bool {
        self.pending.lock().unwrap().contains_key(id)
    }

    /// Run `load` for `id`, or join a load already in flight.
    ///
    /// Exactly one concurrent caller per id invokes its `load` closure; every
    /// other caller blocks and receives a clone of the leader's outcome.
    pub fn run_or_join<F>(&self, id: &str, load: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut load = Some(load);
        loop {
            let (slot, is_leader) = {
                let mut pending = self.pending.lock().unwrap();
                match pending.get(id) {
                    Some(slot) => (Arc::clone(slot), false),
                    None => {
                        let slot = Arc::new(Inflight::new());
                        pending.insert(id.to_string(), Arc::clone(&slot));
                        (slot, true)
                    }
                }
            };

            if is_leader {
                let mut guard = LeaderGuard {
                    loads: self,
                    id,
                    slot: &slot,
                    published: false,
                };
                let load = load
                    .take()
                    .expect("loader closure consumed by a previous leadership");
                let outcome = load();

                // Unregister before publishing: a caller arriving from here
                // on starts a fresh load instead of joining this one.
                self.pending.lock().unwrap().remove(id);
                *slot.state.lock().unwrap() = SlotState::Done(outcome.clone());
                guard.published = true;
                slot.ready.notify_all();
                return outcome;
            }

            let mut state = slot.state.lock().unwrap();
            loop {
                match &*state {
                    SlotState::Pending => state = slot.ready.wait(state).unwrap(),
                    SlotState::Done(outcome) => return outcome.clone(),
                    SlotState::Abandoned => break,
                }
            }
            // Leader unwound; retry, possibly becoming the new leader.
        }
    }
}
