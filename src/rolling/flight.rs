// ABOUTME: Single-flight guard: at most one in-progress operation per key.
// ABOUTME: The key is released when the returned guard is dropped.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

pub struct SingleFlight<K: Eq + Hash> {
    in_flight: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> SingleFlight<K> {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Claim `key`, or `None` if another holder already has it.
    pub fn try_acquire(&self, key: K) -> Option<FlightGuard<K>> {
        let mut set = self.in_flight.lock();
        if !set.insert(key.clone()) {
            return None;
        }
        Some(FlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key: Some(key),
        })
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.lock().contains(key)
    }
}

impl<K: Eq + Hash + Clone> Default for SingleFlight<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> fmt::Debug for SingleFlight<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}

pub struct FlightGuard<K: Eq + Hash> {
    in_flight: Arc<Mutex<HashSet<K>>>,
    key: Option<K>,
}

impl<K: Eq + Hash> Drop for FlightGuard<K> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.in_flight.lock().remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let flights = SingleFlight::new();
        let guard = flights.try_acquire("ingest").unwrap();
        assert!(flights.try_acquire("ingest").is_none());
        assert!(flights.is_in_flight(&"ingest"));

        drop(guard);
        assert!(!flights.is_in_flight(&"ingest"));
        assert!(flights.try_acquire("ingest").is_some());
    }

    #[test]
    fn keys_are_independent() {
        let flights = SingleFlight::new();
        let _a = flights.try_acquire(("ingest", 1)).unwrap();
        assert!(flights.try_acquire(("ingest", 2)).is_some());
    }
}
