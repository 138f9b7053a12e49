// model = "claude-opus-4-5"
// created = 2026-02-01
// modified = 2026-10-14
// driver = "Isaac Clayton"

//! Clock primitives for tracking causality.
//!
//! # Timestamp
//!
//! A Lamport clock tagged with the client that owns it. When two
//! timestamps have different counters, the lower one happened before or
//! concurrently; equal counters are ordered by client id so the order is
//! total. Timestamps never decide where a character goes in the text.
//!
//! Complexity:
//! - increment: O(1)
//! - update: O(1)
//! - compare: O(len(client_id))
//!
//! # Version Vector
//!
//! Highest counter seen from each client. Used to answer "which
//! operations does this replica not have yet".
//!
//! Complexity:
//! - observe: O(1)
//! - merge: O(n) where n is number of clients
//! - compare: O(n)

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Serialize;

/// A Lamport timestamp.
///
/// - Increments on local events (`increment`)
/// - Updates to max(local, remote) + 1 on receiving operations (`update`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    counter: u64,
    client_id: String,
}

impl Timestamp {
    /// Create a new timestamp starting at 0.
    pub fn new(client_id: impl Into<String>) -> Timestamp {
        return Timestamp { counter: 0, client_id: client_id.into() };
    }

    /// Create a timestamp with a specific counter.
    pub fn with_counter(client_id: impl Into<String>, counter: u64) -> Timestamp {
        return Timestamp { counter, client_id: client_id.into() };
    }

    #[inline]
    pub fn counter(&self) -> u64 {
        return self.counter;
    }

    #[inline]
    pub fn client_id(&self) -> &str {
        return &self.client_id;
    }

    /// Increment the counter for a local event.
    /// Returns the new counter.
    #[inline]
    pub fn increment(&mut self) -> u64 {
        self.counter += 1;
        return self.counter;
    }

    /// Update upon receiving a remote timestamp.
    /// Sets the counter to max(local, remote) + 1.
    /// Returns the new counter.
    #[inline]
    pub fn update(&mut self, other: &Timestamp) -> u64 {
        self.counter = self.counter.max(other.counter) + 1;
        return self.counter;
    }

    /// Catch up with another timestamp without counting an event.
    /// Sets the counter to max(local, other).
    #[inline]
    pub fn merge(&mut self, other: &Timestamp) {
        self.counter = self.counter.max(other.counter);
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.counter.cmp(&other.counter) {
            Ordering::Equal => self.client_id.cmp(&other.client_id),
            other => other,
        }
    }
}

/// Highest counter observed per client.
///
/// Absent clients count as 0, so `{a: 0}` equals `{}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VersionVector {
    entries: FxHashMap<String, u64>,
}

impl VersionVector {
    pub fn new() -> VersionVector {
        return VersionVector { entries: FxHashMap::default() };
    }

    /// Highest counter seen from `client_id`.
    pub fn get(&self, client_id: &str) -> u64 {
        return self.entries.get(client_id).copied().unwrap_or(0);
    }

    /// Record a timestamp.
    pub fn observe(&mut self, timestamp: &Timestamp) {
        if let Some(entry) = self.entries.get_mut(timestamp.client_id()) {
            *entry = (*entry).max(timestamp.counter());
            return;
        }
        self.entries.insert(timestamp.client_id().to_string(), timestamp.counter());
    }

    /// Whether the operation stamped `(client_id, counter)` is covered.
    pub fn includes(&self, client_id: &str, counter: u64) -> bool {
        return counter <= self.get(client_id);
    }

    /// Pointwise maximum.
    pub fn merge(&mut self, other: &VersionVector) {
        for (client, counter) in &other.entries {
            let entry = self.entries.entry(client.clone()).or_insert(0);
            *entry = (*entry).max(*counter);
        }
    }

    /// True if every entry of self is <= the matching entry of other,
    /// and at least one is strictly less.
    pub fn happens_before(&self, other: &VersionVector) -> bool {
        let mut strictly_less = false;

        for (client, counter) in &self.entries {
            let theirs = other.get(client);
            if *counter > theirs {
                return false;
            }
            if *counter < theirs {
                strictly_less = true;
            }
        }

        for (client, counter) in &other.entries {
            if !self.entries.contains_key(client) && *counter > 0 {
                strictly_less = true;
            }
        }

        return strictly_less;
    }

    /// Neither vector happens-before the other and they differ.
    pub fn concurrent_with(&self, other: &VersionVector) -> bool {
        return !self.happens_before(other) && !other.happens_before(self) && self != other;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        return self.entries.iter().map(|(client, counter)| (client.as_str(), *counter));
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }
}

impl PartialEq for VersionVector {
    fn eq(&self, other: &Self) -> bool {
        let covers = |a: &VersionVector, b: &VersionVector| {
            a.entries.iter().all(|(client, counter)| b.get(client) == *counter)
        };
        return covers(self, other) && covers(other, self);
    }
}

impl Eq for VersionVector {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_increment() {
        let mut ts = Timestamp::new("alice");
        assert_eq!(ts.counter(), 0);

        assert_eq!(ts.increment(), 1);
        assert_eq!(ts.increment(), 2);
        assert_eq!(ts.counter(), 2);
    }

    #[test]
    fn timestamp_update() {
        let mut ts = Timestamp::new("alice");
        ts.increment(); // 1

        // Receive an operation stamped 5
        assert_eq!(ts.update(&Timestamp::with_counter("bob", 5)), 6);

        // Receive an older one
        assert_eq!(ts.update(&Timestamp::with_counter("bob", 3)), 7);
        assert_eq!(ts.client_id(), "alice");
    }

    #[test]
    fn timestamp_merge_does_not_tick() {
        let mut a = Timestamp::with_counter("alice", 5);
        a.merge(&Timestamp::with_counter("bob", 10));
        assert_eq!(a.counter(), 10);

        a.merge(&Timestamp::with_counter("bob", 2));
        assert_eq!(a.counter(), 10);
    }

    #[test]
    fn timestamp_ordering() {
        let a = Timestamp::with_counter("bob", 1);
        let b = Timestamp::with_counter("alice", 2);
        let c = Timestamp::with_counter("bob", 2);

        assert!(a < b); // counter first
        assert!(b < c); // then client id
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn version_vector_observe() {
        let mut version = VersionVector::new();
        assert_eq!(version.get("alice"), 0);

        version.observe(&Timestamp::with_counter("alice", 3));
        version.observe(&Timestamp::with_counter("alice", 1));
        assert_eq!(version.get("alice"), 3);
        assert!(version.includes("alice", 3));
        assert!(!version.includes("alice", 4));
        assert!(!version.includes("bob", 1));
    }

    #[test]
    fn version_vector_merge() {
        let mut a = VersionVector::new();
        let mut b = VersionVector::new();
        a.observe(&Timestamp::with_counter("alice", 2));
        b.observe(&Timestamp::with_counter("bob", 3));
        b.observe(&Timestamp::with_counter("alice", 1));

        a.merge(&b);

        assert_eq!(a.get("alice"), 2);
        assert_eq!(a.get("bob"), 3);
    }

    #[test]
    fn version_vector_happens_before() {
        let mut a = VersionVector::new();
        let mut b = VersionVector::new();
        a.observe(&Timestamp::with_counter("alice", 1));
        b.observe(&Timestamp::with_counter("alice", 1));
        b.observe(&Timestamp::with_counter("bob", 1));

        assert!(a.happens_before(&b));
        assert!(!b.happens_before(&a));
    }

    #[test]
    fn version_vector_concurrent() {
        let mut a = VersionVector::new();
        let mut b = VersionVector::new();
        a.observe(&Timestamp::with_counter("alice", 1));
        b.observe(&Timestamp::with_counter("bob", 1));

        assert!(a.concurrent_with(&b));
        assert!(!a.happens_before(&b));
    }

    #[test]
    fn version_vector_zero_entries_are_absent() {
        let mut a = VersionVector::new();
        a.observe(&Timestamp::with_counter("alice", 0));
        assert_eq!(a, VersionVector::new());
        assert!(!a.concurrent_with(&VersionVector::new()));
    }
}
