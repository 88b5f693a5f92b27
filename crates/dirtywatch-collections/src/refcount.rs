#![forbid(unsafe_code)]

//! Per-wrapper subscription reference counts.
//!
//! # Invariants
//!
//! 1. An entry exists iff its count is positive.
//! 2. The count for an element equals the number of slots in the owning
//!    wrapper that hold it.
//! 3. The handler is attached to an element iff its count is positive:
//!    attach happens on the 0 → 1 transition, detach on 1 → 0.
//! 4. Elements whose `subscription_key` is `None` are never counted.

use std::fmt;

use ahash::AHashMap;
use dirtywatch_core::{Element, Handler};

/// Slot counts for the trackable elements held by one wrapper.
pub struct SubscriptionCounts<K> {
    counts: AHashMap<K, usize>,
}

impl<K> Default for SubscriptionCounts<K> {
    fn default() -> Self {
        Self {
            counts: AHashMap::new(),
        }
    }
}

impl<K: Eq + std::hash::Hash> SubscriptionCounts<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more slot holding `element`, attaching `handler` if this is
    /// the first.
    pub fn retain<E: Element<Key = K>>(&mut self, element: &E, handler: &Handler) {
        let Some(key) = element.subscription_key() else {
            return;
        };
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        if *count == 1 {
            element.attach(handler);
            tracing::trace!(message = "refcount.attach", tracked = self.counts.len());
        }
    }

    /// Count one fewer slot holding `element`, detaching `handler` if that
    /// was the last.
    pub fn release<E: Element<Key = K>>(&mut self, element: &E, handler: &Handler) {
        let Some(key) = element.subscription_key() else {
            return;
        };
        let Some(count) = self.counts.get_mut(&key) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&key);
            element.detach(handler);
            tracing::trace!(message = "refcount.detach", tracked = self.counts.len());
        }
    }

    /// Current slot count for `element`.
    #[must_use]
    pub fn count_of<E: Element<Key = K>>(&self, element: &E) -> usize {
        element
            .subscription_key()
            .and_then(|key| self.counts.get(&key).copied())
            .unwrap_or(0)
    }

    /// Number of distinct elements currently attached.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.counts.len()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

impl<K> fmt::Debug for SubscriptionCounts<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionCounts")
            .field("tracked", &self.counts.len())
            .finish()
    }
}
