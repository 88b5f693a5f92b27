//! Unique-element-set wrapper.
//!
//! Elements are unique, so no count table is needed: an element is attached
//! exactly while it is a member. Every mutating call (including the set
//! algebra) fires at most once, and only when membership actually changed.
//! The predicates are pure queries.
//!
//! For trackable elements prefer [`ById`](dirtywatch_core::ById): it hashes by
//! allocation, so an element's own mutations cannot move it between buckets.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use dirtywatch_core::{Attachable, Element, Handler, Result, TrackError};

use crate::TrackedCollection;

/// A `HashSet` whose membership changes are reported to an owner callback.
pub struct TrackedSet<T: Element> {
    items: HashSet<T>,
    on_change: Handler,
}

fn enter<T: Element>(item: &T, handler: &Handler) {
    item.attach(handler);
    if item.subscription_key().is_some() {
        tracing::trace!(message = "set.attach");
    }
}

fn leave<T: Element>(item: &T, handler: &Handler) {
    item.detach(handler);
    if item.subscription_key().is_some() {
        tracing::trace!(message = "set.detach");
    }
}

impl<T: Element + Eq + Hash> TrackedSet<T> {
    #[must_use]
    pub fn new(on_change: Handler) -> Self {
        Self::with_items(on_change, HashSet::new())
    }

    /// Adopt `items`, attaching to every trackable member. Does not fire.
    #[must_use]
    pub fn with_items(on_change: Handler, items: HashSet<T>) -> Self {
        for item in &items {
            enter(item, &on_change);
        }
        Self { items, on_change }
    }

    /// # Errors
    ///
    /// [`TrackError::MissingCallback`] or [`TrackError::MissingContainer`]
    /// when the corresponding part is `None`.
    pub fn try_from_parts(on_change: Option<Handler>, items: Option<HashSet<T>>) -> Result<Self> {
        let on_change = on_change.ok_or(TrackError::MissingCallback {
            wrapper: "TrackedSet",
        })?;
        let items = items.ok_or(TrackError::MissingContainer {
            wrapper: "TrackedSet",
        })?;
        Ok(Self::with_items(on_change, items))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.items.contains(value)
    }

    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_set(&self) -> &HashSet<T> {
        &self.items
    }

    /// Add `value`. Returns `false`, without firing, if already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.items.contains(&value) {
            return false;
        }
        enter(&value, &self.on_change);
        self.items.insert(value);
        self.notify();
        true
    }

    /// Remove `value`. Returns `false`, without firing, if absent.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Remove and return the member equal to `value`, if any.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.items.take(value)?;
        leave(&removed, &self.on_change);
        self.notify();
        Some(removed)
    }

    /// Remove every member. Fires once, and only if the set was non-empty.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        for item in self.items.drain() {
            leave(&item, &self.on_change);
        }
        self.notify();
    }

    /// Add every element of `other` not already present.
    pub fn union_with<I: IntoIterator<Item = T>>(&mut self, other: I) {
        let mut changed = false;
        for item in other {
            if !self.items.contains(&item) {
                enter(&item, &self.on_change);
                self.items.insert(item);
                changed = true;
            }
        }
        if changed {
            self.notify();
        }
    }

    /// Keep only members that also appear in `other`.
    pub fn intersect_with<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let keep: HashSet<&T> = other.into_iter().collect();
        let before = self.items.len();
        let handler = &self.on_change;
        self.items.retain(|item| {
            let kept = keep.contains(item);
            if !kept {
                leave(item, handler);
            }
            kept
        });
        if self.items.len() != before {
            self.notify();
        }
    }

    /// Remove every member that appears in `other`.
    pub fn except_with<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut changed = false;
        for item in other {
            if let Some(removed) = self.items.take(item) {
                leave(&removed, &self.on_change);
                changed = true;
            }
        }
        if changed {
            self.notify();
        }
    }

    /// Keep members found in exactly one of `self` and `other`.
    pub fn symmetric_except_with<I: IntoIterator<Item = T>>(&mut self, other: I) {
        let incoming: HashSet<T> = other.into_iter().collect();
        let mut changed = false;
        for item in incoming {
            match self.items.take(&item) {
                Some(removed) => leave(&removed, &self.on_change),
                None => {
                    enter(&item, &self.on_change);
                    self.items.insert(item);
                }
            }
            changed = true;
        }
        if changed {
            self.notify();
        }
    }

    pub fn is_subset_of<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let other: HashSet<&T> = other.into_iter().collect();
        self.items.iter().all(|item| other.contains(item))
    }

    pub fn is_proper_subset_of<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let other: HashSet<&T> = other.into_iter().collect();
        other.len() > self.items.len() && self.items.iter().all(|item| other.contains(item))
    }

    pub fn is_superset_of<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        other.into_iter().all(|item| self.items.contains(item))
    }

    pub fn is_proper_superset_of<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let other: HashSet<&T> = other.into_iter().collect();
        self.items.len() > other.len() && other.iter().all(|item| self.items.contains(*item))
    }

    pub fn overlaps<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        other.into_iter().any(|item| self.items.contains(item))
    }

    pub fn set_equals<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let other: HashSet<&T> = other.into_iter().collect();
        other.len() == self.items.len() && other.iter().all(|item| self.items.contains(*item))
    }

    /// Detach from every member and hand back the raw set.
    #[must_use]
    pub fn into_set(mut self) -> HashSet<T> {
        for item in &self.items {
            leave(item, &self.on_change);
        }
        std::mem::take(&mut self.items)
    }

    fn notify(&self) {
        (self.on_change)();
    }
}

impl<T: Element> Drop for TrackedSet<T> {
    fn drop(&mut self) {
        for item in &self.items {
            item.detach(&self.on_change);
        }
    }
}

impl<'a, T: Element> IntoIterator for &'a TrackedSet<T> {
    type Item = &'a T;
    type IntoIter = std::collections::hash_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for TrackedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedSet")
            .field("items", &self.items)
            .finish()
    }
}

impl<T: Element> Attachable for TrackedSet<T> {
    fn attach(&self, handler: &Handler) {
        self.items.attach(handler);
    }

    fn detach(&self, handler: &Handler) {
        self.items.detach(handler);
    }

    fn reset_recursive(&self) {
        self.items.reset_recursive();
    }
}

impl<T: Element + Eq + Hash> TrackedCollection for TrackedSet<T> {
    type Raw = HashSet<T>;

    fn wrap(on_change: Handler, raw: HashSet<T>) -> Self {
        Self::with_items(on_change, raw)
    }
}

#[cfg(feature = "serde")]
impl<T: Element + serde::Serialize + Eq + Hash> serde::Serialize for TrackedSet<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}
