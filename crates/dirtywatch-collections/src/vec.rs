//! Ordered-sequence wrapper.
//!
//! Every mutating call first settles subscriptions (leaving elements are
//! released, then entering elements are retained) and then invokes the owner
//! callback exactly once. There is no equality short-circuit: replacing an
//! element with an equal one, or clearing an empty sequence, still fires.

use std::fmt;
use std::ops::Index;

use dirtywatch_core::{Attachable, Element, Handler, Result, TrackError};

use crate::TrackedCollection;
use crate::refcount::SubscriptionCounts;

/// A `Vec` whose structural mutations are reported to an owner callback.
pub struct TrackedVec<T: Element> {
    items: Vec<T>,
    counts: SubscriptionCounts<T::Key>,
    on_change: Handler,
}

impl<T: Element> TrackedVec<T> {
    #[must_use]
    pub fn new(on_change: Handler) -> Self {
        Self::with_items(on_change, Vec::new())
    }

    /// Adopt `items`, subscribing to every trackable element. Does not fire.
    #[must_use]
    pub fn with_items(on_change: Handler, items: Vec<T>) -> Self {
        let mut counts = SubscriptionCounts::new();
        for item in &items {
            counts.retain(item, &on_change);
        }
        Self {
            items,
            counts,
            on_change,
        }
    }

    /// Build from parts that may be absent, as restored state can be.
    ///
    /// # Errors
    ///
    /// [`TrackError::MissingCallback`] or [`TrackError::MissingContainer`]
    /// when the corresponding part is `None`.
    pub fn try_from_parts(on_change: Option<Handler>, items: Option<Vec<T>>) -> Result<Self> {
        let on_change = on_change.ok_or(TrackError::MissingCallback {
            wrapper: "TrackedVec",
        })?;
        let items = items.ok_or(TrackError::MissingContainer {
            wrapper: "TrackedVec",
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

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Append `value`.
    pub fn push(&mut self, value: T) {
        self.counts.retain(&value, &self.on_change);
        self.items.push(value);
        self.notify();
    }

    /// Append every element of `values`, firing once for the whole call.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.counts.retain(&value, &self.on_change);
            self.items.push(value);
        }
        self.notify();
    }

    /// Insert `value` at `index`, shifting later elements right.
    ///
    /// # Errors
    ///
    /// [`TrackError::IndexOutOfBounds`] if `index > len`; nothing changes and
    /// nothing fires.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.items.len() {
            return Err(TrackError::out_of_bounds(index, self.items.len()));
        }
        self.counts.retain(&value, &self.on_change);
        self.items.insert(index, value);
        self.notify();
        Ok(())
    }

    /// Replace the element at `index`, returning the old one.
    ///
    /// The old element is released before the new one is retained, so
    /// re-setting the same shared element detaches and re-attaches it when
    /// this was its only slot.
    ///
    /// # Errors
    ///
    /// [`TrackError::IndexOutOfBounds`] if `index >= len`.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let len = self.items.len();
        let Some(slot) = self.items.get_mut(index) else {
            return Err(TrackError::out_of_bounds(index, len));
        };
        let old = std::mem::replace(slot, value);
        self.counts.release(&old, &self.on_change);
        self.counts.retain(&self.items[index], &self.on_change);
        self.notify();
        Ok(old)
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// [`TrackError::IndexOutOfBounds`] if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(TrackError::out_of_bounds(index, self.items.len()));
        }
        let old = self.items.remove(index);
        self.counts.release(&old, &self.on_change);
        self.notify();
        Ok(old)
    }

    /// Remove the first element equal to `value`.
    ///
    /// Returns `false`, without firing, if no element matched.
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.position(value) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    /// Remove and return the last element. Fires only if there was one.
    pub fn pop(&mut self) -> Option<T> {
        let old = self.items.pop()?;
        self.counts.release(&old, &self.on_change);
        self.notify();
        Some(old)
    }

    /// Remove every element. Fires even when already empty.
    pub fn clear(&mut self) {
        for item in &self.items {
            self.counts.release(item, &self.on_change);
        }
        self.items.clear();
        self.counts.clear();
        self.notify();
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.items.contains(value)
    }

    #[must_use]
    pub fn position(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.iter().position(|item| item == value)
    }

    /// Number of slots in this wrapper holding `element`, as counted for
    /// subscriptions. Always zero for untracked element types.
    #[must_use]
    pub fn subscription_count(&self, element: &T) -> usize {
        self.counts.count_of(element)
    }

    /// Number of distinct trackable elements this wrapper is attached to.
    #[must_use]
    pub fn tracked_elements(&self) -> usize {
        self.counts.tracked()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.clone()
    }

    /// Detach from every element and hand back the raw contents.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<T> {
        self.release_all();
        std::mem::take(&mut self.items)
    }

    fn release_all(&mut self) {
        for item in &self.items {
            self.counts.release(item, &self.on_change);
        }
        self.counts.clear();
    }

    fn notify(&self) {
        (self.on_change)();
    }
}

impl<T: Element> Drop for TrackedVec<T> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<T: Element> Index<usize> for TrackedVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T: Element> IntoIterator for &'a TrackedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Element + PartialEq> PartialEq<[T]> for TrackedVec<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.items == other
    }
}

impl<T: Element + PartialEq> PartialEq<Vec<T>> for TrackedVec<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        &self.items == other
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for TrackedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedVec")
            .field("items", &self.items)
            .field("tracked", &self.counts.tracked())
            .finish()
    }
}

impl<T: Element> Attachable for TrackedVec<T> {
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

impl<T: Element> TrackedCollection for TrackedVec<T> {
    type Raw = Vec<T>;

    fn wrap(on_change: Handler, raw: Vec<T>) -> Self {
        Self::with_items(on_change, raw)
    }
}

#[cfg(feature = "serde")]
impl<T: Element + serde::Serialize> serde::Serialize for TrackedVec<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}
