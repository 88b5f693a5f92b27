//! Trackable child field.
//!
//! # Invariants
//!
//! - While attached, exactly one owner handler sits on the held child's
//!   change event, and it is the handler stored in `attached`.
//! - Assignment always marks dirty and fires, even for the same `Rc`.
//! - Dropping the field detaches its handler from the held child.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dirtywatch_core::{DirtyTracker, Handler, Trackable};

use crate::FieldReset;

/// Backing storage for a property holding a shared trackable child.
pub struct Child<T: Trackable + ?Sized> {
    value: RefCell<Option<Rc<T>>>,
    attached: RefCell<Option<Handler>>,
}

impl<T: Trackable + ?Sized> Child<T> {
    /// Hold `value` without subscribing; the first access subscribes.
    ///
    /// Until then the child's changes do not reach any owner. Use
    /// [`Child::with_owner`] when the owner is already known, or
    /// [`Child::attach`] after the fact.
    #[must_use]
    pub fn new(value: Option<Rc<T>>) -> Self {
        Self {
            value: RefCell::new(value),
            attached: RefCell::new(None),
        }
    }

    /// Hold `value` and subscribe the owner right away. Does not mark dirty
    /// or fire.
    #[must_use]
    pub fn with_owner(tracker: &DirtyTracker, name: &'static str, value: Option<Rc<T>>) -> Self {
        let field = Self::new(value);
        field.attach(tracker, name);
        field
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(None)
    }

    /// Current child, subscribing the owner to it if not yet subscribed.
    #[must_use]
    pub fn get(&self, tracker: &DirtyTracker, name: &'static str) -> Option<Rc<T>> {
        self.attach(tracker, name);
        self.value.borrow().clone()
    }

    /// Replace the child. The old child loses the owner's handler, the new
    /// one gains it, then `name` is marked dirty and the owner fires.
    pub fn set(&self, tracker: &DirtyTracker, name: &'static str, value: Option<Rc<T>>) {
        self.detach_current();
        *self.value.borrow_mut() = value;
        self.attach(tracker, name);
        tracker.record_change(name);
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.borrow().is_some()
    }

    /// Subscribe the owner to the held child unless already subscribed.
    pub fn attach(&self, tracker: &DirtyTracker, name: &'static str) {
        if self.is_attached() {
            return;
        }
        if let Some(child) = self.value.borrow().as_ref() {
            let handler = tracker.field_handler(name);
            tracker.subscribe(child, &handler);
            *self.attached.borrow_mut() = Some(handler);
        }
    }

    fn detach_current(&self) {
        let Some(handler) = self.attached.borrow_mut().take() else {
            return;
        };
        if let Some(child) = self.value.borrow().as_ref() {
            child.changed().unsubscribe(&handler);
        }
    }
}

impl<T: Trackable + ?Sized> Default for Child<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Trackable + ?Sized> Drop for Child<T> {
    fn drop(&mut self) {
        self.detach_current();
    }
}

impl<T: Trackable + ?Sized> FieldReset for Child<T> {
    fn reset_recursive(&self) {
        if let Some(child) = self.value.borrow().as_ref() {
            child.mark_clean_recursive();
        }
    }
}

impl<T: Trackable + ?Sized> fmt::Debug for Child<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Child")
            .field("present", &self.value.borrow().is_some())
            .field("attached", &self.is_attached())
            .finish()
    }
}

// Shared identity does not survive a round trip: each occurrence of a child
// is restored as its own `Rc`.
#[cfg(feature = "serde")]
impl<T: Trackable + serde::Serialize + ?Sized> serde::Serialize for Child<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.borrow().as_deref().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Trackable + serde::Deserialize<'de>> serde::Deserialize<'de> for Child<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| Self::new(value.map(Rc::new)))
    }
}
