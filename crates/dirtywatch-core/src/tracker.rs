#![forbid(unsafe_code)]

//! Per-object dirty-field tracker.
//!
//! # Design
//!
//! [`DirtyTracker`] keeps its dirty set and change event in reference-counted
//! state so it can hand out [`field_handler`](DirtyTracker::field_handler)s:
//! closures that hold only a `Weak` pointer back to the tracker. Children and
//! wrappers keep those handlers, so a child never keeps its parent alive. Once
//! the owner is dropped its handlers become inert.
//!
//! # Invariants
//!
//! 1. `mark_field_dirty` is idempotent and never notifies.
//! 2. `record_change` marks and notifies exactly once.
//! 3. `mark_clean` never notifies and never cascades; cascading is the
//!    owner's job (see [`Cascade`](crate::Cascade)).

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::attach::Attachable;
use crate::event::{ChangeEvent, Handler};

#[derive(Debug, Default)]
struct TrackerState {
    dirty: RefCell<BTreeSet<String>>,
    changed: ChangeEvent,
}

impl TrackerState {
    fn mark(&self, name: &str) {
        let mut dirty = self.dirty.borrow_mut();
        if !dirty.contains(name) {
            dirty.insert(name.to_owned());
            tracing::trace!(message = "tracker.mark_dirty", field = name);
        }
    }
}

/// Dirty-field set plus change event, owned by exactly one trackable object.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    state: Rc<TrackerState>,
}

impl DirtyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_field_dirty(&self, name: &str) {
        self.state.mark(name);
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.state.dirty.borrow().is_empty()
    }

    /// Copy of the dirty set.
    #[must_use]
    pub fn dirty_fields(&self) -> BTreeSet<String> {
        self.state.dirty.borrow().clone()
    }

    /// Empty the dirty set. No cascade, no notification.
    pub fn mark_clean(&self) {
        let cleared = std::mem::take(&mut *self.state.dirty.borrow_mut());
        if !cleared.is_empty() {
            tracing::debug!(message = "tracker.mark_clean", cleared = cleared.len());
        }
    }

    #[must_use]
    pub fn changed(&self) -> &ChangeEvent {
        &self.state.changed
    }

    /// Fire the owner's change event.
    pub fn notify_changed(&self) {
        self.state.changed.emit();
    }

    /// Mark `name` dirty, then fire the change event once.
    pub fn record_change(&self, name: &str) {
        self.state.mark(name);
        self.state.changed.emit();
    }

    /// Handler that records a change to `name` on this tracker.
    ///
    /// Each call returns a new handler; keep the one you attached if you
    /// intend to detach it later.
    #[must_use]
    pub fn field_handler(&self, name: &'static str) -> Handler {
        let weak = Rc::downgrade(&self.state);
        Rc::new(move || {
            if let Some(state) = weak.upgrade() {
                state.mark(name);
                state.changed.emit();
            }
        })
    }

    /// Attach `handler` to whatever change events `value` currently carries.
    pub fn subscribe<A: Attachable + ?Sized>(&self, value: &A, handler: &Handler) {
        value.attach(handler);
    }

    /// Detach `handler` from whatever change events `value` currently carries.
    pub fn unsubscribe<A: Attachable + ?Sized>(&self, value: &A, handler: &Handler) {
        value.detach(handler);
    }
}
