//! Test helpers: a minimal trackable leaf and a counting handler.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::event::{ChangeEvent, Handler};
use crate::trackable::{Cascade, Trackable};
use crate::tracker::DirtyTracker;

/// Leaf object with no fields of its own; `touch` records a change.
#[derive(Debug, Default)]
pub struct Probe {
    tracker: DirtyTracker,
}

impl Probe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `field` dirty and notify subscribers once.
    pub fn touch(&self, field: &str) {
        self.tracker.record_change(field);
    }

    /// Number of handlers attached to this probe's change event.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tracker.changed().handler_count()
    }
}

impl Trackable for Probe {
    fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    fn dirty_fields(&self) -> BTreeSet<String> {
        self.tracker.dirty_fields()
    }

    fn mark_field_dirty(&self, name: &str) {
        self.tracker.mark_field_dirty(name);
    }

    fn mark_clean_with(&self, _cascade: Cascade) {
        self.tracker.mark_clean();
    }

    fn changed(&self) -> &ChangeEvent {
        self.tracker.changed()
    }
}

/// A handler that counts its invocations. Clones share the count and the
/// handler identity.
#[derive(Clone)]
pub struct CallCounter {
    count: Rc<Cell<usize>>,
    handler: Handler,
}

impl CallCounter {
    #[must_use]
    pub fn new() -> Self {
        let count = Rc::new(Cell::new(0usize));
        let c = Rc::clone(&count);
        Self {
            count,
            handler: Rc::new(move || c.set(c.get() + 1)),
        }
    }

    #[must_use]
    pub fn handler(&self) -> Handler {
        Rc::clone(&self.handler)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Return the count and reset it to zero.
    pub fn take(&self) -> usize {
        self.count.replace(0)
    }
}

impl Default for CallCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallCounter")
            .field("count", &self.count.get())
            .finish()
    }
}
