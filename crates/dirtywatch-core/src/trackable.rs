//! The trackable capability.

use std::collections::BTreeSet;

use crate::event::ChangeEvent;

/// How far a reset reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cascade {
    /// Clear only the object's own dirty set.
    #[default]
    Shallow,
    /// Also reset every trackable reachable through the object's fields,
    /// container elements, and map values, whether or not they are dirty.
    Recursive,
}

impl Cascade {
    #[must_use]
    pub const fn is_recursive(self) -> bool {
        matches!(self, Self::Recursive)
    }
}

impl From<bool> for Cascade {
    fn from(recursive: bool) -> Self {
        if recursive {
            Self::Recursive
        } else {
            Self::Shallow
        }
    }
}

/// Capability exposed by every object that participates in dirty tracking.
///
/// Objects are shared through `Rc`, so every operation takes `&self` and the
/// implementor keeps its state behind interior mutability (normally a
/// [`DirtyTracker`](crate::DirtyTracker)).
///
/// Field names are the public-facing property names, never storage names.
pub trait Trackable {
    /// Whether any field changed since the last clean checkpoint.
    fn is_dirty(&self) -> bool;

    /// Snapshot of the dirty field names. Mutating it does not touch the object.
    fn dirty_fields(&self) -> BTreeSet<String>;

    /// Record `name` as dirty. Idempotent; does not notify.
    fn mark_field_dirty(&self, name: &str);

    /// Reset to clean. Never notifies.
    fn mark_clean_with(&self, cascade: Cascade);

    /// The channel parents attach to.
    fn changed(&self) -> &ChangeEvent;

    fn mark_clean(&self) {
        self.mark_clean_with(Cascade::Shallow);
    }

    fn mark_clean_recursive(&self) {
        self.mark_clean_with(Cascade::Recursive);
    }
}
