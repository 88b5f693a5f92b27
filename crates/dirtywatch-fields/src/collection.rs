//! Lazily wrapped collection field.
//!
//! # Design
//!
//! The field holds either raw backing data (as constructed or deserialized)
//! or the live wrapper built over it. The first `get`/`get_mut` adopts the
//! raw data into a wrapper whose callback records a change to the field's
//! name on the owner. A missing raw container becomes an empty one.
//!
//! While a [`FieldMut`] is alive the wrapper's callback only counts changes.
//! Dropping the guard releases the borrow first and then records one change
//! per counted callback, so owner handlers run with the field free to read
//! or mutate again.
//!
//! # Failure Modes
//!
//! `get` hands out a `Ref` and `get_mut` a [`FieldMut`] into the field.
//! Calling `get_mut` or `assign` while either is alive panics with a
//! `RefCell` borrow error.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use dirtywatch_collections::TrackedCollection;
use dirtywatch_core::{Attachable, DirtyTracker, Handler};

use crate::FieldReset;

enum Slot<W: TrackedCollection> {
    Raw(Option<W::Raw>),
    Live(W),
}

impl<W: TrackedCollection> Slot<W> {
    fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    fn live(&mut self, on_change: impl FnOnce() -> Handler, name: &'static str) -> &mut W {
        if let Self::Raw(raw) = self {
            let raw = raw.take().unwrap_or_default();
            tracing::debug!(message = "collection.materialize", field = name);
            *self = Self::Live(W::wrap(on_change(), raw));
        }
        match self {
            Self::Live(wrapper) => wrapper,
            Self::Raw(_) => unreachable!("slot was materialized above"),
        }
    }
}

/// Change callbacks raised while a [`FieldMut`] holds the slot.
#[derive(Default)]
struct Deferral {
    holding: Cell<bool>,
    pending: Cell<usize>,
}

/// Backing storage for a property holding a tracked collection.
pub struct Collection<W: TrackedCollection> {
    slot: RefCell<Slot<W>>,
    deferral: Rc<Deferral>,
}

impl<W: TrackedCollection> Collection<W> {
    /// No backing data; materializes as an empty wrapper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(Slot::Raw(None)),
            deferral: Rc::default(),
        }
    }

    /// Adopt `raw` on first access.
    #[must_use]
    pub fn from_raw(raw: W::Raw) -> Self {
        Self {
            slot: RefCell::new(Slot::Raw(Some(raw))),
            deferral: Rc::default(),
        }
    }

    /// The wrapper, building it on first access.
    pub fn get(&self, tracker: &DirtyTracker, name: &'static str) -> Ref<'_, W> {
        if !self.is_materialized() {
            self.slot
                .borrow_mut()
                .live(|| self.wrapper_handler(tracker, name), name);
        }
        Ref::map(self.slot.borrow(), |slot| match slot {
            Slot::Live(wrapper) => wrapper,
            Slot::Raw(_) => unreachable!("slot was materialized above"),
        })
    }

    /// Mutable access to the wrapper, building it on first access.
    ///
    /// Changes made through the guard are recorded against `name` when it
    /// drops, one notification per mutating call.
    pub fn get_mut<'a>(&'a self, tracker: &'a DirtyTracker, name: &'static str) -> FieldMut<'a, W> {
        let wrapper = RefMut::map(self.slot.borrow_mut(), |slot| {
            slot.live(|| self.wrapper_handler(tracker, name), name)
        });
        self.deferral.holding.set(true);
        FieldMut {
            wrapper,
            _flush: Flush {
                deferral: &self.deferral,
                tracker,
                name,
            },
        }
    }

    /// Replace the whole collection.
    ///
    /// The old wrapper is dropped first, detaching everything it held. The
    /// new wrapper adopts `source` (empty when `None`), then `name` is marked
    /// dirty and the owner fires once.
    pub fn assign(&self, tracker: &DirtyTracker, name: &'static str, source: Option<W::Raw>) {
        {
            let mut slot = self.slot.borrow_mut();
            *slot = Slot::Raw(None);
            *slot = Slot::Live(W::wrap(
                self.wrapper_handler(tracker, name),
                source.unwrap_or_default(),
            ));
        }
        tracing::debug!(message = "collection.assign", field = name);
        tracker.record_change(name);
    }

    /// Whether the wrapper has been built.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.slot.borrow().is_live()
    }

    fn wrapper_handler(&self, tracker: &DirtyTracker, name: &'static str) -> Handler {
        let deferral = Rc::clone(&self.deferral);
        let record = tracker.field_handler(name);
        Rc::new(move || {
            if deferral.holding.get() {
                deferral.pending.set(deferral.pending.get() + 1);
            } else {
                record();
            }
        })
    }
}

/// Mutable borrow of a collection field's wrapper.
///
/// Notifications raised through it are delivered after the borrow ends.
pub struct FieldMut<'a, W: TrackedCollection> {
    // Declared first so the borrow is released before `Flush` runs.
    wrapper: RefMut<'a, W>,
    _flush: Flush<'a>,
}

struct Flush<'a> {
    deferral: &'a Deferral,
    tracker: &'a DirtyTracker,
    name: &'static str,
}

impl Drop for Flush<'_> {
    fn drop(&mut self) {
        self.deferral.holding.set(false);
        for _ in 0..self.deferral.pending.replace(0) {
            self.tracker.record_change(self.name);
        }
    }
}

impl<W: TrackedCollection> Deref for FieldMut<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        &self.wrapper
    }
}

impl<W: TrackedCollection> DerefMut for FieldMut<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut self.wrapper
    }
}

impl<W: TrackedCollection + fmt::Debug> fmt::Debug for FieldMut<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldMut").field(&*self.wrapper).finish()
    }
}

impl<W: TrackedCollection> Default for Collection<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: TrackedCollection> FieldReset for Collection<W> {
    fn reset_recursive(&self) {
        match &*self.slot.borrow() {
            Slot::Live(wrapper) => wrapper.reset_recursive(),
            Slot::Raw(Some(raw)) => raw.reset_recursive(),
            Slot::Raw(None) => {}
        }
    }
}

impl<W: TrackedCollection + fmt::Debug> fmt::Debug for Collection<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.slot.borrow() {
            Slot::Live(wrapper) => f.debug_tuple("Collection").field(wrapper).finish(),
            Slot::Raw(raw) => f
                .debug_struct("Collection")
                .field("raw", &raw.is_some())
                .finish(),
        }
    }
}

#[cfg(feature = "serde")]
impl<W> serde::Serialize for Collection<W>
where
    W: TrackedCollection + serde::Serialize,
    W::Raw: serde::Serialize,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &*self.slot.borrow() {
            Slot::Live(wrapper) => serializer.serialize_some(wrapper),
            Slot::Raw(Some(raw)) => serializer.serialize_some(raw),
            Slot::Raw(None) => serializer.serialize_none(),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, W> serde::Deserialize<'de> for Collection<W>
where
    W: TrackedCollection,
    W::Raw: serde::Deserialize<'de>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<W::Raw>::deserialize(deserializer).map(|raw| Self {
            slot: RefCell::new(Slot::Raw(raw)),
            deferral: Rc::default(),
        })
    }
}
