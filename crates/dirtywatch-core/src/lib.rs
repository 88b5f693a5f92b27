#![forbid(unsafe_code)]

//! Core: the trackable capability, change events, and per-object dirty trackers.
//!
//! - [`ChangeEvent`]: a synchronous, reentrant notification channel carrying
//!   zero-argument [`Handler`]s.
//! - [`Trackable`]: the capability every participating object exposes.
//! - [`Attachable`] / [`Element`]: static dispatch over the shapes a value can
//!   take when a handler is attached to it (single trackable, container,
//!   map-by-value, or untracked scalar).
//! - [`DirtyTracker`]: the dirty-field set owned by exactly one object.
//!
//! # Invariants
//!
//! 1. A dirty set only grows through `mark_field_dirty` until an explicit reset.
//! 2. Marking a field dirty never fires a notification by itself.
//! 3. Handlers are invoked in subscription order.
//! 4. The ownership graph is acyclic. A cycle of subscriptions makes every
//!    notification recurse without bound; nothing here detects it.

pub mod attach;
pub mod error;
pub mod event;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod trackable;
pub mod tracker;

pub use attach::{Attachable, ById, Element, ElementId};
pub use error::{Result, TrackError};
pub use event::{ChangeEvent, Handler, handler};
pub use trackable::{Cascade, Trackable};
pub use tracker::DirtyTracker;
