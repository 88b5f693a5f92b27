#![forbid(unsafe_code)]

//! Mutation-observing container wrappers.
//!
//! Each wrapper owns one raw container, exposes the usual read surface, and
//! routes every structural mutation through subscription bookkeeping before
//! invoking a single owner callback:
//!
//! - [`TrackedVec`]: ordered sequence; callback fires once per mutating call.
//! - [`TrackedMap`]: key-unique map; subscriptions follow values, not keys.
//! - [`TrackedSet`]: unique elements plus set algebra; callback fires only
//!   when membership actually changed.
//!
//! Elements are shared, not owned: the same `Rc` may sit in several slots of
//! one wrapper and in several wrappers at once. Each wrapper attaches its
//! callback to an element once, no matter how many of its slots hold it
//! ([`SubscriptionCounts`]), and detaches when its last slot lets go. Dropping
//! a wrapper detaches everything it still holds.
//!
//! There is no `IndexMut`/`iter_mut`: in-place element mutation would bypass
//! the bookkeeping.

pub mod map;
pub mod refcount;
pub mod set;
pub mod vec;

pub use map::TrackedMap;
pub use refcount::SubscriptionCounts;
pub use set::TrackedSet;
pub use vec::TrackedVec;

use dirtywatch_core::{Attachable, Handler};

/// A wrapper that can be built over a raw container.
///
/// Owner fields use this to construct their wrapper lazily from backing data
/// that may have been restored by deserialization.
pub trait TrackedCollection: Attachable + Sized {
    /// The raw container the wrapper adopts.
    type Raw: Default + Attachable;

    /// Adopt `raw`, subscribing to its current contents without invoking
    /// `on_change`.
    fn wrap(on_change: Handler, raw: Self::Raw) -> Self;
}
