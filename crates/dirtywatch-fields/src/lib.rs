#![forbid(unsafe_code)]

//! Owner-side field wiring.
//!
//! An owner object holds a [`DirtyTracker`](dirtywatch_core::DirtyTracker)
//! and one backing field per tracked property. Each field kind implements one
//! setter contract:
//!
//! | field | setter |
//! |---|---|
//! | [`Scalar<T>`] | equality-gated: equal values never mark dirty or fire |
//! | [`Child<T>`] | always marks dirty and fires; moves the subscription from old to new child |
//! | [`Collection<W>`] | discards the old wrapper, wraps the new contents, marks dirty, fires |
//!
//! Backing fields hold raw data only. A collection restored by
//! deserialization stays raw until first access, when its wrapper is built
//! and subscribed. A restored child is subscribed on first access too.
//!
//! [`impl_trackable!`] writes the [`Trackable`](dirtywatch_core::Trackable)
//! delegation for an owner, cascading recursive resets into listed fields.
//!
//! ```
//! use std::rc::Rc;
//! use dirtywatch_core::{DirtyTracker, Trackable};
//! use dirtywatch_collections::TrackedVec;
//! use dirtywatch_fields::{Collection, Scalar, impl_trackable};
//!
//! #[derive(Default)]
//! struct Doc {
//!     tracker: DirtyTracker,
//!     title: Scalar<String>,
//!     tags: Collection<TrackedVec<String>>,
//! }
//!
//! impl Doc {
//!     fn set_title(&self, title: &str) {
//!         self.title.set(&self.tracker, "Title", title.to_string());
//!     }
//!
//!     fn tag(&self, tag: &str) {
//!         self.tags.get_mut(&self.tracker, "Tags").push(tag.to_string());
//!     }
//! }
//!
//! impl_trackable!(Doc, tracker, [title, tags]);
//!
//! let doc = Rc::new(Doc::default());
//! doc.set_title("draft");
//! doc.tag("rust");
//! assert_eq!(doc.dirty_fields().len(), 2);
//! doc.mark_clean();
//! assert!(!doc.is_dirty());
//! ```

pub mod child;
pub mod collection;
pub mod scalar;

pub use child::Child;
pub use collection::{Collection, FieldMut};
pub use scalar::Scalar;

/// Recursive-reset hook for an owner's backing field.
pub trait FieldReset {
    /// Reset every trackable this field currently holds.
    fn reset_recursive(&self);
}

#[doc(hidden)]
pub mod __private {
    pub use dirtywatch_core::{Cascade, ChangeEvent, Trackable};
}

/// Implement [`Trackable`](dirtywatch_core::Trackable) for an owner by
/// delegating to its tracker field.
///
/// `impl_trackable!(Owner, tracker, [field_a, field_b])` resets the listed
/// fields (each a [`FieldReset`]) on a recursive clean.
#[macro_export]
macro_rules! impl_trackable {
    ($owner:ty, $tracker:ident $(, [$($field:ident),* $(,)?])? $(,)?) => {
        impl $crate::__private::Trackable for $owner {
            fn is_dirty(&self) -> bool {
                self.$tracker.is_dirty()
            }

            fn dirty_fields(&self) -> ::std::collections::BTreeSet<::std::string::String> {
                self.$tracker.dirty_fields()
            }

            fn mark_field_dirty(&self, name: &str) {
                self.$tracker.mark_field_dirty(name);
            }

            fn mark_clean_with(&self, cascade: $crate::__private::Cascade) {
                self.$tracker.mark_clean();
                if cascade.is_recursive() {
                    $($($crate::FieldReset::reset_recursive(&self.$field);)*)?
                }
            }

            fn changed(&self) -> &$crate::__private::ChangeEvent {
                self.$tracker.changed()
            }
        }
    };
}
