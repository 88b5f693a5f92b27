#![forbid(unsafe_code)]

//! dirtywatch public facade crate.
//!
//! Objects record which of their fields changed since the last reset, and
//! raise a change notification on every recorded change. Collection fields are
//! wrapped so that structural mutations, and changes inside trackable
//! elements, are reported against the owning field's name.
//!
//! ```
//! use std::rc::Rc;
//! use dirtywatch::prelude::*;
//!
//! #[derive(Default)]
//! struct Contact {
//!     tracker: DirtyTracker,
//!     name: Scalar<String>,
//! }
//!
//! impl Contact {
//!     fn set_name(&self, name: &str) {
//!         self.name.set(&self.tracker, "Name", name.to_string());
//!     }
//! }
//!
//! impl_trackable!(Contact, tracker, [name]);
//!
//! #[derive(Default)]
//! struct Book {
//!     tracker: DirtyTracker,
//!     contacts: Collection<TrackedMap<String, Rc<Contact>>>,
//! }
//!
//! impl_trackable!(Book, tracker, [contacts]);
//!
//! let book = Book::default();
//! let ada = Rc::new(Contact::default());
//! book.contacts
//!     .get_mut(&book.tracker, "Contacts")
//!     .set("ada".to_string(), Rc::clone(&ada));
//! book.mark_clean();
//!
//! ada.set_name("Ada");
//! assert!(book.dirty_fields().contains("Contacts"));
//! assert!(ada.dirty_fields().contains("Name"));
//!
//! book.mark_clean_recursive();
//! assert!(!book.is_dirty() && !ada.is_dirty());
//! ```

pub use dirtywatch_collections as collections;
pub use dirtywatch_core as core;
pub use dirtywatch_fields as fields;

pub use dirtywatch_fields::impl_trackable;

pub mod prelude {
    pub use dirtywatch_collections::{TrackedCollection, TrackedMap, TrackedSet, TrackedVec};
    pub use dirtywatch_core::{
        Attachable, ById, Cascade, ChangeEvent, DirtyTracker, Element, Handler, TrackError,
        Trackable, handler,
    };
    pub use dirtywatch_fields::{Child, Collection, FieldMut, FieldReset, Scalar, impl_trackable};
}
