//! Equality-gated scalar field.

use std::cell::RefCell;
use std::fmt;

use dirtywatch_core::DirtyTracker;

use crate::FieldReset;

/// Backing storage for a plain value property.
#[derive(Default)]
pub struct Scalar<T> {
    value: RefCell<T>,
}

impl<T> Scalar<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Store `value` if it differs from the current one, then mark `name`
    /// dirty and notify once. Returns whether anything changed.
    pub fn set(&self, tracker: &DirtyTracker, name: &str, value: T) -> bool
    where
        T: PartialEq,
    {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        tracker.record_change(name);
        true
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T> FieldReset for Scalar<T> {
    fn reset_recursive(&self) {}
}

impl<T: fmt::Debug> fmt::Debug for Scalar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scalar").field(&self.value.borrow()).finish()
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for Scalar<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.borrow().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Scalar<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}
