#![forbid(unsafe_code)]

//! Statically dispatched attach/detach over the shapes a value can take.
//!
//! A parent never inspects a value at runtime to decide how to subscribe to
//! it. Instead every field or element type implements [`Attachable`]:
//!
//! | shape | attach/detach reaches |
//! |---|---|
//! | `Rc<T>` / [`ById<T>`] with `T: Trackable` | the value's own change event |
//! | `Option<A>` | the inner value, if any |
//! | `Vec`, `VecDeque`, slices, `HashSet`, `BTreeSet` | every element |
//! | `HashMap`, `BTreeMap` | every value (keys are never attached) |
//! | scalars (`String`, integers, ...) | nothing |
//!
//! Only the current contents are visited. Following later mutations is the
//! job of the tracked wrappers.
//!
//! # Count-table keys
//!
//! Wrappers that hold the same element in several slots reference-count their
//! subscriptions through [`Element::subscription_key`]. The key type is the
//! configuration point for identity vs value keying:
//!
//! - `Rc<T>` and [`ById<T>`] key by allocation ([`ElementId`]), so a later
//!   custom `PartialEq` on `T` cannot merge two distinct elements.
//! - Scalars have no change event and return `None`; they never enter a
//!   count table.
//!
//! Implement [`Element`] on your own type to choose value keying, which is
//! only sound for immutable values.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use crate::event::Handler;
use crate::trackable::Trackable;

/// Attach or detach a handler to whatever change events a value carries.
pub trait Attachable {
    fn attach(&self, handler: &Handler);

    fn detach(&self, handler: &Handler);

    /// Recursively reset every trackable this value reaches.
    fn reset_recursive(&self);
}

/// An [`Attachable`] that can sit in a reference-counted wrapper slot.
pub trait Element: Attachable {
    type Key: Eq + Hash;

    /// Key under which this element's subscription is counted, or `None` if
    /// the element has no change event.
    fn subscription_key(&self) -> Option<Self::Key>;
}

/// Allocation identity of a shared element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    #[must_use]
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>() as usize)
    }
}

impl<T: Trackable + ?Sized> Attachable for Rc<T> {
    fn attach(&self, handler: &Handler) {
        self.changed().subscribe(handler);
    }

    fn detach(&self, handler: &Handler) {
        self.changed().unsubscribe(handler);
    }

    fn reset_recursive(&self) {
        self.mark_clean_recursive();
    }
}

impl<T: Trackable + ?Sized> Element for Rc<T> {
    type Key = ElementId;

    fn subscription_key(&self) -> Option<ElementId> {
        Some(ElementId::of(self))
    }
}

impl<A: Attachable> Attachable for Option<A> {
    fn attach(&self, handler: &Handler) {
        if let Some(inner) = self {
            inner.attach(handler);
        }
    }

    fn detach(&self, handler: &Handler) {
        if let Some(inner) = self {
            inner.detach(handler);
        }
    }

    fn reset_recursive(&self) {
        if let Some(inner) = self {
            inner.reset_recursive();
        }
    }
}

impl<A: Element> Element for Option<A> {
    type Key = A::Key;

    fn subscription_key(&self) -> Option<A::Key> {
        self.as_ref().and_then(Element::subscription_key)
    }
}

macro_rules! each_element {
    ($($ty:ty => [$($gen:tt)*]),* $(,)?) => {
        $(
            impl<$($gen)*> Attachable for $ty {
                fn attach(&self, handler: &Handler) {
                    for item in self.iter() {
                        item.attach(handler);
                    }
                }

                fn detach(&self, handler: &Handler) {
                    for item in self.iter() {
                        item.detach(handler);
                    }
                }

                fn reset_recursive(&self) {
                    for item in self.iter() {
                        item.reset_recursive();
                    }
                }
            }
        )*
    };
}

each_element! {
    [A] => [A: Attachable],
    Vec<A> => [A: Attachable],
    VecDeque<A> => [A: Attachable],
    HashSet<A, S> => [A: Attachable, S],
    BTreeSet<A> => [A: Attachable],
}

macro_rules! each_value {
    ($($ty:ty => [$($gen:tt)*]),* $(,)?) => {
        $(
            impl<$($gen)*> Attachable for $ty {
                fn attach(&self, handler: &Handler) {
                    for value in self.values() {
                        value.attach(handler);
                    }
                }

                fn detach(&self, handler: &Handler) {
                    for value in self.values() {
                        value.detach(handler);
                    }
                }

                fn reset_recursive(&self) {
                    for value in self.values() {
                        value.reset_recursive();
                    }
                }
            }
        )*
    };
}

each_value! {
    HashMap<K, A, S> => [K, A: Attachable, S],
    BTreeMap<K, A> => [K, A: Attachable],
}

macro_rules! untracked {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Attachable for $ty {
                fn attach(&self, _handler: &Handler) {}
                fn detach(&self, _handler: &Handler) {}
                fn reset_recursive(&self) {}
            }

            impl Element for $ty {
                type Key = ();

                fn subscription_key(&self) -> Option<()> {
                    None
                }
            }
        )*
    };
}

untracked!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

/// Shared handle hashed and compared by allocation identity.
///
/// Use this as the element type of a hashed container of trackables: `Rc<T>`
/// would hash through `T`'s own `Hash`, which changes as the object mutates.
pub struct ById<T: ?Sized>(Rc<T>);

impl<T> ById<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }
}

impl<T: ?Sized> ById<T> {
    #[must_use]
    pub fn as_rc(&self) -> &Rc<T> {
        &self.0
    }

    #[must_use]
    pub fn into_rc(self) -> Rc<T> {
        self.0
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        ElementId::of(&self.0)
    }
}

impl<T: ?Sized> Clone for ById<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> From<Rc<T>> for ById<T> {
    fn from(rc: Rc<T>) -> Self {
        Self(rc)
    }
}

impl<T: ?Sized> Deref for ById<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> PartialEq for ById<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for ById<T> {}

impl<T: ?Sized> Hash for ById<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: fmt::Debug + ?Sized> fmt::Debug for ById<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ById").field(&&*self.0).finish()
    }
}

impl<T: Trackable + ?Sized> Attachable for ById<T> {
    fn attach(&self, handler: &Handler) {
        self.0.attach(handler);
    }

    fn detach(&self, handler: &Handler) {
        self.0.detach(handler);
    }

    fn reset_recursive(&self) {
        self.0.reset_recursive();
    }
}

impl<T: Trackable + ?Sized> Element for ById<T> {
    type Key = ElementId;

    fn subscription_key(&self) -> Option<ElementId> {
        Some(self.id())
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize + ?Sized> serde::Serialize for ById<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (*self.0).serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for ById<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}
