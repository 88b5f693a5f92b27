//! Key-value wrapper.
//!
//! Subscriptions follow values: the same shared value stored under several
//! keys is counted like a duplicate list element, and keys are never
//! attached to.
//!
//! Reassigning an existing key releases the old value before retaining the
//! new one. When both are the same shared value held under no other key, its
//! handler is detached and immediately re-attached (moving to the end of
//! that value's handler list). That ordering is kept on purpose.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;

use dirtywatch_core::{Attachable, Element, Handler, Result, TrackError};

use crate::TrackedCollection;
use crate::refcount::SubscriptionCounts;

/// A `HashMap` whose structural mutations are reported to an owner callback.
pub struct TrackedMap<K, V: Element> {
    entries: HashMap<K, V>,
    counts: SubscriptionCounts<V::Key>,
    on_change: Handler,
}

impl<K: Eq + Hash, V: Element> TrackedMap<K, V> {
    #[must_use]
    pub fn new(on_change: Handler) -> Self {
        Self::with_entries(on_change, HashMap::new())
    }

    /// Adopt `entries`, subscribing to every trackable value. Does not fire.
    #[must_use]
    pub fn with_entries(on_change: Handler, entries: HashMap<K, V>) -> Self {
        let mut counts = SubscriptionCounts::new();
        for value in entries.values() {
            counts.retain(value, &on_change);
        }
        Self {
            entries,
            counts,
            on_change,
        }
    }

    /// # Errors
    ///
    /// [`TrackError::MissingCallback`] or [`TrackError::MissingContainer`]
    /// when the corresponding part is `None`.
    pub fn try_from_parts(
        on_change: Option<Handler>,
        entries: Option<HashMap<K, V>>,
    ) -> Result<Self> {
        let on_change = on_change.ok_or(TrackError::MissingCallback {
            wrapper: "TrackedMap",
        })?;
        let entries = entries.ok_or(TrackError::MissingContainer {
            wrapper: "TrackedMap",
        })?;
        Ok(Self::with_entries(on_change, entries))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Like [`get`](Self::get), but an absent key is an error.
    ///
    /// # Errors
    ///
    /// [`TrackError::KeyNotFound`] if `key` is absent.
    pub fn require<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.entries
            .get(key)
            .ok_or_else(|| TrackError::key_not_found(&key))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> std::collections::hash_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn values(&self) -> std::collections::hash_map::Values<'_, K, V> {
        self.entries.values()
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    #[must_use]
    pub fn as_map(&self) -> &HashMap<K, V> {
        &self.entries
    }

    /// Store `value` under `key`, returning the value it replaced.
    ///
    /// Always fires, including when the new value equals the old one.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let replaced = match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                let old = slot.insert(value);
                self.counts.release(&old, &self.on_change);
                self.counts.retain(slot.get(), &self.on_change);
                Some(old)
            }
            Entry::Vacant(slot) => {
                let value = slot.insert(value);
                self.counts.retain(value, &self.on_change);
                None
            }
        };
        self.notify();
        replaced
    }

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// [`TrackError::DuplicateKey`] if `key` is already present. The map is
    /// unchanged and nothing fires.
    pub fn add(&mut self, key: K, value: V) -> Result<()>
    where
        K: fmt::Debug,
    {
        match self.entries.entry(key) {
            Entry::Occupied(slot) => Err(TrackError::duplicate_key(slot.key())),
            Entry::Vacant(slot) => {
                let value = slot.insert(value);
                self.counts.retain(value, &self.on_change);
                self.notify();
                Ok(())
            }
        }
    }

    /// Remove `key`, returning its value. Absent keys return `None` and do
    /// not fire.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let old = self.entries.remove(key)?;
        self.counts.release(&old, &self.on_change);
        self.notify();
        Some(old)
    }

    /// Remove every entry. Fires once, and only if the map was non-empty.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.release_all();
        self.entries.clear();
        self.notify();
    }

    /// Number of entries holding `value`, as counted for subscriptions.
    #[must_use]
    pub fn subscription_count(&self, value: &V) -> usize {
        self.counts.count_of(value)
    }

    /// Number of distinct trackable values this wrapper is attached to.
    #[must_use]
    pub fn tracked_elements(&self) -> usize {
        self.counts.tracked()
    }

    /// Detach from every value and hand back the raw entries.
    #[must_use]
    pub fn into_map(mut self) -> HashMap<K, V> {
        self.release_all();
        std::mem::take(&mut self.entries)
    }

    fn release_all(&mut self) {
        for value in self.entries.values() {
            self.counts.release(value, &self.on_change);
        }
        self.counts.clear();
    }

    fn notify(&self) {
        (self.on_change)();
    }
}

impl<K, V: Element> Drop for TrackedMap<K, V> {
    fn drop(&mut self) {
        for value in self.entries.values() {
            self.counts.release(value, &self.on_change);
        }
    }
}

impl<'a, K, V: Element> IntoIterator for &'a TrackedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = std::collections::hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: fmt::Debug, V: Element + fmt::Debug> fmt::Debug for TrackedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedMap")
            .field("entries", &self.entries)
            .field("tracked", &self.counts.tracked())
            .finish()
    }
}

impl<K, V: Element> Attachable for TrackedMap<K, V> {
    fn attach(&self, handler: &Handler) {
        self.entries.attach(handler);
    }

    fn detach(&self, handler: &Handler) {
        self.entries.detach(handler);
    }

    fn reset_recursive(&self) {
        self.entries.reset_recursive();
    }
}

impl<K: Eq + Hash, V: Element> TrackedCollection for TrackedMap<K, V> {
    type Raw = HashMap<K, V>;

    fn wrap(on_change: Handler, raw: HashMap<K, V>) -> Self {
        Self::with_entries(on_change, raw)
    }
}

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for TrackedMap<K, V>
where
    K: serde::Serialize + Eq + Hash,
    V: Element + serde::Serialize,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirtywatch_core::testing::{CallCounter, Probe};
    use dirtywatch_core::{Trackable, handler};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn probe() -> Rc<Probe> {
        Rc::new(Probe::new())
    }

    #[test]
    fn value_shared_across_keys_is_counted_once_per_key() {
        let counter = CallCounter::new();
        let p = probe();
        let mut map = TrackedMap::new(counter.handler());

        map.set("a", Rc::clone(&p));
        map.set("b", Rc::clone(&p));
        assert_eq!(map.subscription_count(&p), 2);
        assert_eq!(p.subscriber_count(), 1);

        map.remove("a");
        assert_eq!(p.subscriber_count(), 1);
        map.remove("b");
        assert_eq!(p.subscriber_count(), 0);
        assert_eq!(map.tracked_elements(), 0);
    }

    #[test]
    fn value_change_reaches_owner() {
        let counter = CallCounter::new();
        let p = probe();
        let map = TrackedMap::with_entries(counter.handler(), HashMap::from([("m", Rc::clone(&p))]));
        assert_eq!(counter.count(), 0);

        p.touch("Name");
        assert_eq!(counter.count(), 1);
        assert!(p.dirty_fields().contains("Name"));
        drop(map);
    }

    #[test]
    fn reassigning_same_value_detaches_then_reattaches() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let map_handler = {
            let order = Rc::clone(&order);
            handler(move || order.borrow_mut().push("map"))
        };
        let other = {
            let order = Rc::clone(&order);
            handler(move || order.borrow_mut().push("other"))
        };
        let p = probe();
        let mut map = TrackedMap::with_entries(map_handler, HashMap::from([("m", Rc::clone(&p))]));
        p.changed().subscribe(&other);

        let old = map.set("m", Rc::clone(&p));
        assert!(old.is_some_and(|old| Rc::ptr_eq(&old, &p)));
        assert_eq!(p.subscriber_count(), 2);
        order.borrow_mut().clear();

        p.touch("Name");
        assert_eq!(*RefCell::borrow(&order), vec!["other", "map"]);
    }

    #[test]
    fn set_always_fires() {
        let counter = CallCounter::new();
        let mut map = TrackedMap::new(counter.handler());
        assert_eq!(map.set("k", 1), None);
        assert_eq!(map.set("k", 1), Some(1));
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn add_duplicate_key_fails_without_side_effects() {
        let counter = CallCounter::new();
        let first = probe();
        let second = probe();
        let mut map = TrackedMap::new(counter.handler());
        map.add("k", Rc::clone(&first)).expect("fresh key");
        counter.take();

        let err = map.add("k", Rc::clone(&second)).unwrap_err();
        assert_eq!(
            err,
            TrackError::DuplicateKey {
                key: "\"k\"".into()
            }
        );
        assert_eq!(counter.count(), 0);
        assert!(Rc::ptr_eq(map.get("k").expect("kept"), &first));
        assert_eq!(second.subscriber_count(), 0);
    }

    #[test]
    fn remove_absent_key_is_silent() {
        let counter = CallCounter::new();
        let mut map: TrackedMap<&str, i32> = TrackedMap::new(counter.handler());
        assert_eq!(map.remove("missing"), None);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn require_reports_missing_key() {
        let map: TrackedMap<String, i32> = TrackedMap::new(CallCounter::new().handler());
        assert_eq!(
            map.require("nope"),
            Err(TrackError::KeyNotFound {
                key: "\"nope\"".into()
            })
        );
        assert_eq!(map.get("nope"), None);
    }

    #[test]
    fn clear_fires_once_only_when_non_empty() {
        let counter = CallCounter::new();
        let a = probe();
        let b = probe();
        let mut map = TrackedMap::with_entries(
            counter.handler(),
            HashMap::from([(1, Rc::clone(&a)), (2, Rc::clone(&b)), (3, Rc::clone(&a))]),
        );

        map.clear();
        assert_eq!(counter.take(), 1);
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);
        assert_eq!(map.tracked_elements(), 0);

        map.clear();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn try_from_parts_rejects_missing_pieces() {
        assert!(matches!(
            TrackedMap::<u8, u8>::try_from_parts(None, Some(HashMap::new())),
            Err(TrackError::MissingCallback { .. })
        ));
        assert!(matches!(
            TrackedMap::<u8, u8>::try_from_parts(Some(CallCounter::new().handler()), None),
            Err(TrackError::MissingContainer { .. })
        ));
    }

    #[test]
    fn drop_detaches_values() {
        let p = probe();
        {
            let _map = TrackedMap::with_entries(
                CallCounter::new().handler(),
                HashMap::from([("x", Rc::clone(&p))]),
            );
            assert_eq!(p.subscriber_count(), 1);
        }
        assert_eq!(p.subscriber_count(), 0);
    }
}
