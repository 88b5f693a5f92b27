#![forbid(unsafe_code)]

//! End-to-end behavior of owners wired through the field layer.

use std::collections::BTreeSet;
use std::rc::Rc;

use dirtywatch::prelude::*;
use dirtywatch_core::testing::CallCounter;

// ── Model ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Person {
    tracker: DirtyTracker,
    name: Scalar<String>,
    age: Scalar<u32>,
    partner: Child<Person>,
    items: Collection<TrackedVec<String>>,
    friends: Collection<TrackedVec<Rc<Person>>>,
    associates: Collection<TrackedMap<String, Rc<Person>>>,
    circle: Collection<TrackedSet<ById<Person>>>,
}

impl Person {
    fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn set_name(&self, name: &str) {
        self.name.set(&self.tracker, "Name", name.to_string());
    }

    fn set_age(&self, age: u32) {
        self.age.set(&self.tracker, "Age", age);
    }

    fn set_partner(&self, partner: Option<Rc<Person>>) {
        self.partner.set(&self.tracker, "Partner", partner);
    }

    fn items(&self) -> FieldMut<'_, TrackedVec<String>> {
        self.items.get_mut(&self.tracker, "Items")
    }

    fn friends(&self) -> FieldMut<'_, TrackedVec<Rc<Person>>> {
        self.friends.get_mut(&self.tracker, "Friends")
    }

    fn set_friends(&self, friends: Option<Vec<Rc<Person>>>) {
        self.friends.assign(&self.tracker, "Friends", friends);
    }

    fn associates(&self) -> FieldMut<'_, TrackedMap<String, Rc<Person>>> {
        self.associates.get_mut(&self.tracker, "Associates")
    }

    fn circle(&self) -> FieldMut<'_, TrackedSet<ById<Person>>> {
        self.circle.get_mut(&self.tracker, "Circle")
    }
}

impl_trackable!(
    Person,
    tracker,
    [name, age, partner, items, friends, associates, circle]
);

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn watch(person: &Person) -> CallCounter {
    let counter = CallCounter::new();
    person.changed().subscribe(&counter.handler());
    counter
}

// ═════════════════════════════════════════════════════════════════════════
// Scalars
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn scalar_reassignment_keeps_one_dirty_name() {
    let o = Person::new();
    o.mark_clean();
    o.set_name("X");
    assert!(o.is_dirty());
    assert_eq!(o.dirty_fields(), names(&["Name"]));
    o.set_name("X");
    assert_eq!(o.dirty_fields(), names(&["Name"]));
}

#[test]
fn scalar_equal_value_never_fires() {
    let o = Person::new();
    let counter = watch(&o);
    o.set_name("");
    o.set_age(0);
    assert_eq!(counter.count(), 0);
    assert!(!o.is_dirty());

    o.set_age(30);
    assert_eq!(counter.count(), 1);
}

#[test]
fn clean_on_clean_object_is_silent() {
    let o = Person::new();
    let counter = watch(&o);
    o.mark_clean();
    o.mark_clean_recursive();
    assert!(o.dirty_fields().is_empty());
    assert_eq!(counter.count(), 0);
}

#[test]
fn dirty_fields_is_union_of_changed_names() {
    let o = Person::new();
    for n in 0..5 {
        o.set_name(&format!("n{n}"));
        o.set_age(n);
    }
    o.items().push("a".into());
    o.items().push("b".into());
    assert_eq!(o.dirty_fields(), names(&["Name", "Age", "Items"]));
}

// ═════════════════════════════════════════════════════════════════════════
// Trackable child
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn child_reassigned_same_reference_fires() {
    let o = Person::new();
    let p = Person::new();
    o.set_partner(Some(Rc::clone(&p)));
    o.mark_clean();
    let counter = watch(&o);

    o.set_partner(Some(Rc::clone(&p)));
    assert_eq!(counter.count(), 1);
    assert_eq!(o.dirty_fields(), names(&["Partner"]));
}

#[test]
fn child_change_propagates_under_field_name() {
    let o = Person::new();
    let p = Person::new();
    o.set_partner(Some(Rc::clone(&p)));
    o.mark_clean();

    p.set_age(41);
    assert_eq!(o.dirty_fields(), names(&["Partner"]));
    assert_eq!(p.dirty_fields(), names(&["Age"]));
}

#[test]
fn replaced_child_no_longer_reaches_owner() {
    let o = Person::new();
    let old = Person::new();
    let new = Person::new();
    o.set_partner(Some(Rc::clone(&old)));
    o.set_partner(Some(Rc::clone(&new)));
    o.mark_clean();

    old.set_age(1);
    assert!(!o.is_dirty());
    new.set_age(1);
    assert!(o.is_dirty());
}

// ═════════════════════════════════════════════════════════════════════════
// Collections
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn append_to_empty_sequence_marks_field() {
    let o = Person::new();
    o.mark_clean();
    o.items().push("a".into());
    assert!(o.is_dirty());
    assert_eq!(o.dirty_fields(), names(&["Items"]));
}

#[test]
fn map_value_change_marks_owner_not_value() {
    let o = Person::new();
    let p = Person::new();
    o.associates().set("m".into(), Rc::clone(&p));
    o.mark_clean();

    p.set_name("Mallory");
    assert!(o.is_dirty());
    assert_eq!(o.dirty_fields(), names(&["Associates"]));
    assert!(p.is_dirty());
    assert_eq!(p.dirty_fields(), names(&["Name"]));
}

#[test]
fn recursive_clean_reaches_map_values() {
    let o = Person::new();
    let p = Person::new();
    o.associates().set("m".into(), Rc::clone(&p));
    p.set_name("Mallory");
    assert!(p.is_dirty());

    o.mark_clean_recursive();
    assert!(!o.is_dirty());
    assert!(!p.is_dirty());
}

#[test]
fn shared_element_detaches_per_wrapper() {
    let a = Person::new();
    let b = Person::new();
    let x = Person::new();
    a.friends().push(Rc::clone(&x));
    b.friends().push(Rc::clone(&x));
    let seen_a = watch(&a);
    let seen_b = watch(&b);

    assert!(a.friends().remove_at(0).is_ok());
    seen_a.take();
    seen_b.take();
    x.set_age(7);
    assert_eq!(seen_a.take(), 0);
    assert_eq!(seen_b.take(), 1);

    assert!(b.friends().remove_at(0).is_ok());
    seen_a.take();
    seen_b.take();
    x.set_age(8);
    assert_eq!(seen_a.take(), 0);
    assert_eq!(seen_b.take(), 0);
}

#[test]
fn duplicate_slots_keep_subscription_until_last_removed() {
    let o = Person::new();
    let x = Person::new();
    o.friends().push(Rc::clone(&x));
    o.friends().push(Rc::clone(&x));
    assert!(o.friends().remove_at(0).is_ok());
    o.mark_clean();

    x.set_age(3);
    assert!(o.is_dirty());

    assert!(o.friends().remove_at(0).is_ok());
    o.mark_clean();
    x.set_age(4);
    assert!(!o.is_dirty());
}

#[test]
fn reassigning_collection_detaches_old_elements() {
    let o = Person::new();
    let old = Person::new();
    let new = Person::new();
    o.friends().push(Rc::clone(&old));
    o.set_friends(Some(vec![Rc::clone(&new)]));
    o.mark_clean();

    old.set_age(1);
    assert!(!o.is_dirty());
    new.set_age(1);
    assert_eq!(o.dirty_fields(), names(&["Friends"]));
}

#[test]
fn assigning_none_yields_empty_collection() {
    let o = Person::new();
    o.friends().push(Person::new());
    let counter = watch(&o);
    o.set_friends(None);
    assert_eq!(counter.count(), 1);
    assert!(o.friends().is_empty());
}

#[test]
fn set_member_change_reaches_owner() {
    let o = Person::new();
    let p = Rc::new(Person::default());
    assert!(o.circle().insert(ById::from(Rc::clone(&p))));
    assert!(!o.circle().insert(ById::from(Rc::clone(&p))));
    o.mark_clean();

    p.set_name("Pat");
    assert_eq!(o.dirty_fields(), names(&["Circle"]));

    assert!(o.circle().remove(&ById::from(Rc::clone(&p))));
    o.mark_clean();
    p.set_name("Pat again");
    assert!(!o.is_dirty());
}

// ═════════════════════════════════════════════════════════════════════════
// Cascading clean
// ═════════════════════════════════════════════════════════════════════════

fn family() -> (Rc<Person>, Vec<Rc<Person>>) {
    let root = Person::new();
    let partner = Person::new();
    let friend = Person::new();
    let associate = Person::new();
    let member = Person::new();
    let grandchild = Person::new();

    friend.set_partner(Some(Rc::clone(&grandchild)));
    root.set_partner(Some(Rc::clone(&partner)));
    root.friends().push(Rc::clone(&friend));
    root.associates().set("a".into(), Rc::clone(&associate));
    root.circle().insert(ById::from(Rc::clone(&member)));

    let all = vec![partner, friend, associate, member, grandchild];
    for p in &all {
        p.set_age(99);
    }
    (root, all)
}

#[test]
fn shallow_clean_leaves_descendants_dirty() {
    let (root, all) = family();
    root.mark_clean();
    assert!(!root.is_dirty());
    for p in &all {
        assert!(p.is_dirty());
    }
}

#[test]
fn recursive_clean_reaches_every_descendant() {
    let (root, all) = family();
    root.mark_clean_recursive();
    assert!(!root.is_dirty());
    for p in &all {
        assert!(!p.is_dirty());
    }
}

#[test]
fn recursive_clean_ignores_prior_dirty_state() {
    let (root, all) = family();
    root.mark_clean();
    all[1].mark_clean();
    root.mark_clean_with(Cascade::Recursive);
    for p in &all {
        assert!(!p.is_dirty());
    }
}

#[test]
fn recursive_clean_does_not_notify() {
    let (root, all) = family();
    let counter = watch(&root);
    root.mark_clean_recursive();
    assert_eq!(counter.count(), 0);
    assert!(all.iter().all(|p| !p.is_dirty()));
}

// ═════════════════════════════════════════════════════════════════════════
// Handlers that touch the model
// ═════════════════════════════════════════════════════════════════════════

/// Subscribe `f` to `person`'s change event without keeping it alive.
fn on_change(person: &Rc<Person>, f: impl Fn(&Person) + 'static) {
    let weak = Rc::downgrade(person);
    person.changed().subscribe(&handler(move || {
        if let Some(person) = weak.upgrade() {
            f(&person);
        }
    }));
}

#[test]
fn handler_extends_the_collection_it_was_notified_about() {
    let o = Person::new();
    let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    on_change(&o, move |p| {
        let len = p.items.get(&p.tracker, "Items").len();
        log.borrow_mut().push(len);
        if len < 3 {
            p.items().push(format!("follow-up {len}"));
        }
    });

    o.items().push("first".into());

    assert_eq!(*seen.borrow(), [1, 2, 3]);
    assert_eq!(o.items().len(), 3);
    assert_eq!(o.dirty_fields(), names(&["Items"]));
}

#[test]
fn handler_reads_collection_after_element_change() {
    let o = Person::new();
    let x = Person::new();
    o.friends().push(Rc::clone(&x));
    let ages = Rc::new(std::cell::RefCell::new(Vec::new()));
    let log = Rc::clone(&ages);
    on_change(&o, move |p| {
        let friends = p.friends.get(&p.tracker, "Friends");
        log.borrow_mut().extend(friends.iter().map(|f| f.age.get()));
    });

    x.set_age(12);
    assert_eq!(*ages.borrow(), [12]);

    o.friends().clear();
    x.set_age(13);
    assert_eq!(*ages.borrow(), [12]);
}

#[test]
fn handler_updates_a_related_object() {
    let o = Person::new();
    let audit = Person::new();
    let target = Rc::clone(&audit);
    on_change(&o, move |p| {
        let count = p.friends.get(&p.tracker, "Friends").len();
        target.set_age(u32::try_from(count).unwrap_or(u32::MAX));
        target.items().push(format!("friends={count}"));
    });
    let audit_seen = watch(&audit);

    o.friends().push(Person::new());
    o.friends().push(Person::new());

    assert_eq!(audit.age.get(), 2);
    assert_eq!(
        audit.items().as_slice(),
        ["friends=1".to_string(), "friends=2".to_string()]
    );
    assert_eq!(audit.dirty_fields(), names(&["Age", "Items"]));
    assert_eq!(audit_seen.count(), 4);
}

// ═════════════════════════════════════════════════════════════════════════
// Owner lifetime
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn dropping_owner_detaches_from_shared_elements() {
    let x = Person::new();
    {
        let o = Person::new();
        o.friends().push(Rc::clone(&x));
        o.set_partner(Some(Rc::clone(&x)));
        assert_eq!(x.changed().handler_count(), 2);
    }
    assert_eq!(x.changed().handler_count(), 0);
    x.set_age(1);
}
