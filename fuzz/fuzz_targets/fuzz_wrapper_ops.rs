#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use dirtywatch_collections::{TrackedMap, TrackedSet, TrackedVec};
use dirtywatch_core::testing::{CallCounter, Probe};
use dirtywatch_core::{ById, ElementId};
use libfuzzer_sys::fuzz_target;

const POOL: usize = 6;

#[derive(Arbitrary, Debug)]
enum Op {
    Push(u8),
    Insert(u8, u8),
    Set(u8, u8),
    RemoveAt(u8),
    Pop,
    ClearVec,
    MapSet(u8, u8),
    MapAdd(u8, u8),
    MapRemove(u8),
    ClearMap,
    SetInsert(u8),
    SetRemove(u8),
    SetSymmetric(Vec<u8>),
    SetIntersect(Vec<u8>),
    ClearSet,
    Touch(u8),
}

fuzz_target!(|ops: Vec<Op>| {
    let pool: Vec<Rc<Probe>> = (0..POOL).map(|_| Rc::new(Probe::new())).collect();
    let pick = |i: u8| Rc::clone(&pool[usize::from(i) % POOL]);
    let member = |i: u8| ById::from(pick(i));

    let counter = CallCounter::new();
    let mut list = TrackedVec::new(counter.handler());
    let mut map = TrackedMap::new(counter.handler());
    let mut set = TrackedSet::new(counter.handler());

    for op in ops.into_iter().take(512) {
        match op {
            Op::Push(e) => list.push(pick(e)),
            Op::Insert(at, e) => {
                let _ = list.insert(usize::from(at), pick(e));
            }
            Op::Set(at, e) => {
                let _ = list.set(usize::from(at), pick(e));
            }
            Op::RemoveAt(at) => {
                let _ = list.remove_at(usize::from(at));
            }
            Op::Pop => {
                let _ = list.pop();
            }
            Op::ClearVec => list.clear(),
            Op::MapSet(k, e) => {
                let _ = map.set(k % 8, pick(e));
            }
            Op::MapAdd(k, e) => {
                let _ = map.add(k % 8, pick(e));
            }
            Op::MapRemove(k) => {
                let _ = map.remove(&(k % 8));
            }
            Op::ClearMap => map.clear(),
            Op::SetInsert(e) => {
                set.insert(member(e));
            }
            Op::SetRemove(e) => {
                set.remove(&member(e));
            }
            Op::SetSymmetric(es) => set.symmetric_except_with(es.into_iter().map(member)),
            Op::SetIntersect(es) => {
                let keep: Vec<ById<Probe>> = es.into_iter().map(member).collect();
                set.intersect_with(&keep);
            }
            Op::ClearSet => set.clear(),
            Op::Touch(e) => pick(e).touch("Value"),
        }

        for probe in &pool {
            let id = ElementId::of(probe);
            let in_list = list.iter().any(|p| ElementId::of(p) == id);
            let in_map = map.values().any(|p| ElementId::of(p) == id);
            let in_set = set.iter().any(|p| p.id() == id);
            let slots = list.iter().filter(|p| ElementId::of(*p) == id).count();
            assert_eq!(list.subscription_count(probe), slots);
            assert_eq!(
                probe.subscriber_count(),
                usize::from(in_list) + usize::from(in_map) + usize::from(in_set)
            );
        }
    }

    drop((list, map, set));
    for probe in &pool {
        assert_eq!(probe.subscriber_count(), 0);
    }
});
