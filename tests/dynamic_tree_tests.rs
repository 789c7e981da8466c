use std::collections::{BTreeMap, BTreeSet};

use impulse2d::{
    collision::dynamic_tree::ColliderProxy, config::DynamicTreeConfig, BoundingBox, DynamicTree,
    Vec2,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Track(u32, f32, f32, f32),
    Move(u32, f32, f32),
    Untrack(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..24, -50.0f32..50.0, -50.0f32..50.0, 0.1f32..4.0)
            .prop_map(|(id, x, y, r)| Op::Track(id, x, y, r)),
        (0u32..24, -5.0f32..5.0, -5.0f32..5.0).prop_map(|(id, dx, dy)| Op::Move(id, dx, dy)),
        (0u32..24).prop_map(Op::Untrack),
    ]
}

fn boxed(x: f32, y: f32, r: f32) -> BoundingBox {
    BoundingBox::from_center_half_extents(Vec2::new(x, y), Vec2::splat(r))
}

fn apply(
    tree: &mut DynamicTree<u32>,
    live: &mut BTreeMap<u32, BoundingBox>,
    op: &Op,
) {
    match *op {
        Op::Track(id, x, y, r) => {
            if !live.contains_key(&id) {
                let bounds = boxed(x, y, r);
                tree.track(ColliderProxy::new(id, bounds));
                live.insert(id, bounds);
            }
        }
        Op::Move(id, dx, dy) => {
            if let Some(bounds) = live.get_mut(&id) {
                let displacement = Vec2::new(dx, dy);
                *bounds = bounds.translate(displacement);
                tree.update(ColliderProxy::new(id, *bounds).with_displacement(displacement));
            }
        }
        Op::Untrack(id) => {
            if live.remove(&id).is_some() {
                assert!(tree.untrack(id));
            } else {
                assert!(!tree.untrack(id));
            }
        }
    }
}

proptest! {
    #[test]
    fn invariants_hold_after_any_operation_sequence(ops in prop::collection::vec(op(), 1..120)) {
        let mut tree = DynamicTree::new(DynamicTreeConfig::default());
        let mut live = BTreeMap::new();
        for op in &ops {
            apply(&mut tree, &mut live, op);
            prop_assert_eq!(tree.check_invariants(), Ok(()));
            prop_assert_eq!(tree.len(), live.len());
        }
    }

    #[test]
    fn track_then_untrack_restores_the_shape(
        ops in prop::collection::vec(op(), 0..80),
        extra in (-60.0f32..60.0, -60.0f32..60.0, 0.1f32..6.0),
    ) {
        let mut tree = DynamicTree::new(DynamicTreeConfig::default());
        let mut live = BTreeMap::new();
        for op in &ops {
            apply(&mut tree, &mut live, op);
        }
        let before = tree.shape();
        tree.track(ColliderProxy::new(1000, boxed(extra.0, extra.1, extra.2)));
        prop_assert!(tree.untrack(1000));
        prop_assert_eq!(tree.shape(), before);
        prop_assert_eq!(tree.check_invariants(), Ok(()));
    }

    #[test]
    fn queries_never_miss_a_true_overlap(
        ops in prop::collection::vec(op(), 1..80),
        probe in (-60.0f32..60.0, -60.0f32..60.0, 0.5f32..20.0),
    ) {
        let mut tree = DynamicTree::new(DynamicTreeConfig::default());
        let mut live = BTreeMap::new();
        for op in &ops {
            apply(&mut tree, &mut live, op);
        }
        let probe = boxed(probe.0, probe.1, probe.2);
        let mut found = BTreeSet::new();
        tree.query_bounds(&probe, |id| {
            found.insert(id);
            false
        });
        for (id, bounds) in &live {
            if bounds.overlaps(&probe) {
                prop_assert!(found.contains(id), "missed {}", id);
            }
        }
        for id in &found {
            prop_assert!(live.contains_key(id));
        }
    }
}

#[test]
fn untracking_everything_empties_the_tree() {
    let mut tree = DynamicTree::new(DynamicTreeConfig::default());
    for i in 0..32u32 {
        tree.track(ColliderProxy::new(i, boxed(i as f32 * 1.5, 0.0, 0.5)));
    }
    assert!(tree.height() >= 5);
    for i in (0..32u32).rev() {
        assert!(tree.untrack(i));
        assert_eq!(tree.check_invariants(), Ok(()));
    }
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
}

#[test]
fn same_insertions_build_the_same_shape() {
    let build = || {
        let mut tree = DynamicTree::new(DynamicTreeConfig::default());
        for i in 0..16u32 {
            let x = (i * 7 % 16) as f32 * 2.0;
            tree.track(ColliderProxy::new(i, boxed(x, (i % 3) as f32, 0.6)));
        }
        tree
    };
    assert_eq!(build().shape(), build().shape());
}

#[test]
fn pairs_are_reported_once() {
    let mut tree = DynamicTree::new(DynamicTreeConfig::default());
    tree.track(ColliderProxy::new(1u32, boxed(0.0, 0.0, 1.0)));
    tree.track(ColliderProxy::new(2u32, boxed(1.5, 0.0, 1.0)));
    tree.track(ColliderProxy::new(3u32, boxed(10.0, 0.0, 1.0)));
    let mut pairs = Vec::new();
    tree.overlapping_pairs(|a, b| pairs.push((a.min(b), a.max(b))));
    assert_eq!(pairs, vec![(1, 2)]);
}
