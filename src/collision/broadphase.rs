//! Broad phase: spatial indices behind one processor interface, plus the pair filter.

use crate::{
    collision::{
        contact::ContactId,
        dynamic_tree::{ColliderProxy, DynamicTree},
        hash_grid::SparseHashGrid,
    },
    config::{DynamicTreeConfig, SparseHashGridConfig},
    core::{
        bounds::BoundingBox,
        collider::{Collider, ColliderId},
        ray::Ray,
        rigidbody::{CollisionType, RigidBody},
    },
    debug::DebugDraw,
};

/// A spatial index that tracks collider bounds and produces candidate pairs.
pub trait CollisionProcessor {
    fn track(&mut self, proxy: ColliderProxy<ColliderId>);

    fn untrack(&mut self, id: ColliderId) -> bool;

    /// Refreshes tracked bounds; returns how many proxies were restructured.
    fn update(&mut self, proxies: &[ColliderProxy<ColliderId>]) -> usize;

    /// Candidates whose (possibly padded) bounds overlap `bounds`, sorted by id.
    fn query(&self, bounds: &BoundingBox) -> Vec<ColliderId>;

    /// Candidates whose bounds the ray enters within `max_distance`.
    fn ray_cast_candidates(&self, ray: &Ray, max_distance: f32) -> Vec<ColliderId>;

    /// Overlapping candidate pairs as `(low, high)`, sorted.
    fn pairs(&self) -> Vec<(ColliderId, ColliderId)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn debug(&self, draw: &mut dyn DebugDraw);
}

/// Dynamic AABB tree processor; the default.
#[derive(Debug, Default)]
pub struct DynamicTreeProcessor {
    tree: DynamicTree<ColliderId>,
}

impl DynamicTreeProcessor {
    pub fn new(config: DynamicTreeConfig) -> Self {
        Self {
            tree: DynamicTree::new(config),
        }
    }

    pub fn tree(&self) -> &DynamicTree<ColliderId> {
        &self.tree
    }
}

impl CollisionProcessor for DynamicTreeProcessor {
    fn track(&mut self, proxy: ColliderProxy<ColliderId>) {
        self.tree.track(proxy);
    }

    fn untrack(&mut self, id: ColliderId) -> bool {
        self.tree.untrack(id)
    }

    fn update(&mut self, proxies: &[ColliderProxy<ColliderId>]) -> usize {
        proxies
            .iter()
            .filter(|proxy| self.tree.update(**proxy))
            .count()
    }

    fn query(&self, bounds: &BoundingBox) -> Vec<ColliderId> {
        let mut found = Vec::new();
        self.tree.query_bounds(bounds, |id| {
            found.push(id);
            false
        });
        found.sort();
        found
    }

    fn ray_cast_candidates(&self, ray: &Ray, max_distance: f32) -> Vec<ColliderId> {
        let mut found = Vec::new();
        self.tree.ray_cast_query(ray, max_distance, |id| {
            found.push(id);
            false
        });
        found.sort();
        found
    }

    fn pairs(&self) -> Vec<(ColliderId, ColliderId)> {
        let mut pairs = Vec::new();
        self.tree.overlapping_pairs(|a, b| {
            pairs.push(if a < b { (a, b) } else { (b, a) });
        });
        pairs.sort();
        pairs.dedup();
        pairs
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn debug(&self, draw: &mut dyn DebugDraw) {
        self.tree.debug(draw);
    }
}

/// Sparse hash grid processor, for scenes of similarly sized colliders.
#[derive(Debug, Default)]
pub struct SparseHashGridProcessor {
    grid: SparseHashGrid<ColliderId>,
}

impl SparseHashGridProcessor {
    pub fn new(config: SparseHashGridConfig) -> Self {
        Self {
            grid: SparseHashGrid::new(config),
        }
    }

    pub fn grid(&self) -> &SparseHashGrid<ColliderId> {
        &self.grid
    }
}

impl CollisionProcessor for SparseHashGridProcessor {
    fn track(&mut self, proxy: ColliderProxy<ColliderId>) {
        self.grid.track(proxy);
    }

    fn untrack(&mut self, id: ColliderId) -> bool {
        self.grid.untrack(id)
    }

    fn update(&mut self, proxies: &[ColliderProxy<ColliderId>]) -> usize {
        self.grid.update(proxies.iter().copied())
    }

    fn query(&self, bounds: &BoundingBox) -> Vec<ColliderId> {
        let mut found = Vec::new();
        self.grid.query_bounds(bounds, |id| {
            found.push(id);
            false
        });
        found
    }

    fn ray_cast_candidates(&self, ray: &Ray, max_distance: f32) -> Vec<ColliderId> {
        let mut found = Vec::new();
        self.grid.ray_cast_query(ray, max_distance, |id| {
            found.push(id);
            false
        });
        found.sort();
        found
    }

    fn pairs(&self) -> Vec<(ColliderId, ColliderId)> {
        self.grid.pairs()
    }

    fn len(&self) -> usize {
        self.grid.len()
    }

    fn debug(&self, draw: &mut dyn DebugDraw) {
        self.grid.debug(draw);
    }
}

/// A broad-phase candidate pair, lowest collider id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub a: ColliderId,
    pub b: ColliderId,
}

impl Pair {
    pub fn new(a: ColliderId, b: ColliderId) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    pub fn id(&self) -> ContactId {
        ContactId::new(self.a, self.b)
    }

    /// Whether the narrow phase should test this pair at all.
    ///
    /// Rejects colliders on the same body, groups that exclude each other,
    /// `PreventCollision` bodies and pairs where neither body can move.
    pub fn can_collide(
        a: &Collider,
        body_a: Option<&RigidBody>,
        b: &Collider,
        body_b: Option<&RigidBody>,
    ) -> bool {
        if a.id() == b.id() {
            return false;
        }
        if a.owner().is_some() && a.owner() == b.owner() {
            return false;
        }
        if !a.group().can_collide(&b.group()) {
            return false;
        }
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            return true;
        };
        if body_a.collision_type == CollisionType::PreventCollision
            || body_b.collision_type == CollisionType::PreventCollision
        {
            return false;
        }
        let passive = body_a.collision_type == CollisionType::Passive
            || body_b.collision_type == CollisionType::Passive;
        passive || !(body_a.is_immovable() && body_b.is_immovable())
    }
}
