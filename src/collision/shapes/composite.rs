use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    collision::{
        closest,
        dynamic_tree::{ColliderProxy, DynamicTree},
        queries::RayCastHit,
    },
    core::{
        bounds::BoundingBox,
        collider::{Collider, ColliderBase, ColliderId},
        projection::Projection,
        ray::Ray,
        rigidbody::BodyId,
        segment::LineSegment,
        types::Transform,
    },
    debug::{DebugColor, DebugDraw},
    error::GeometryError,
};

/// How contacts against a composite's children are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeStrategy {
    /// Merge every child contact into one contact per composite pair.
    #[default]
    Together,
    /// One contact per child pair.
    Separate,
}

/// A group of circle and polygon children sharing an owner.
///
/// Children are indexed by a private dynamic tree, so contacts against large
/// tile groups only test the children near the other collider.
#[derive(Debug, Clone)]
pub struct CompositeCollider {
    pub(crate) base: ColliderBase,
    colliders: Vec<Collider>,
    /// Position of each child in `colliders`.
    by_id: HashMap<ColliderId, usize>,
    strategy: CompositeStrategy,
    tree: DynamicTree<ColliderId>,
}

impl CompositeCollider {
    pub fn new(children: Vec<Collider>) -> Result<Self, GeometryError> {
        if children.is_empty() {
            return Err(GeometryError::EmptyComposite);
        }
        let mut composite = Self {
            base: ColliderBase::default(),
            colliders: Vec::with_capacity(children.len()),
            by_id: HashMap::with_capacity(children.len()),
            strategy: CompositeStrategy::default(),
            tree: DynamicTree::default(),
        };
        for child in children {
            composite.add_collider(child);
        }
        Ok(composite)
    }

    pub fn with_strategy(mut self, strategy: CompositeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.set_offset(offset);
        self
    }

    /// Moves the whole group relative to its owner.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.base.offset = offset;
        for child in &mut self.colliders {
            child.base_mut().parent_offset = offset;
        }
    }

    pub fn strategy(&self) -> CompositeStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: CompositeStrategy) {
        self.strategy = strategy;
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn child(&self, id: ColliderId) -> Option<&Collider> {
        self.by_id.get(&id).and_then(|&index| self.colliders.get(index))
    }

    /// Adds a child; nested composites are flattened into their leaves.
    pub fn add_collider(&mut self, collider: Collider) {
        match collider {
            Collider::Composite(nested) => {
                let nested_offset = nested.base.offset;
                for mut child in nested.colliders {
                    let offset = child.offset() + nested_offset;
                    child.set_offset(offset);
                    self.add_collider(child);
                }
            }
            mut leaf => {
                leaf.set_owner(self.base.owner);
                leaf.base_mut().parent_offset = self.base.offset;
                if let Some(transform) = self.base.transform {
                    leaf.update(&transform);
                    self.tree.track(proxy_for(&leaf));
                }
                self.by_id.insert(leaf.id(), self.colliders.len());
                self.colliders.push(leaf);
            }
        }
    }

    pub fn remove_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let index = self.by_id.remove(&id)?;
        self.tree.untrack(id);
        let mut removed = self.colliders.remove(index);
        for position in self.by_id.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        removed.set_owner(None);
        removed.base_mut().parent_offset = Vec2::ZERO;
        Some(removed)
    }

    pub(crate) fn set_owner(&mut self, owner: Option<BodyId>) {
        self.base.owner = owner;
        for child in &mut self.colliders {
            child.set_owner(owner);
        }
    }

    /// The children's index, for debugging and queries.
    pub fn tree(&self) -> &DynamicTree<ColliderId> {
        &self.tree
    }

    /// Children receive the owner's transform unchanged; their offsets carry the group offset.
    pub fn update(&mut self, transform: &Transform) {
        self.base.transform = Some(*transform);
        for child in &mut self.colliders {
            child.update(transform);
        }
        for child in &self.colliders {
            self.tree.update(proxy_for(child));
        }
    }

    /// Children whose fat bounds overlap `bounds`.
    pub fn query(&self, bounds: &BoundingBox) -> Vec<&Collider> {
        let mut hits = Vec::new();
        self.tree.query_bounds(bounds, |id| {
            hits.push(id);
            false
        });
        hits.sort();
        hits.into_iter().filter_map(|id| self.child(id)).collect()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.colliders
            .iter()
            .fold(BoundingBox::empty(), |acc, c| acc.combine(&c.bounds()))
    }

    pub fn local_bounds(&self) -> BoundingBox {
        self.colliders
            .iter()
            .fold(BoundingBox::empty(), |acc, c| acc.combine(&c.local_bounds()))
    }

    pub fn axes(&self) -> Vec<Vec2> {
        self.colliders.iter().flat_map(|c| c.axes()).collect()
    }

    pub fn center(&self) -> Vec2 {
        self.base.to_world(Vec2::ZERO)
    }

    pub fn furthest_point(&self, direction: Vec2) -> Vec2 {
        self.colliders
            .iter()
            .map(|c| c.furthest_point(direction))
            .max_by(|a, b| a.dot(direction).total_cmp(&b.dot(direction)))
            .unwrap_or_else(|| self.center())
    }

    /// Children share the mass evenly.
    pub fn inertia(&self, mass: f32) -> f32 {
        if self.colliders.is_empty() {
            return mass;
        }
        let share = mass / self.colliders.len() as f32;
        self.colliders.iter().map(|c| c.inertia(share)).sum()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.colliders.iter().any(|c| c.contains(point))
    }

    /// Nearest child hit, reported under the composite's own id.
    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> Option<RayCastHit> {
        let mut best: Option<RayCastHit> = None;
        self.tree.ray_cast_query(ray, max_distance, |id| {
            let hit = self.child(id).and_then(|c| c.ray_cast(ray, max_distance));
            if let Some(hit) = hit {
                if best.as_ref().is_none_or(|b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
            false
        });
        best.map(|hit| RayCastHit {
            collider: self.base.id,
            body: self.base.owner,
            ..hit
        })
    }

    pub fn project(&self, axis: Vec2) -> Projection {
        self.colliders
            .iter()
            .map(|c| c.project(axis))
            .reduce(|a, b| a.combine(&b))
            .unwrap_or(Projection::new(0.0, 0.0))
    }

    /// Shortest of the children's closest lines to `other`, starting on the child.
    pub fn closest_line_between(&self, other: &Collider) -> LineSegment {
        closest::shortest(
            self.colliders
                .iter()
                .map(|child| child.closest_line_between(other)),
        )
        .unwrap_or_else(|| LineSegment::new(self.center(), other.center()))
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw, color: DebugColor) {
        for child in &self.colliders {
            child.debug(draw, color);
        }
    }

    pub(crate) fn clone_with_new_ids(&self) -> CompositeCollider {
        let mut copy = CompositeCollider {
            base: ColliderBase {
                offset: self.base.offset,
                group: self.base.group,
                ..ColliderBase::default()
            },
            colliders: Vec::with_capacity(self.colliders.len()),
            by_id: HashMap::with_capacity(self.colliders.len()),
            strategy: self.strategy,
            tree: DynamicTree::new(*self.tree.config()),
        };
        for child in &self.colliders {
            copy.add_collider(child.clone_with_new_id());
        }
        copy
    }
}

fn proxy_for(child: &Collider) -> ColliderProxy<ColliderId> {
    ColliderProxy::new(child.id(), child.bounds()).with_owner(child.owner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::{CircleCollider, PolygonCollider};

    fn tile(x: f32) -> Collider {
        PolygonCollider::rect(1.0, 1.0)
            .expect("tile")
            .with_offset(Vec2::new(x, 0.0))
            .into()
    }

    #[test]
    fn empty_composite_is_rejected() {
        assert!(matches!(
            CompositeCollider::new(Vec::new()),
            Err(GeometryError::EmptyComposite)
        ));
    }

    #[test]
    fn nested_composites_are_flattened() {
        let inner = CompositeCollider::new(vec![tile(0.0), tile(1.0)])
            .expect("inner")
            .with_offset(Vec2::new(0.0, 5.0));
        let circle: Collider = CircleCollider::new(0.5).expect("circle").into();
        let mut outer = CompositeCollider::new(vec![inner.into(), circle]).expect("outer");
        assert_eq!(outer.colliders().len(), 3);
        outer.update(&Transform::default());
        assert!((outer.bounds().max.y - 5.5).abs() < 1e-5);
    }

    #[test]
    fn children_are_queried_through_the_tree() {
        let mut composite =
            CompositeCollider::new((0..10).map(|i| tile(i as f32)).collect()).expect("row");
        composite.update(&Transform::default());
        let near = composite.query(&BoundingBox::from_center_half_extents(
            Vec2::new(4.0, 0.0),
            Vec2::splat(0.1),
        ));
        assert!(!near.is_empty());
        assert!(near.len() <= 3);
    }

    #[test]
    fn children_stay_addressable_after_removal() {
        let mut composite =
            CompositeCollider::new((0..5).map(|i| tile(i as f32)).collect()).expect("row");
        let ids: Vec<ColliderId> = composite.colliders().iter().map(|c| c.id()).collect();
        assert!(composite.remove_collider(ids[1]).is_some());
        assert!(composite.child(ids[1]).is_none());
        for &id in &ids[2..] {
            assert_eq!(composite.child(id).map(|c| c.id()), Some(id));
        }
        assert_eq!(composite.child(ids[0]).map(|c| c.id()), Some(ids[0]));
        assert!(composite.remove_collider(ids[1]).is_none());
    }

    #[test]
    fn closest_line_uses_the_nearest_child() {
        let mut composite =
            CompositeCollider::new(vec![tile(-2.0), tile(2.0)]).expect("pair");
        composite.update(&Transform::default());
        let mut ball: Collider = CircleCollider::new(0.5).expect("ball").into();
        ball.update(&Transform::from_position(Vec2::new(3.5, 0.0)));

        let line = composite.closest_line_between(&ball);
        assert!((line.begin.x - 2.5).abs() < 1e-5);
        assert!((line.end.x - 3.0).abs() < 1e-5);
        assert!((line.length() - 0.5).abs() < 1e-5);

        let back = ball.closest_line_between(&Collider::from(composite));
        assert!((back.begin.x - 3.0).abs() < 1e-5);
        assert!((back.end.x - 2.5).abs() < 1e-5);
    }
}
