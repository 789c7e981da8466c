use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{
    bounds::BoundingBox, projection::Projection, ray::Ray, rigidbody::BodyId,
    segment::LineSegment, types::Transform,
};
use crate::{
    collision::{
        contact::CollisionContact,
        narrowphase::NarrowPhase,
        queries::RayCastHit,
        shapes::{CircleCollider, CompositeCollider, PolygonCollider},
    },
    debug::{DebugColor, DebugDraw},
};

static NEXT_COLLIDER_ID: AtomicU32 = AtomicU32::new(0);

/// Process-wide unique collider identity; never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ColliderId(pub u32);

impl ColliderId {
    pub fn next() -> Self {
        Self(NEXT_COLLIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Category/mask filter. Two colliders may touch when each one's category
/// is present in the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroup {
    pub category: u32,
    pub mask: u32,
}

impl Default for CollisionGroup {
    fn default() -> Self {
        Self::ALL
    }
}

impl CollisionGroup {
    pub const ALL: CollisionGroup = CollisionGroup {
        category: u32::MAX,
        mask: u32::MAX,
    };

    pub const NONE: CollisionGroup = CollisionGroup {
        category: 0,
        mask: 0,
    };

    pub fn new(category: u32, mask: u32) -> Self {
        Self { category, mask }
    }

    pub fn can_collide(&self, other: &CollisionGroup) -> bool {
        (self.category & other.mask) != 0 && (other.category & self.mask) != 0
    }
}

/// State shared by every collider variant.
#[derive(Debug, Clone)]
pub struct ColliderBase {
    pub(crate) id: ColliderId,
    pub(crate) owner: Option<BodyId>,
    pub(crate) offset: Vec2,
    /// Offset of the enclosing composite, if any.
    pub(crate) parent_offset: Vec2,
    pub(crate) group: CollisionGroup,
    pub(crate) transform: Option<Transform>,
}

impl Default for ColliderBase {
    fn default() -> Self {
        Self {
            id: ColliderId::next(),
            owner: None,
            offset: Vec2::ZERO,
            parent_offset: Vec2::ZERO,
            group: CollisionGroup::ALL,
            transform: None,
        }
    }
}

impl ColliderBase {
    /// Last transform passed to `update`, or identity before the first update.
    pub fn transform(&self) -> Transform {
        self.transform.unwrap_or_default()
    }

    pub fn is_updated(&self) -> bool {
        self.transform.is_some()
    }

    /// Offset from the owner's origin, including an enclosing composite's offset.
    pub fn total_offset(&self) -> Vec2 {
        self.offset + self.parent_offset
    }

    /// Shape-local point mapped into world space.
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.transform().apply(local + self.total_offset())
    }

    /// World point mapped into the owner's local frame.
    pub fn to_owner_local(&self, world: Vec2) -> Vec2 {
        self.transform().apply_inverse(world)
    }
}

/// Polymorphic collision shape.
///
/// [`Collider::update`] must be called with the owner's transform before any
/// geometric query in a tick; queries before the first update are a
/// programming error and trip a debug assertion.
#[derive(Debug, Clone)]
pub enum Collider {
    Circle(CircleCollider),
    Polygon(PolygonCollider),
    Composite(CompositeCollider),
}

impl From<CircleCollider> for Collider {
    fn from(value: CircleCollider) -> Self {
        Collider::Circle(value)
    }
}

impl From<PolygonCollider> for Collider {
    fn from(value: PolygonCollider) -> Self {
        Collider::Polygon(value)
    }
}

impl From<CompositeCollider> for Collider {
    fn from(value: CompositeCollider) -> Self {
        Collider::Composite(value)
    }
}

impl Collider {
    pub fn base(&self) -> &ColliderBase {
        match self {
            Collider::Circle(c) => &c.base,
            Collider::Polygon(p) => &p.base,
            Collider::Composite(c) => &c.base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut ColliderBase {
        match self {
            Collider::Circle(c) => &mut c.base,
            Collider::Polygon(p) => &mut p.base,
            Collider::Composite(c) => &mut c.base,
        }
    }

    pub fn id(&self) -> ColliderId {
        self.base().id
    }

    pub fn owner(&self) -> Option<BodyId> {
        self.base().owner
    }

    pub fn set_owner(&mut self, owner: Option<BodyId>) {
        match self {
            Collider::Composite(composite) => composite.set_owner(owner),
            other => other.base_mut().owner = owner,
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.base().offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        match self {
            Collider::Composite(composite) => composite.set_offset(offset),
            other => other.base_mut().offset = offset,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.set_offset(offset);
        self
    }

    pub fn group(&self) -> CollisionGroup {
        self.base().group
    }

    pub fn set_group(&mut self, group: CollisionGroup) {
        self.base_mut().group = group;
    }

    pub fn with_group(mut self, group: CollisionGroup) -> Self {
        self.set_group(group);
        self
    }

    /// Transform supplied by the last `update`, if any.
    pub fn transform(&self) -> Option<Transform> {
        self.base().transform
    }

    /// Caches world-space geometry for `transform` (the owning body's transform).
    pub fn update(&mut self, transform: &Transform) {
        match self {
            Collider::Circle(c) => c.update(transform),
            Collider::Polygon(p) => p.update(transform),
            Collider::Composite(c) => c.update(transform),
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        match self {
            Collider::Circle(c) => c.bounds(),
            Collider::Polygon(p) => p.bounds(),
            Collider::Composite(c) => c.bounds(),
        }
    }

    /// Bounds in the owner's local space, offset included.
    pub fn local_bounds(&self) -> BoundingBox {
        match self {
            Collider::Circle(c) => c.local_bounds(),
            Collider::Polygon(p) => p.local_bounds(),
            Collider::Composite(c) => c.local_bounds(),
        }
    }

    /// Candidate separating axes in world space. Circles contribute none.
    pub fn axes(&self) -> Vec<Vec2> {
        match self {
            Collider::Circle(_) => Vec::new(),
            Collider::Polygon(p) => p.axes().to_vec(),
            Collider::Composite(c) => c.axes(),
        }
    }

    pub fn center(&self) -> Vec2 {
        match self {
            Collider::Circle(c) => c.world_center(),
            Collider::Polygon(p) => p.center(),
            Collider::Composite(c) => c.center(),
        }
    }

    /// World point furthest along `direction`.
    pub fn furthest_point(&self, direction: Vec2) -> Vec2 {
        match self {
            Collider::Circle(c) => c.furthest_point(direction),
            Collider::Polygon(p) => p.furthest_point(direction),
            Collider::Composite(c) => c.furthest_point(direction),
        }
    }

    /// Moment of inertia about the owner's origin for the given mass.
    pub fn inertia(&self, mass: f32) -> f32 {
        match self {
            Collider::Circle(c) => c.inertia(mass),
            Collider::Polygon(p) => p.inertia(mass),
            Collider::Composite(c) => c.inertia(mass),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Collider::Circle(c) => c.contains(point),
            Collider::Polygon(p) => p.contains(point),
            Collider::Composite(c) => c.contains(point),
        }
    }

    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> Option<RayCastHit> {
        match self {
            Collider::Circle(c) => c.ray_cast(ray, max_distance),
            Collider::Polygon(p) => p.ray_cast(ray, max_distance),
            Collider::Composite(c) => c.ray_cast(ray, max_distance),
        }
    }

    pub fn project(&self, axis: Vec2) -> Projection {
        debug_assert!(
            self.base().is_updated(),
            "collider {:?} projected before update",
            self.id()
        );
        match self {
            Collider::Circle(c) => c.project(axis),
            Collider::Polygon(p) => p.project(axis),
            Collider::Composite(c) => c.project(axis),
        }
    }

    /// Exact contacts against `other`, using a throwaway narrow phase.
    ///
    /// A convenience for one-off checks. Per-tick callers should hold a
    /// [`NarrowPhase`] and use [`Collider::collide_with`] so separation
    /// results are pooled across calls.
    pub fn collide(&self, other: &Collider) -> Vec<CollisionContact> {
        self.collide_with(other, &mut NarrowPhase::new())
    }

    /// Exact contacts against `other`, reusing `narrow_phase`'s pools.
    pub fn collide_with(
        &self,
        other: &Collider,
        narrow_phase: &mut NarrowPhase,
    ) -> Vec<CollisionContact> {
        narrow_phase.collide(self, other)
    }

    /// True when the two shapes currently overlap.
    pub fn touching(&self, other: &Collider) -> bool {
        self.bounds().overlaps(&other.bounds()) && !self.collide(other).is_empty()
    }

    /// Shortest segment from this collider's surface to `other`'s, beginning on `self`.
    pub fn closest_line_between(&self, other: &Collider) -> LineSegment {
        match self {
            Collider::Circle(c) => c.closest_line_between(other),
            Collider::Polygon(p) => p.closest_line_between(other),
            Collider::Composite(c) => c.closest_line_between(other),
        }
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw, color: DebugColor) {
        match self {
            Collider::Circle(c) => c.debug(draw, color),
            Collider::Polygon(p) => p.debug(draw, color),
            Collider::Composite(c) => c.debug(draw, color),
        }
    }

    /// Copy of the geometry under a fresh id, detached from any owner.
    pub fn clone_with_new_id(&self) -> Collider {
        match self {
            Collider::Composite(composite) => Collider::Composite(composite.clone_with_new_ids()),
            other => {
                let mut copy = other.clone();
                let base = copy.base_mut();
                base.id = ColliderId::next();
                base.owner = None;
                copy
            }
        }
    }

    pub fn as_circle(&self) -> Option<&CircleCollider> {
        match self {
            Collider::Circle(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&PolygonCollider> {
        match self {
            Collider::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeCollider> {
        match self {
            Collider::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut CompositeCollider> {
        match self {
            Collider::Composite(c) => Some(c),
            _ => None,
        }
    }
}
