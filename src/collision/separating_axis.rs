//! Separating axis searches between convex shapes.
//!
//! Every search returns a pooled [`SeparationInfo`]. A positive separation
//! means the shapes are disjoint along the reported axis; a negative one is
//! the overlap along the least-penetrating axis found. Results are only valid
//! for the tick that produced them and must be released back to the pool.

use glam::Vec2;
use log::warn;

use crate::{
    collision::shapes::{CircleCollider, PolygonCollider},
    core::{collider::ColliderId, segment::LineSegment},
    utils::{
        math::EPSILON,
        pool::{Pool, Poolable},
    },
};

/// Best axis found by a separating axis search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparationInfo {
    /// Collider whose side produced the axis.
    pub collider: Option<ColliderId>,
    /// Signed distance along `axis`; positive when disjoint.
    pub separation: f32,
    /// World-space axis, pointing out of `collider`.
    pub axis: Vec2,
    /// `axis` in the frame of the collider's owner.
    pub local_axis: Vec2,
    /// Reference side, absent for circle vertex regions.
    pub side: Option<LineSegment>,
    pub local_side: Option<LineSegment>,
    pub side_id: usize,
    /// Deepest point of the other shape along `-axis`.
    pub point: Vec2,
    /// `point` in the frame of the other collider's owner.
    pub local_point: Vec2,
}

impl Default for SeparationInfo {
    fn default() -> Self {
        Self {
            collider: None,
            separation: f32::MAX,
            axis: Vec2::ZERO,
            local_axis: Vec2::ZERO,
            side: None,
            local_side: None,
            side_id: 0,
            point: Vec2::ZERO,
            local_point: Vec2::ZERO,
        }
    }
}

impl Poolable for SeparationInfo {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl SeparationInfo {
    pub fn is_separated(&self) -> bool {
        self.separation > 0.0
    }
}

pub type SeparationPool = Pool<SeparationInfo>;

/// Deepest face of `a` against `b`.
///
/// Stops at the first side of `a` with a positive separation. Among equal
/// separations the earliest side wins.
pub fn find_polygon_polygon_separation(
    a: &PolygonCollider,
    b: &PolygonCollider,
    pool: &mut SeparationPool,
) -> SeparationInfo {
    let mut best_separation = f32::NEG_INFINITY;
    let mut best_side = 0;
    let mut best_point = Vec2::ZERO;

    for (i, (side, axis)) in a.sides().iter().zip(a.axes()).enumerate() {
        let point = b.furthest_point(-*axis);
        let separation = axis.dot(point - side.begin);
        if separation > best_separation {
            best_separation = separation;
            best_side = i;
            best_point = point;
            if separation > 0.0 {
                break;
            }
        }
    }

    let mut info = pool.acquire();
    let axis = a.axes().get(best_side).copied().unwrap_or(Vec2::X);
    fill_face(&mut info, a, best_side, axis);
    info.separation = best_separation;
    info.point = best_point;
    info.local_point = b.base.to_owner_local(best_point);
    info
}

/// Circle against polygon, choosing between the polygon's face and vertex regions.
///
/// The axis points from the polygon toward the circle and `point` is the
/// circle's deepest point along it.
pub fn find_circle_polygon_separation(
    circle: &CircleCollider,
    polygon: &PolygonCollider,
    pool: &mut SeparationPool,
) -> SeparationInfo {
    let center = circle.world_center();
    let radius = circle.world_radius();
    let sides = polygon.sides();
    let axes = polygon.axes();

    let mut face = 0;
    let mut face_distance = f32::NEG_INFINITY;
    for (i, (side, axis)) in sides.iter().zip(axes).enumerate() {
        let distance = axis.dot(center - side.begin);
        if distance > face_distance {
            face_distance = distance;
            face = i;
        }
    }

    let mut info = pool.acquire();
    let face_axis = axes.get(face).copied().unwrap_or(Vec2::X);
    let Some(side) = sides.get(face).copied() else {
        return info;
    };

    if face_distance > radius || face_distance < EPSILON {
        // Clear miss, or the center is inside: the face normal decides.
        fill_face(&mut info, polygon, face, face_axis);
        info.separation = face_distance - radius;
    } else {
        let u1 = (center - side.begin).dot(side.end - side.begin);
        let u2 = (center - side.end).dot(side.begin - side.end);
        let vertex = if u1 <= 0.0 {
            Some(side.begin)
        } else if u2 <= 0.0 {
            Some(side.end)
        } else {
            None
        };
        match vertex {
            Some(vertex) => {
                let axis = (center - vertex).normalize_or(face_axis);
                info.collider = Some(polygon.base.id);
                info.axis = axis;
                info.local_axis = polygon.base.transform().inverse_rotate_vector(axis);
                info.side = None;
                info.local_side = None;
                info.side_id = face;
                info.separation = center.distance(vertex) - radius;
            }
            None => {
                fill_face(&mut info, polygon, face, face_axis);
                info.separation = face_distance - radius;
            }
        }
    }

    info.point = center - info.axis * radius;
    info.local_point = circle.base.to_owner_local(info.point);
    info
}

/// Fallback for polygons whose sides collapsed (zero scale, slivers): the axis
/// joins the two centers and the separation is the negated projection overlap.
pub fn find_polygon_polygon_separation_degenerate(
    a: &PolygonCollider,
    b: &PolygonCollider,
    pool: &mut SeparationPool,
) -> SeparationInfo {
    let center_a = a.center();
    let center_b = b.center();
    let axis = (center_b - center_a).normalize_or(Vec2::X);
    let overlap = a.project(axis).overlap(&b.project(axis));
    warn!(
        "degenerate polygon pair {:?}/{:?}, using center axis {:?}",
        a.base.id, b.base.id, axis
    );

    let mut info = pool.acquire();
    info.collider = Some(a.base.id);
    info.separation = -overlap;
    info.axis = axis;
    info.local_axis = a.base.transform().inverse_rotate_vector(axis);
    info.point = b.furthest_point(-axis);
    info.local_point = b.base.to_owner_local(info.point);
    info
}

/// True when a polygon's world sides can no longer produce meaningful axes.
pub fn is_degenerate(polygon: &PolygonCollider) -> bool {
    polygon.axes().is_empty()
        || polygon
            .axes()
            .iter()
            .any(|axis| !axis.is_finite() || axis.length_squared() < 0.5)
}

fn fill_face(info: &mut SeparationInfo, owner: &PolygonCollider, side_id: usize, axis: Vec2) {
    let side = owner.sides().get(side_id).copied();
    info.collider = Some(owner.base.id);
    info.axis = axis;
    info.local_axis = owner.base.transform().inverse_rotate_vector(axis);
    info.side = side;
    info.local_side = side.map(|s| s.transform(|p| owner.base.to_owner_local(p)));
    info.side_id = side_id;
}
