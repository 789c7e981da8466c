//! Shortest segments between collider surfaces.
//!
//! Every segment begins on the first collider and ends on the second. For
//! overlapping shapes the segment still joins the nearest surface features,
//! so its length is not a penetration depth.

use glam::Vec2;

use crate::{
    collision::shapes::{CircleCollider, PolygonCollider},
    core::segment::LineSegment,
};

pub fn circle_circle(a: &CircleCollider, b: &CircleCollider) -> LineSegment {
    let (center_a, center_b) = (a.world_center(), b.world_center());
    let direction = (center_b - center_a).try_normalize().unwrap_or(Vec2::X);
    LineSegment::new(
        center_a + direction * a.world_radius(),
        center_b - direction * b.world_radius(),
    )
}

pub fn circle_polygon(circle: &CircleCollider, polygon: &PolygonCollider) -> LineSegment {
    let center = circle.world_center();
    let on_polygon = closest_boundary_point(polygon, center);
    let direction = (on_polygon - center).try_normalize().unwrap_or(Vec2::X);
    LineSegment::new(center + direction * circle.world_radius(), on_polygon)
}

pub fn polygon_circle(polygon: &PolygonCollider, circle: &CircleCollider) -> LineSegment {
    reversed(circle_polygon(circle, polygon))
}

/// For convex polygons the shortest segment always has a vertex at one end.
pub fn polygon_polygon(a: &PolygonCollider, b: &PolygonCollider) -> LineSegment {
    let from_a = a
        .world_points()
        .iter()
        .map(|&p| LineSegment::new(p, closest_boundary_point(b, p)));
    let from_b = b
        .world_points()
        .iter()
        .map(|&q| LineSegment::new(closest_boundary_point(a, q), q));
    shortest(from_a.chain(from_b)).unwrap_or_else(|| LineSegment::new(a.center(), b.center()))
}

pub fn reversed(segment: LineSegment) -> LineSegment {
    LineSegment::new(segment.end, segment.begin)
}

/// Shortest of `segments`, first one winning ties.
pub fn shortest(segments: impl IntoIterator<Item = LineSegment>) -> Option<LineSegment> {
    segments.into_iter().fold(None, |best: Option<LineSegment>, segment| match best {
        Some(best) if best.length() <= segment.length() => Some(best),
        _ => Some(segment),
    })
}

fn closest_boundary_point(polygon: &PolygonCollider, point: Vec2) -> Vec2 {
    polygon
        .sides()
        .iter()
        .map(|side| side.closest_point(point))
        .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point)))
        .unwrap_or_else(|| polygon.center())
}
