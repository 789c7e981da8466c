use glam::Vec2;

use crate::core::segment::LineSegment;

const EPSILON: f32 = 1e-6;

/// Half-plane `normal · p <= distance`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: Vec2,
    distance: f32,
}

impl Plane {
    pub fn new(normal: Vec2, distance: f32) -> Self {
        Self { normal, distance }
    }

    pub fn from_point_normal(point: Vec2, normal: Vec2) -> Self {
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    fn signed_distance(&self, point: Vec2) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Sutherland-Hodgman clip of a two-point polygon against one plane.
///
/// Returns `None` when fewer than two points survive.
pub fn clip_segment(segment: &LineSegment, plane: &Plane) -> Option<LineSegment> {
    let begin_dist = plane.signed_distance(segment.begin);
    let end_dist = plane.signed_distance(segment.end);

    let mut kept = [Vec2::ZERO; 2];
    let mut count = 0;

    if begin_dist <= 0.0 {
        kept[count] = segment.begin;
        count += 1;
    }
    if end_dist <= 0.0 {
        kept[count] = segment.end;
        count += 1;
    }
    if begin_dist * end_dist < 0.0 && count < 2 {
        if let Some(intersection) =
            line_plane_intersection(segment.begin, segment.end, begin_dist, end_dist)
        {
            kept[count] = intersection;
            count += 1;
        }
    }

    (count == 2).then(|| LineSegment::new(kept[0], kept[1]))
}

/// Clips a segment to the slab between the two side planes of a reference edge.
pub fn clip_to_side_planes(incident: &LineSegment, reference: &LineSegment) -> Option<LineSegment> {
    let tangent = reference.direction().normalize_or_zero();
    if tangent == Vec2::ZERO {
        return None;
    }
    let clipped = clip_segment(incident, &Plane::from_point_normal(reference.begin, -tangent))?;
    clip_segment(&clipped, &Plane::from_point_normal(reference.end, tangent))
}

fn line_plane_intersection(start: Vec2, end: Vec2, start_dist: f32, end_dist: f32) -> Option<Vec2> {
    let denom = start_dist - end_dist;
    if denom.abs() <= EPSILON {
        return None;
    }
    let t = start_dist / denom;
    Some(start + (end - start) * t)
}
