use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ray::Ray;
use crate::{
    collision::clipping::{clip_segment, Plane},
    utils::math::right_perp,
};

/// Directed line segment. For counter-clockwise polygon loops the normal points outward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub begin: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    pub fn new(begin: Vec2, end: Vec2) -> Self {
        Self { begin, end }
    }

    /// Unnormalized `end - begin`.
    pub fn direction(&self) -> Vec2 {
        self.end - self.begin
    }

    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.begin + self.end) * 0.5
    }

    /// Unit normal on the right of the direction.
    pub fn normal(&self) -> Vec2 {
        right_perp(self.direction()).normalize_or_zero()
    }

    /// Signed distance of `point` from the supporting line, positive on the normal side.
    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        (point - self.begin).dot(self.normal())
    }

    /// True when `point` lies on or behind the segment's supporting line.
    pub fn below(&self, point: Vec2) -> bool {
        self.distance_to_point(point) <= 0.0
    }

    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let dir = self.direction();
        let len_sq = dir.length_squared();
        if len_sq <= f32::EPSILON {
            return self.begin;
        }
        let t = ((point - self.begin).dot(dir) / len_sq).clamp(0.0, 1.0);
        self.begin + dir * t
    }

    /// Keeps the part of the segment where `direction · p <= offset`.
    ///
    /// Returns `None` when less than a full segment survives.
    pub fn clip(&self, direction: Vec2, offset: f32) -> Option<LineSegment> {
        clip_segment(self, &Plane::new(direction, offset))
    }

    /// Distance along `ray` at which it crosses this segment.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_segment(self)
    }

    pub fn transform(&self, f: impl Fn(Vec2) -> Vec2) -> LineSegment {
        LineSegment::new(f(self.begin), f(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccw_bottom_edge_has_downward_normal() {
        let bottom = LineSegment::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0));
        assert_eq!(bottom.normal(), Vec2::new(0.0, -1.0));
        assert!(bottom.below(Vec2::ZERO));
        assert!(!bottom.below(Vec2::new(0.0, -2.0)));
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let s = LineSegment::new(Vec2::ZERO, Vec2::new(2.0, 0.0));
        assert_eq!(s.closest_point(Vec2::new(1.0, 3.0)), Vec2::new(1.0, 0.0));
        assert_eq!(s.closest_point(Vec2::new(-4.0, 1.0)), Vec2::ZERO);
        assert_eq!(s.closest_point(Vec2::new(9.0, 1.0)), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn clip_keeps_inside_half() {
        let s = LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0));
        let clipped = s.clip(Vec2::X, 1.0).expect("segment straddles the plane");
        assert_eq!(clipped.begin, Vec2::ZERO);
        assert_eq!(clipped.end, Vec2::new(1.0, 0.0));
        assert!(s.clip(Vec2::X, -1.0).is_none());
    }
}
