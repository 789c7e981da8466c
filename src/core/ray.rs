use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::segment::LineSegment;
use crate::utils::math::{cross, EPSILON};

/// Half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec2,
    pub direction: Vec2,
}

impl Ray {
    /// Normalizes `direction`; a zero direction yields a ray that hits nothing.
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the segment, if the ray crosses it.
    pub fn intersect_segment(&self, segment: &LineSegment) -> Option<f32> {
        let edge = segment.end - segment.begin;
        let denom = cross(self.direction, edge);
        if denom.abs() < EPSILON {
            return None;
        }
        let to_begin = segment.begin - self.origin;
        let t = cross(to_begin, edge) / denom;
        let u = cross(to_begin, self.direction) / denom;
        if t >= 0.0 && (-EPSILON..=1.0 + EPSILON).contains(&u) {
            Some(t)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crosses_vertical_segment() {
        let ray = Ray::new(Vec2::ZERO, Vec2::new(2.0, 0.0));
        let wall = LineSegment::new(Vec2::new(3.0, -1.0), Vec2::new(3.0, 1.0));
        assert_eq!(ray.intersect_segment(&wall), Some(3.0));
    }

    #[test]
    fn parallel_and_behind_segments_miss() {
        let ray = Ray::new(Vec2::ZERO, Vec2::X);
        let parallel = LineSegment::new(Vec2::new(0.0, 1.0), Vec2::new(5.0, 1.0));
        let behind = LineSegment::new(Vec2::new(-3.0, -1.0), Vec2::new(-3.0, 1.0));
        assert_eq!(ray.intersect_segment(&parallel), None);
        assert_eq!(ray.intersect_segment(&behind), None);
    }
}
