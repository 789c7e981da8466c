use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ray::Ray;

/// Axis-aligned bounding box used by colliders and the spatial indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }
}

impl BoundingBox {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// An inverted box that acts as the identity for [`BoundingBox::combine`].
    pub fn empty() -> Self {
        Self {
            min: Vec2::splat(f32::INFINITY),
            max: Vec2::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        points.iter().fold(Self::empty(), |mut bounds, &p| {
            bounds.extend(p);
            bounds
        })
    }

    pub fn extend(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// True when both corners are finite (rejects NaN and the empty box).
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Perimeter, the 2D surface-area measure used by the tree insertion cost.
    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() + self.height())
    }

    /// Smallest box containing both boxes.
    pub fn combine(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Inclusive overlap test; touching edges overlap. NaN boxes never overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    pub fn inflate(&self, margin: f32) -> BoundingBox {
        BoundingBox {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    pub fn translate(&self, offset: Vec2) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Stretches the box along a displacement so a moving proxy stays inside for longer.
    pub fn expand_by_displacement(&self, displacement: Vec2) -> BoundingBox {
        let mut expanded = *self;
        if displacement.x < 0.0 {
            expanded.min.x += displacement.x;
        } else {
            expanded.max.x += displacement.x;
        }
        if displacement.y < 0.0 {
            expanded.min.y += displacement.y;
        } else {
            expanded.max.y += displacement.y;
        }
        expanded
    }

    /// Slab test returning the entry distance along the ray, if it enters within `max_distance`.
    pub fn ray_cast_time(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        let mut t_min: f32 = 0.0;
        let mut t_max = max_distance;

        for axis in 0..2 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let min = self.min[axis];
            let max = self.max[axis];

            if dir.abs() < 1e-9 {
                if origin < min || origin > max {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir;
                let mut t1 = (min - origin) * inv_dir;
                let mut t2 = (max - origin) * inv_dir;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }

    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> bool {
        self.ray_cast_time(ray, max_distance).is_some()
    }
}
