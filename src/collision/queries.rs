use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::{
    collider::{ColliderId, CollisionGroup},
    rigidbody::BodyId,
};

/// Where a ray first enters a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastHit {
    pub collider: ColliderId,
    pub body: Option<BodyId>,
    pub point: Vec2,
    /// Outward surface normal at `point`.
    pub normal: Vec2,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Filters applied to a world ray cast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayCastOptions {
    pub max_distance: f32,
    /// Report every hit instead of stopping at the nearest.
    pub search_all_colliders: bool,
    /// Only colliders whose group accepts this one are hit.
    pub group: CollisionGroup,
}

impl Default for RayCastOptions {
    fn default() -> Self {
        Self {
            max_distance: f32::INFINITY,
            search_all_colliders: false,
            group: CollisionGroup::ALL,
        }
    }
}

impl RayCastOptions {
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_group(mut self, group: CollisionGroup) -> Self {
        self.group = group;
        self
    }

    pub fn all(mut self) -> Self {
        self.search_all_colliders = true;
        self
    }
}

/// Orders hits nearest first, breaking distance ties by collider id.
pub fn sort_hits(hits: &mut [RayCastHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.collider.cmp(&b.collider))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: u32, distance: f32) -> RayCastHit {
        RayCastHit {
            collider: ColliderId(id),
            body: None,
            point: Vec2::ZERO,
            normal: Vec2::X,
            distance,
        }
    }

    #[test]
    fn hits_sort_nearest_first() {
        let mut hits = vec![hit(3, 5.0), hit(1, 2.0), hit(0, 5.0)];
        sort_hits(&mut hits);
        let order: Vec<u32> = hits.iter().map(|h| h.collider.0).collect();
        assert_eq!(order, vec![1, 0, 3]);
    }
}
