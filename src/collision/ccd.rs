use log::debug;

use crate::{
    collision::queries::RayCastHit,
    config::CcdConfig,
    core::{
        bounds::BoundingBox,
        ray::Ray,
        rigidbody::{CollisionType, RigidBody},
    },
};

/// Swept-center continuous collision check for fast bodies.
///
/// A body that moved further in one tick than its smallest bounds dimension
/// may have tunnelled through a thin collider. Its center path is ray cast and,
/// on a hit, the body is pulled back to the hit point.
#[derive(Debug, Clone, Copy, Default)]
pub struct CcdDetector {
    config: CcdConfig,
}

impl CcdDetector {
    pub fn new(config: CcdConfig) -> Self {
        Self { config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// The center path to sweep this tick, if the body moved far enough to need one.
    pub fn sweep_ray(&self, body: &RigidBody, bounds: &BoundingBox) -> Option<(Ray, f32)> {
        if !self.config.enabled
            || body.collision_type != CollisionType::Active
            || body.is_sleeping()
            || body.is_fixed()
        {
            return None;
        }
        let start = body.previous_transform.position;
        let travel = body.transform.position - start;
        let distance = travel.length();
        let smallest = bounds.width().min(bounds.height());
        if !distance.is_finite() || distance <= smallest || distance <= f32::EPSILON {
            return None;
        }
        Some((Ray::new(start, travel), distance))
    }

    /// Sweeps `body` with `cast`, which returns the nearest hit on any other
    /// body within the given distance. Returns the hit the body was moved back to.
    pub fn sweep(
        &self,
        body: &mut RigidBody,
        bounds: &BoundingBox,
        mut cast: impl FnMut(&Ray, f32) -> Option<RayCastHit>,
    ) -> Option<RayCastHit> {
        let (ray, distance) = self.sweep_ray(body, bounds)?;
        let hit = cast(&ray, distance)?;
        let stop = (hit.distance - self.config.surface_epsilon).max(0.0);
        body.transform.position = ray.point_at(stop);
        debug!(
            "ccd moved body back {:.3} along {:?} to avoid tunnelling into {:?}",
            distance - stop,
            ray.direction,
            hit.collider
        );
        Some(hit)
    }
}
