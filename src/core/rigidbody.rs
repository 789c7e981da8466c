use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::types::{Transform, Velocity};
use crate::{
    config::BodyConfig, error::ConfigError, utils::allocator::Handle, utils::math::cross,
};

/// Handle to a body stored in the world's arena.
pub type BodyId = Handle<RigidBody>;

/// How a body takes part in collision resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionType {
    /// Detects contacts and is moved by them.
    #[default]
    Active,
    /// Detects contacts and reports events but is never resolved.
    Passive,
    /// Immovable; other bodies are resolved against it.
    Fixed,
    /// Never participates in collisions at all.
    PreventCollision,
}

/// Motion axes that the solver and integrator are not allowed to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DegreeOfFreedom {
    pub lock_rotation: bool,
    pub lock_x: bool,
    pub lock_y: bool,
}

impl DegreeOfFreedom {
    /// Zeroes the locked components of a linear change.
    pub fn filter_linear(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            if self.lock_x { 0.0 } else { v.x },
            if self.lock_y { 0.0 } else { v.y },
        )
    }

    pub fn filter_angular(&self, w: f32) -> f32 {
        if self.lock_rotation { 0.0 } else { w }
    }
}

/// 2D rigid body state read and written by the integrator and solver.
///
/// The center of mass coincides with `transform.position`.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub transform: Transform,
    pub previous_transform: Transform,
    pub velocity: Velocity,
    pub acceleration: Vec2,
    pub torque: f32,
    pub bounciness: f32,
    pub friction: f32,
    pub collision_type: CollisionType,
    pub use_gravity: bool,
    pub can_sleep: bool,
    pub locks: DegreeOfFreedom,
    mass: f32,
    inverse_mass: f32,
    inertia: f32,
    inverse_inertia: f32,
    sleeping: bool,
    sleep_motion: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            transform: Transform::default(),
            previous_transform: Transform::default(),
            velocity: Velocity::default(),
            acceleration: Vec2::ZERO,
            torque: 0.0,
            bounciness: 0.2,
            friction: 0.99,
            collision_type: CollisionType::Active,
            use_gravity: true,
            can_sleep: true,
            locks: DegreeOfFreedom::default(),
            mass: crate::config::DEFAULT_BODY_MASS,
            inverse_mass: 0.0,
            inertia: 1.0,
            inverse_inertia: 0.0,
            sleeping: false,
            sleep_motion: f32::MAX,
        };
        body.recompute_inverses();
        body
    }
}

impl RigidBody {
    pub fn new(collision_type: CollisionType, position: Vec2) -> Self {
        let transform = Transform::from_position(position);
        let mut body = Self {
            collision_type,
            transform,
            previous_transform: transform,
            ..Self::default()
        };
        body.recompute_inverses();
        body
    }

    pub fn dynamic(position: Vec2) -> Self {
        Self::new(CollisionType::Active, position)
    }

    pub fn fixed(position: Vec2) -> Self {
        Self::new(CollisionType::Fixed, position)
    }

    /// Seeds mass and sleep defaults from a body configuration.
    pub fn from_config(config: &BodyConfig, collision_type: CollisionType, position: Vec2) -> Self {
        let mut body = Self::new(collision_type, position);
        body.can_sleep = config.can_sleep_by_default;
        body.mass = config.default_mass;
        body.recompute_inverses();
        body
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.transform.rotation = rotation;
        self.previous_transform.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, linear: Vec2, angular: f32) -> Self {
        self.velocity = Velocity { linear, angular };
        self
    }

    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    pub fn with_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    pub fn with_locks(mut self, locks: DegreeOfFreedom) -> Self {
        self.locks = locks;
        self.recompute_inverses();
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Result<Self, ConfigError> {
        self.set_mass(mass)?;
        Ok(self)
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    pub fn rotation(&self) -> f32 {
        self.transform.rotation
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Rejects non-positive or non-finite masses.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), ConfigError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(ConfigError::InvalidMass(mass));
        }
        self.mass = mass;
        self.recompute_inverses();
        Ok(())
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Sets the moment of inertia, usually from `Collider::inertia(mass)`.
    pub fn set_inertia(&mut self, inertia: f32) {
        self.inertia = if inertia.is_finite() && inertia > 0.0 {
            inertia
        } else {
            1.0
        };
        self.recompute_inverses();
    }

    pub fn set_collision_type(&mut self, collision_type: CollisionType) {
        self.collision_type = collision_type;
        self.recompute_inverses();
    }

    /// Zero for fixed bodies.
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Zero for fixed bodies and bodies with locked rotation.
    pub fn inverse_inertia(&self) -> f32 {
        self.inverse_inertia
    }

    pub fn is_fixed(&self) -> bool {
        self.collision_type == CollisionType::Fixed
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn sleep_motion(&self) -> f32 {
        self.sleep_motion
    }

    /// Fixed and sleeping bodies take no velocity or position changes from contacts.
    pub fn is_immovable(&self) -> bool {
        self.inverse_mass == 0.0 || self.sleeping
    }

    pub fn set_sleeping(&mut self, sleeping: bool) {
        if sleeping {
            self.sleep();
        } else {
            self.wake();
        }
    }

    pub fn sleep(&mut self) {
        self.sleeping = true;
        self.velocity = Velocity::default();
        self.acceleration = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Wakes the body and resets its motion average so it stays awake for a while.
    pub fn wake(&mut self) {
        self.sleeping = false;
        self.sleep_motion = f32::MAX;
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if self.inverse_mass == 0.0 {
            return;
        }
        self.acceleration += self.locks.filter_linear(force * self.inverse_mass);
        self.wake();
    }

    pub fn apply_torque(&mut self, torque: f32) {
        if self.inverse_inertia == 0.0 {
            return;
        }
        self.torque += torque;
        self.wake();
    }

    /// Applies a world-space impulse at a world-space point and wakes the body.
    pub fn apply_impulse(&mut self, point: Vec2, impulse: Vec2) {
        if self.inverse_mass == 0.0 {
            return;
        }
        self.wake();
        self.apply_velocity_impulse(point - self.transform.position, impulse);
    }

    /// Velocity change from an impulse at offset `r` from the center of mass.
    ///
    /// Does not touch the sleep state; the solver calls this on awake bodies only.
    pub fn apply_velocity_impulse(&mut self, r: Vec2, impulse: Vec2) {
        self.velocity.linear += self.locks.filter_linear(impulse * self.inverse_mass);
        self.velocity.angular += self
            .locks
            .filter_angular(cross(r, impulse) * self.inverse_inertia);
    }

    /// Positional counterpart of [`RigidBody::apply_velocity_impulse`].
    pub fn apply_position_impulse(&mut self, r: Vec2, impulse: Vec2) {
        self.transform.position += self.locks.filter_linear(impulse * self.inverse_mass);
        self.transform.rotation += self
            .locks
            .filter_angular(cross(r, impulse) * self.inverse_inertia);
    }

    /// Advances the exponential motion average; returns true if the body just fell asleep.
    pub fn update_motion(&mut self, config: &BodyConfig) -> bool {
        if !self.can_sleep || self.sleeping || self.collision_type != CollisionType::Active {
            return false;
        }
        let current = self.velocity.linear.length_squared()
            + self.velocity.angular * self.velocity.angular;
        let bias = config.sleep_bias;
        // A freshly woken body starts well above the threshold.
        let previous = if self.sleep_motion == f32::MAX {
            5.0 * config.sleep_epsilon
        } else {
            self.sleep_motion
        };
        let averaged = bias * previous + (1.0 - bias) * current;
        self.sleep_motion = averaged.min(10.0 * config.sleep_epsilon);
        if self.sleep_motion < config.sleep_epsilon {
            self.sleep();
            return true;
        }
        false
    }

    fn recompute_inverses(&mut self) {
        if self.collision_type == CollisionType::Fixed {
            self.inverse_mass = 0.0;
            self.inverse_inertia = 0.0;
            return;
        }
        self.inverse_mass = 1.0 / self.mass;
        self.inverse_inertia = if self.locks.lock_rotation {
            0.0
        } else {
            1.0 / self.inertia
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bodies_have_zero_inverse_mass() {
        let body = RigidBody::fixed(Vec2::ZERO);
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.inverse_inertia(), 0.0);
        assert!(body.is_immovable());
    }

    #[test]
    fn set_mass_rejects_non_positive_values() {
        let mut body = RigidBody::dynamic(Vec2::ZERO);
        assert!(matches!(body.set_mass(-1.0), Err(ConfigError::InvalidMass(_))));
        assert!(body.set_mass(f32::NAN).is_err());
        body.set_mass(4.0).expect("positive mass");
        assert_eq!(body.inverse_mass(), 0.25);
    }

    #[test]
    fn locked_axes_ignore_impulses() {
        let mut body = RigidBody::dynamic(Vec2::ZERO).with_locks(DegreeOfFreedom {
            lock_rotation: true,
            lock_x: true,
            lock_y: false,
        });
        body.apply_impulse(Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0));
        assert_eq!(body.velocity.linear.x, 0.0);
        assert!(body.velocity.linear.y > 0.0);
        assert_eq!(body.velocity.angular, 0.0);
    }

    #[test]
    fn resting_body_falls_asleep() {
        let config = BodyConfig::default();
        let mut body = RigidBody::dynamic(Vec2::ZERO);
        let mut slept = false;
        for _ in 0..200 {
            slept |= body.update_motion(&config);
        }
        assert!(slept);
        assert!(body.is_sleeping());
        body.apply_impulse(Vec2::ZERO, Vec2::X);
        assert!(!body.is_sleeping());
    }
}
