use glam::Vec2;

use crate::{core::rigidbody::RigidBody, utils::allocator::Arena};

/// Semi-implicit Euler stepping for awake, movable bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub gravity: Vec2,
}

impl Integrator {
    pub fn new(gravity: Vec2) -> Self {
        Self { gravity }
    }

    fn skips(body: &RigidBody) -> bool {
        body.is_fixed() || body.is_sleeping()
    }

    pub fn integrate_velocity(&self, body: &mut RigidBody, dt: f32) {
        if Self::skips(body) {
            return;
        }
        let mut acceleration = body.acceleration;
        if body.use_gravity {
            acceleration += self.gravity;
        }
        body.velocity.linear += body.locks.filter_linear(acceleration * dt);
        body.velocity.angular += body
            .locks
            .filter_angular(body.torque * body.inverse_inertia() * dt);

        body.acceleration = Vec2::ZERO;
        body.torque = 0.0;
    }

    pub fn integrate_position(&self, body: &mut RigidBody, dt: f32) {
        body.previous_transform = body.transform;
        if Self::skips(body) {
            return;
        }
        body.transform.position += body.locks.filter_linear(body.velocity.linear * dt);
        body.transform.rotation += body.locks.filter_angular(body.velocity.angular * dt);
    }

    /// Velocities first, then positions from the new velocities.
    pub fn step(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_velocity(body, dt);
            self.integrate_position(body, dt);
        }
    }
}
