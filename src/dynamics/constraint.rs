use glam::Vec2;

use crate::{
    collision::contact::{ContactAnchor, ContactFeature, ContactId},
    core::rigidbody::{BodyId, RigidBody},
    utils::math::cross,
};

/// Solver state for one contact point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactConstraintPoint {
    /// World point at detection time.
    pub point: Vec2,
    /// `point` in body A's local frame, used to match points between ticks.
    pub local_a: Vec2,
    pub local_b: Vec2,
    /// Offsets from each body's center of mass.
    pub r_a: Vec2,
    pub r_b: Vec2,
    pub normal_mass: f32,
    pub tangent_mass: f32,
    /// Accumulated impulses; the normal one never goes negative.
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    /// Target normal separation speed from restitution.
    pub velocity_bias: f32,
    pub anchor: ContactAnchor,
}

impl ContactConstraintPoint {
    /// Effective masses for a point of a contact between `a` and `b`.
    pub fn new(
        point: Vec2,
        anchor: ContactAnchor,
        a: &RigidBody,
        b: &RigidBody,
        normal: Vec2,
        tangent: Vec2,
    ) -> Self {
        let r_a = point - a.transform.position;
        let r_b = point - b.transform.position;
        Self {
            point,
            local_a: a.transform.apply_inverse(point),
            local_b: b.transform.apply_inverse(point),
            r_a,
            r_b,
            normal_mass: effective_mass(a, b, r_a, r_b, normal),
            tangent_mass: effective_mass(a, b, r_a, r_b, tangent),
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            velocity_bias: 0.0,
            anchor,
        }
    }

    /// Velocity of B relative to A at this point.
    pub fn relative_velocity(&self, a: &RigidBody, b: &RigidBody) -> Vec2 {
        b.velocity.at_point(self.r_b) - a.velocity.at_point(self.r_a)
    }
}

/// A contact prepared for solving, with combined material properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactConstraint {
    pub id: ContactId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub normal: Vec2,
    pub tangent: Vec2,
    pub friction: f32,
    pub restitution: f32,
    pub feature: Option<ContactFeature>,
    pub points: Vec<ContactConstraintPoint>,
}

impl ContactConstraint {
    pub fn normal_impulse_sum(&self) -> f32 {
        self.points.iter().map(|p| p.normal_impulse).sum()
    }
}

/// Inverse mass a body shows the solver: zero when it cannot be moved by contacts.
pub fn solver_inverse_mass(body: &RigidBody) -> f32 {
    if body.is_immovable() {
        0.0
    } else {
        body.inverse_mass()
    }
}

pub fn solver_inverse_inertia(body: &RigidBody) -> f32 {
    if body.is_immovable() {
        0.0
    } else {
        body.inverse_inertia()
    }
}

/// `1 / (m_a⁻¹ + m_b⁻¹ + I_a⁻¹ (r_a × d)² + I_b⁻¹ (r_b × d)²)`, or zero when both are immovable.
pub fn effective_mass(a: &RigidBody, b: &RigidBody, r_a: Vec2, r_b: Vec2, direction: Vec2) -> f32 {
    let rn_a = cross(r_a, direction);
    let rn_b = cross(r_b, direction);
    let k = solver_inverse_mass(a)
        + solver_inverse_mass(b)
        + solver_inverse_inertia(a) * rn_a * rn_a
        + solver_inverse_inertia(b) * rn_b * rn_b;
    if k > f32::EPSILON {
        1.0 / k
    } else {
        0.0
    }
}
