//! Material combination and Coulomb friction for contact points.

use crate::{
    core::rigidbody::RigidBody,
    dynamics::constraint::{solver_inverse_mass, ContactConstraintPoint},
};
use glam::Vec2;

/// Friction of a pair: the less grippy surface wins.
pub fn combine_friction(a: f32, b: f32) -> f32 {
    a.min(b)
}

/// Restitution of a pair: the bouncier surface wins.
pub fn combine_restitution(a: f32, b: f32) -> f32 {
    a.max(b)
}

/// Clamps a new accumulated tangent impulse to the friction cone
/// `|λt| <= μ λn`; returns `(accumulated, delta)`.
pub fn clamp_to_friction_cone(
    accumulated: f32,
    lambda: f32,
    friction: f32,
    normal_impulse: f32,
) -> (f32, f32) {
    let limit = friction * normal_impulse.max(0.0);
    let clamped = (accumulated + lambda).clamp(-limit, limit);
    (clamped, clamped - accumulated)
}

/// Drives the tangential relative velocity at `point` toward zero within the friction cone.
pub fn apply_tangential_friction(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    point: &mut ContactConstraintPoint,
    tangent: Vec2,
    friction: f32,
) -> f32 {
    if solver_inverse_mass(body_a) == 0.0 && solver_inverse_mass(body_b) == 0.0 {
        return 0.0;
    }
    let tangent_velocity = point.relative_velocity(body_a, body_b).dot(tangent);
    let lambda = -tangent_velocity * point.tangent_mass;
    let (accumulated, delta) =
        clamp_to_friction_cone(point.tangent_impulse, lambda, friction, point.normal_impulse);
    point.tangent_impulse = accumulated;

    let impulse = tangent * delta;
    if !body_a.is_immovable() {
        body_a.apply_velocity_impulse(point.r_a, -impulse);
    }
    if !body_b.is_immovable() {
        body_b.apply_velocity_impulse(point.r_b, impulse);
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_impulse_stays_inside_the_cone() {
        let (acc, delta) = clamp_to_friction_cone(0.0, 10.0, 0.5, 4.0);
        assert_eq!(acc, 2.0);
        assert_eq!(delta, 2.0);
        let (acc, delta) = clamp_to_friction_cone(2.0, -10.0, 0.5, 4.0);
        assert_eq!(acc, -2.0);
        assert_eq!(delta, -4.0);
    }

    #[test]
    fn no_normal_impulse_means_no_friction() {
        let (acc, delta) = clamp_to_friction_cone(0.0, 3.0, 1.0, 0.0);
        assert_eq!((acc, delta), (0.0, 0.0));
    }

    #[test]
    fn materials_combine_by_min_and_max() {
        assert_eq!(combine_friction(0.2, 0.9), 0.2);
        assert_eq!(combine_restitution(0.2, 0.9), 0.9);
    }
}
