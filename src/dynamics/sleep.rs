//! Motion-averaged sleeping.

use log::debug;

use crate::{
    config::BodyConfig,
    core::rigidbody::{BodyId, RigidBody},
    utils::allocator::Arena,
};

/// Feeds this tick's motion into every body's average and returns the bodies that fell asleep.
pub fn update_sleep(bodies: &mut Arena<RigidBody>, config: &BodyConfig) -> Vec<BodyId> {
    let mut slept = Vec::new();
    for (id, body) in bodies.iter_mut() {
        if body.update_motion(config) {
            debug!("body {id:?} fell asleep");
            slept.push(id);
        }
    }
    slept
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn only_resting_bodies_fall_asleep() {
        let config = BodyConfig::default();
        let mut bodies = Arena::new();
        let resting = bodies.insert(RigidBody::dynamic(Vec2::ZERO));
        let moving =
            bodies.insert(RigidBody::dynamic(Vec2::ZERO).with_velocity(Vec2::new(5.0, 0.0), 0.0));
        let insomniac = bodies.insert(RigidBody::dynamic(Vec2::ZERO).with_sleep(false));

        let mut slept = Vec::new();
        for _ in 0..100 {
            slept.extend(update_sleep(&mut bodies, &config));
        }
        assert_eq!(slept, vec![resting]);
        assert!(!bodies[moving].is_sleeping());
        assert!(!bodies[insomniac].is_sleeping());
    }
}
