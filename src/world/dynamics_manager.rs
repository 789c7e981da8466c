use crate::{
    collision::contact::CollisionContact,
    config::{BodyConfig, PhysicsConfig},
    core::rigidbody::{BodyId, RigidBody},
    dynamics::{integrator::Integrator, sleep::update_sleep, solver::RealisticSolver},
    utils::allocator::Arena,
};

/// Integration, contact solving and sleeping.
#[derive(Debug, Clone)]
pub struct DynamicsManager {
    pub integrator: Integrator,
    pub solver: RealisticSolver,
    bodies: BodyConfig,
}

impl DynamicsManager {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            integrator: Integrator::new(config.gravity),
            solver: RealisticSolver::new(config.solver)
                .with_wake_threshold(config.bodies.wake_threshold),
            bodies: config.bodies,
        }
    }

    pub fn body_config(&self) -> &BodyConfig {
        &self.bodies
    }

    pub fn integrate(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        self.integrator.step(bodies, dt);
    }

    pub fn solve(&mut self, contacts: &[CollisionContact], bodies: &mut Arena<RigidBody>) {
        self.solver.solve(contacts, bodies);
    }

    pub fn sleep(&self, bodies: &mut Arena<RigidBody>) -> Vec<BodyId> {
        update_sleep(bodies, &self.bodies)
    }
}
