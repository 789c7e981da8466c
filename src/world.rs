//! Per-tick orchestration of bodies, colliders and the solver.

mod collision_manager;
mod dynamics_manager;

pub use collision_manager::CollisionManager;
pub use dynamics_manager::DynamicsManager;

use std::time::Instant;

use log::{debug, warn};

use crate::{
    collision::{
        contact::{CollisionContact, ContactEvent},
        queries::{RayCastHit, RayCastOptions},
    },
    config::PhysicsConfig,
    core::{
        bounds::BoundingBox,
        collider::{Collider, ColliderId},
        ray::Ray,
        rigidbody::{BodyId, RigidBody},
    },
    debug::DebugDraw,
    utils::{
        allocator::Arena,
        logging::{warn_if_tick_budget_exceeded, ScopedTimer},
        profiling::{PhaseTimer, PhysicsProfiler},
    },
};

/// Central simulation container.
///
/// Each tick runs: integrate, continuous collision, collider and index
/// update, candidate pairs, narrow phase, solver, contact events, sleeping.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: Arena<RigidBody>,
    collision: CollisionManager,
    dynamics: DynamicsManager,
    time_accumulated: f32,
    events: Vec<ContactEvent>,
    profiler: PhysicsProfiler,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            collision: CollisionManager::new(&config),
            dynamics: DynamicsManager::new(&config),
            config,
            bodies: Arena::new(),
            time_accumulated: 0.0,
            events: Vec::new(),
            profiler: PhysicsProfiler::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyId {
        self.bodies.insert(body)
    }

    /// Removes a body with all its colliders; their contacts end right away.
    pub fn remove_body(&mut self, id: BodyId) -> Option<RigidBody> {
        let body = self.bodies.remove(id)?;
        for collider in self.collision.owned_by(id) {
            self.detach_collider(collider);
        }
        self.dynamics.solver.forget_body(id);
        Some(body)
    }

    /// Attaches `collider` to `body` and seeds the body's inertia from its shape.
    /// Returns `None` when the body does not exist.
    pub fn attach_collider(
        &mut self,
        body: BodyId,
        collider: impl Into<Collider>,
    ) -> Option<ColliderId> {
        let owner = self.bodies.get_mut(body)?;
        let mut collider = collider.into();
        collider.set_owner(Some(body));
        collider.update(&owner.transform);
        owner.set_inertia(collider.inertia(owner.mass()));
        Some(self.collision.insert(collider))
    }

    pub fn detach_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let (mut collider, events) = self.collision.remove(id)?;
        self.events.extend(events);
        collider.set_owner(None);
        Some(collider)
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &Arena<RigidBody> {
        &self.bodies
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.collision.collider(id)
    }

    pub fn colliders(&self) -> impl Iterator<Item = &Collider> + '_ {
        self.collision.colliders()
    }

    /// Contacts found by the last tick.
    pub fn contacts(&self) -> &[CollisionContact] {
        self.collision.contacts()
    }

    /// Contact start and end events since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn dynamics(&self) -> &DynamicsManager {
        &self.dynamics
    }

    pub fn profiler(&self) -> &PhysicsProfiler {
        &self.profiler
    }

    /// Advances by `dt` in fixed ticks; leftover time carries to the next call.
    /// Returns the number of ticks run.
    pub fn step(&mut self, dt: f32) -> usize {
        if !dt.is_finite() || dt < 0.0 {
            warn!("ignoring invalid step duration {dt}");
            return 0;
        }
        self.time_accumulated += dt;
        let fixed = self.config.fixed_time_step;
        let mut ticks = 0;
        while self.time_accumulated >= fixed {
            self.time_accumulated -= fixed;
            self.tick(fixed);
            ticks += 1;
        }
        ticks
    }

    /// Runs exactly one tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let started = Instant::now();
        self.profiler.reset();
        let profiler = &mut self.profiler;

        {
            let _timer = ScopedTimer::new("integrate");
            let _phase = PhaseTimer::new(&mut profiler.integrate_time);
            self.dynamics.integrate(&mut self.bodies, dt);
        }
        {
            let _timer = ScopedTimer::new("ccd");
            let _phase = PhaseTimer::new(&mut profiler.ccd_time);
            let swept = self.collision.continuous(&mut self.bodies);
            if swept > 0 {
                debug!("ccd corrected {swept} bodies");
            }
        }
        {
            let _timer = ScopedTimer::new("broad phase");
            let _phase = PhaseTimer::new(&mut profiler.broad_phase_time);
            self.collision.update(&self.bodies);
        }
        {
            let _timer = ScopedTimer::new("narrow phase");
            let _phase = PhaseTimer::new(&mut profiler.narrow_phase_time);
            self.collision.find_contacts(&self.bodies);
        }
        {
            let _timer = ScopedTimer::new("solver");
            let _phase = PhaseTimer::new(&mut profiler.solver_time);
            self.dynamics
                .solve(self.collision.contacts(), &mut self.bodies);
        }
        self.events.extend(self.collision.track_events());
        {
            let _timer = ScopedTimer::new("sleep");
            let _phase = PhaseTimer::new(&mut profiler.sleep_time);
            self.dynamics.sleep(&mut self.bodies);
        }

        profiler.body_count = self.bodies.len();
        profiler.collider_count = self.collision.len();
        profiler.pair_count = self.collision.pair_count();
        profiler.contact_count = self.collision.contacts().len();
        profiler.sleeping_count = self
            .bodies
            .iter()
            .filter(|(_, body)| body.is_sleeping())
            .count();
        profiler.total_tick_time = started.elapsed();
        warn_if_tick_budget_exceeded(profiler.total_tick_time, dt * 1000.0);
    }

    /// Colliders whose bounds overlap `bounds`.
    pub fn query(&self, bounds: &BoundingBox) -> Vec<ColliderId> {
        self.collision.query(bounds)
    }

    /// Nearest hit, if any.
    pub fn ray_cast(&self, ray: &Ray, options: &RayCastOptions) -> Option<RayCastHit> {
        let options = RayCastOptions {
            search_all_colliders: false,
            ..*options
        };
        self.collision.ray_cast(ray, &options).into_iter().next()
    }

    /// Every hit, nearest first.
    pub fn ray_cast_all(&self, ray: &Ray, options: &RayCastOptions) -> Vec<RayCastHit> {
        self.collision.ray_cast(ray, &options.all())
    }

    pub fn debug_draw(&self, draw: &mut dyn DebugDraw) {
        self.collision.debug(draw, &self.bodies);
    }
}
