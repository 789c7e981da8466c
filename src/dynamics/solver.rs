//! Sequential-impulse contact solver.
//!
//! One tick runs [`RealisticSolver::pre_solve`], [`RealisticSolver::warm_start`],
//! [`RealisticSolver::solve_velocity`], [`RealisticSolver::solve_position`] and
//! [`RealisticSolver::post_solve`] in that order; [`RealisticSolver::solve`]
//! does all of them. Accumulated impulses survive between ticks keyed by
//! [`ContactId`], which is what makes warm starting possible.

use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    collision::contact::{CollisionContact, ContactId},
    config::{SolverConfig, DEFAULT_SLEEP_EPSILON},
    core::rigidbody::{BodyId, CollisionType, RigidBody},
    dynamics::{
        constraint::{
            solver_inverse_inertia, solver_inverse_mass, ContactConstraint,
            ContactConstraintPoint,
        },
        friction::{apply_tangential_friction, combine_friction, combine_restitution},
    },
    utils::{allocator::Arena, math::cross},
};

/// Counters from the last solved tick.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SolverStepMetrics {
    pub contacts_solved: usize,
    pub points_solved: usize,
    pub warm_started_points: usize,
    pub normal_impulse_sum: f32,
    pub tangent_impulse_sum: f32,
}

impl SolverStepMetrics {
    fn record(&mut self, constraints: &[ContactConstraint]) {
        self.contacts_solved = constraints.len();
        self.points_solved = constraints.iter().map(|c| c.points.len()).sum();
        self.normal_impulse_sum = constraints
            .iter()
            .flat_map(|c| &c.points)
            .map(|p| p.normal_impulse.abs())
            .sum();
        self.tangent_impulse_sum = constraints
            .iter()
            .flat_map(|c| &c.points)
            .map(|p| p.tangent_impulse.abs())
            .sum();
    }
}

#[derive(Debug, Clone)]
pub struct RealisticSolver {
    config: SolverConfig,
    wake_threshold: f32,
    constraints: Vec<ContactConstraint>,
    index: HashMap<ContactId, usize>,
    previous: HashMap<ContactId, ContactConstraint>,
    metrics: SolverStepMetrics,
}

impl Default for RealisticSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl RealisticSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            wake_threshold: DEFAULT_SLEEP_EPSILON * 3.0,
            constraints: Vec::new(),
            index: HashMap::new(),
            previous: HashMap::new(),
            metrics: SolverStepMetrics::default(),
        }
    }

    /// Motion an awake body needs to wake a sleeping body it starts touching.
    pub fn with_wake_threshold(mut self, wake_threshold: f32) -> Self {
        self.wake_threshold = wake_threshold;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn metrics(&self) -> SolverStepMetrics {
        self.metrics
    }

    /// This tick's constraint for `id`, or last tick's once `post_solve` has run.
    pub fn constraints(&self, id: ContactId) -> Option<&ContactConstraint> {
        self.index
            .get(&id)
            .and_then(|&i| self.constraints.get(i))
            .or_else(|| self.previous.get(&id))
    }

    /// Runs every phase for one tick.
    pub fn solve(&mut self, contacts: &[CollisionContact], bodies: &mut Arena<RigidBody>) {
        self.pre_solve(contacts, bodies);
        if self.config.warm_start {
            self.warm_start(bodies);
        }
        self.solve_velocity(bodies);
        self.solve_position(bodies);
        self.post_solve();
    }

    /// Builds constraints for this tick's contacts and carries over last tick's impulses.
    pub fn pre_solve(&mut self, contacts: &[CollisionContact], bodies: &mut Arena<RigidBody>) {
        self.constraints.clear();
        self.index.clear();
        let mut warm_started = 0;

        for contact in contacts {
            let (Some(id_a), Some(id_b)) = (contact.body_a, contact.body_b) else {
                continue;
            };
            let is_new = !self.previous.contains_key(&contact.id);
            let Some((a, b)) = bodies.get2_mut(id_a, id_b) else {
                continue;
            };
            if is_new {
                wake_on_impact(a, b, self.wake_threshold);
            }
            if !resolvable(a, b) {
                continue;
            }

            let restitution = combine_restitution(a.bounciness, b.bounciness);
            let mut constraint = ContactConstraint {
                id: contact.id,
                body_a: id_a,
                body_b: id_b,
                normal: contact.normal,
                tangent: contact.tangent,
                friction: combine_friction(a.friction, b.friction),
                restitution,
                feature: contact.feature,
                points: Vec::with_capacity(contact.points.len()),
            };
            for contact_point in &contact.points {
                let mut point = ContactConstraintPoint::new(
                    contact_point.point,
                    contact_point.anchor,
                    a,
                    b,
                    contact.normal,
                    contact.tangent,
                );
                let closing = point.relative_velocity(a, b).dot(contact.normal);
                if closing < -self.config.restitution_velocity_threshold {
                    point.velocity_bias = -restitution * closing;
                }
                constraint.points.push(point);
            }

            if self.config.warm_start {
                if let Some(previous) = self.previous.get(&contact.id) {
                    warm_started += carry_impulses(
                        &mut constraint,
                        previous,
                        self.config.warm_start_match_distance,
                    );
                }
            }

            self.index.insert(contact.id, self.constraints.len());
            self.constraints.push(constraint);
        }

        self.metrics.warm_started_points = warm_started;
        trace!(
            "pre-solve: {} constraints, {} warm-started points",
            self.constraints.len(),
            warm_started
        );
    }

    /// Applies the carried-over impulses before iterating.
    pub fn warm_start(&mut self, bodies: &mut Arena<RigidBody>) {
        for constraint in &self.constraints {
            let Some((a, b)) = bodies.get2_mut(constraint.body_a, constraint.body_b) else {
                continue;
            };
            for point in &constraint.points {
                let impulse = constraint.normal * point.normal_impulse
                    + constraint.tangent * point.tangent_impulse;
                if impulse.length_squared() <= f32::EPSILON * f32::EPSILON {
                    continue;
                }
                if !a.is_immovable() {
                    a.apply_velocity_impulse(point.r_a, -impulse);
                }
                if !b.is_immovable() {
                    b.apply_velocity_impulse(point.r_b, impulse);
                }
            }
        }
    }

    /// Iterated normal then friction impulses; accumulated normal impulses never go negative.
    pub fn solve_velocity(&mut self, bodies: &mut Arena<RigidBody>) {
        for _ in 0..self.config.velocity_iterations {
            for constraint in &mut self.constraints {
                let Some((a, b)) = bodies.get2_mut(constraint.body_a, constraint.body_b) else {
                    continue;
                };
                for point in &mut constraint.points {
                    let normal_velocity = point.relative_velocity(a, b).dot(constraint.normal);
                    let lambda = point.normal_mass * (-normal_velocity + point.velocity_bias);
                    let accumulated = (point.normal_impulse + lambda).max(0.0);
                    let delta = accumulated - point.normal_impulse;
                    point.normal_impulse = accumulated;

                    let impulse = constraint.normal * delta;
                    if !a.is_immovable() {
                        a.apply_velocity_impulse(point.r_a, -impulse);
                    }
                    if !b.is_immovable() {
                        b.apply_velocity_impulse(point.r_b, impulse);
                    }

                    apply_tangential_friction(a, b, point, constraint.tangent, constraint.friction);
                }
            }
        }
    }

    /// Pushes overlapping bodies apart by a fraction of their current penetration.
    pub fn solve_position(&mut self, bodies: &mut Arena<RigidBody>) {
        let config = self.config;
        for _ in 0..config.position_iterations {
            for constraint in &self.constraints {
                let Some((a, b)) = bodies.get2_mut(constraint.body_a, constraint.body_b) else {
                    continue;
                };
                for point in &constraint.points {
                    let current = point.anchor.evaluate(&a.transform, &b.transform);
                    let steering = (config.steering_factor * (current.separation + config.slop))
                        .clamp(-config.max_position_correction, 0.0);
                    if steering == 0.0 {
                        continue;
                    }

                    let normal = current.normal;
                    let r_a = current.point - a.transform.position;
                    let r_b = current.point - b.transform.position;
                    let rn_a = cross(r_a, normal);
                    let rn_b = cross(r_b, normal);
                    let k = solver_inverse_mass(a)
                        + solver_inverse_mass(b)
                        + solver_inverse_inertia(a) * rn_a * rn_a
                        + solver_inverse_inertia(b) * rn_b * rn_b;
                    if k <= f32::EPSILON {
                        continue;
                    }

                    let impulse = normal * (-steering / k);
                    if !a.is_immovable() {
                        a.apply_position_impulse(r_a, -impulse);
                    }
                    if !b.is_immovable() {
                        b.apply_position_impulse(r_b, impulse);
                    }
                }
            }
        }
    }

    /// Keeps this tick's impulses for the next warm start; vanished contacts are dropped.
    pub fn post_solve(&mut self) {
        self.metrics.record(&self.constraints);
        let dropped = self
            .previous
            .keys()
            .filter(|id| !self.index.contains_key(id))
            .count();
        if dropped > 0 {
            debug!("solver dropped {dropped} stale contact caches");
        }
        self.previous = self
            .constraints
            .drain(..)
            .map(|constraint| (constraint.id, constraint))
            .collect();
        self.index.clear();
    }

    /// Forgets cached impulses involving `body`.
    pub fn forget_body(&mut self, body: BodyId) {
        self.previous
            .retain(|_, c| c.body_a != body && c.body_b != body);
    }

    pub fn clear(&mut self) {
        self.constraints.clear();
        self.index.clear();
        self.previous.clear();
    }
}

/// Passive and collision-free bodies, and pairs where neither side can move, are not resolved.
fn resolvable(a: &RigidBody, b: &RigidBody) -> bool {
    let detect_only = |body: &RigidBody| {
        matches!(
            body.collision_type,
            CollisionType::Passive | CollisionType::PreventCollision
        )
    };
    !(detect_only(a) || detect_only(b) || (a.is_immovable() && b.is_immovable()))
}

/// A new contact with an awake, moving active body wakes a sleeping partner.
fn wake_on_impact(a: &mut RigidBody, b: &mut RigidBody, wake_threshold: f32) {
    let stirs = |body: &RigidBody| {
        body.collision_type == CollisionType::Active
            && !body.is_sleeping()
            && body.sleep_motion() >= wake_threshold
    };
    if a.is_sleeping() && stirs(b) {
        a.wake();
        debug!("woke sleeping body on new contact");
    } else if b.is_sleeping() && stirs(a) {
        b.wake();
        debug!("woke sleeping body on new contact");
    }
}

/// Copies last tick's impulses onto points that have not drifted. Returns how many matched.
fn carry_impulses(
    constraint: &mut ContactConstraint,
    previous: &ContactConstraint,
    match_distance: f32,
) -> usize {
    if constraint.feature != previous.feature {
        return 0;
    }
    let max_sq = match_distance * match_distance;
    let mut matched = 0;
    for point in &mut constraint.points {
        let nearest = previous
            .points
            .iter()
            .map(|old| (old, old.local_a.distance_squared(point.local_a)))
            .filter(|(_, d)| *d <= max_sq)
            .min_by(|x, y| x.1.total_cmp(&y.1));
        if let Some((old, _)) = nearest {
            point.normal_impulse = old.normal_impulse;
            point.tangent_impulse = old.tangent_impulse;
            matched += 1;
        }
    }
    matched
}
