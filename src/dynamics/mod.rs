//! Simulation dynamics: integration, contact constraints, the solver and sleeping.

pub mod constraint;
pub mod friction;
pub mod integrator;
pub mod sleep;
pub mod solver;

pub use constraint::{ContactConstraint, ContactConstraintPoint};
pub use integrator::Integrator;
pub use sleep::update_sleep;
pub use solver::{RealisticSolver, SolverStepMetrics};
