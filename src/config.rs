//! Global configuration for the Impulse2D core.
//!
//! The `DEFAULT_*` constants seed the serde-backed configuration structs.
//! Callers load a [`PhysicsConfig`] once, validate it, and hand the core a
//! read-only snapshot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.81];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Number of velocity iterations performed per tick.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;

/// Number of position iterations performed per tick.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Allowed penetration before position correction kicks in.
pub const DEFAULT_SLOP: f32 = 0.01;

/// Fraction of the remaining penetration corrected per position iteration.
pub const DEFAULT_STEERING_FACTOR: f32 = 0.2;

/// Largest positional correction applied by a single position iteration.
pub const DEFAULT_MAX_POSITION_CORRECTION: f32 = 0.2;

/// Closing speed below which restitution is ignored.
pub const DEFAULT_RESTITUTION_VELOCITY_THRESHOLD: f32 = 1.0;

/// Maximum drift of a contact point between ticks for its impulses to carry over.
pub const DEFAULT_WARM_START_MATCH_DISTANCE: f32 = 0.1;

/// Padding added around each leaf of the dynamic tree.
pub const DEFAULT_TREE_BOUNDS_PADDING: f32 = 0.1;

/// Scale applied to a proxy's displacement when fattening its leaf.
pub const DEFAULT_TREE_VELOCITY_MULTIPLIER: f32 = 2.0;

/// Default cell size for the sparse hash grid.
pub const DEFAULT_HASH_GRID_SIZE: f32 = 2.0;

/// Motion below which a body is allowed to fall asleep.
pub const DEFAULT_SLEEP_EPSILON: f32 = 0.07;

/// Weight of the previous motion sample in the sleep moving average.
pub const DEFAULT_SLEEP_BIAS: f32 = 0.9;

/// Mass given to bodies that are not assigned one explicitly.
pub const DEFAULT_BODY_MASS: f32 = 10.0;

/// Distance a CCD-corrected body is kept away from the surface it hit.
pub const DEFAULT_CCD_SURFACE_EPSILON: f32 = 0.01;

/// Which spatial index feeds candidate pairs to the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpatialPartitionStrategy {
    #[default]
    DynamicTree,
    SparseHashGrid,
}

/// Sequential-impulse solver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub position_iterations: u32,
    pub velocity_iterations: u32,
    /// Penetration tolerated without positional correction.
    pub slop: f32,
    /// Baumgarte-style fraction of penetration corrected per position iteration.
    pub steering_factor: f32,
    /// Cap on a single positional correction step.
    pub max_position_correction: f32,
    pub warm_start: bool,
    pub restitution_velocity_threshold: f32,
    pub warm_start_match_distance: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            slop: DEFAULT_SLOP,
            steering_factor: DEFAULT_STEERING_FACTOR,
            max_position_correction: DEFAULT_MAX_POSITION_CORRECTION,
            warm_start: true,
            restitution_velocity_threshold: DEFAULT_RESTITUTION_VELOCITY_THRESHOLD,
            warm_start_match_distance: DEFAULT_WARM_START_MATCH_DISTANCE,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.velocity_iterations == 0 {
            return Err(ConfigError::IterationCount {
                field: "solver.velocity_iterations",
                min: 1,
                value: self.velocity_iterations,
            });
        }
        non_negative("solver.slop", self.slop)?;
        non_negative("solver.max_position_correction", self.max_position_correction)?;
        non_negative(
            "solver.restitution_velocity_threshold",
            self.restitution_velocity_threshold,
        )?;
        non_negative("solver.warm_start_match_distance", self.warm_start_match_distance)?;
        in_range("solver.steering_factor", self.steering_factor, 0.0, 1.0)
    }
}

/// Leaf fattening for the dynamic AABB tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicTreeConfig {
    pub bounds_padding: f32,
    pub velocity_multiplier: f32,
}

impl Default for DynamicTreeConfig {
    fn default() -> Self {
        Self {
            bounds_padding: DEFAULT_TREE_BOUNDS_PADDING,
            velocity_multiplier: DEFAULT_TREE_VELOCITY_MULTIPLIER,
        }
    }
}

impl DynamicTreeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("dynamic_tree.bounds_padding", self.bounds_padding)?;
        non_negative("dynamic_tree.velocity_multiplier", self.velocity_multiplier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseHashGridConfig {
    /// Edge length of one grid cell.
    pub size: f32,
}

impl Default for SparseHashGridConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_HASH_GRID_SIZE,
        }
    }
}

impl SparseHashGridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("sparse_hash_grid.size", self.size)
    }
}

/// Defaults applied to bodies and the sleep heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub can_sleep_by_default: bool,
    pub sleep_epsilon: f32,
    pub wake_threshold: f32,
    pub sleep_bias: f32,
    pub default_mass: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            can_sleep_by_default: false,
            sleep_epsilon: DEFAULT_SLEEP_EPSILON,
            wake_threshold: DEFAULT_SLEEP_EPSILON * 3.0,
            sleep_bias: DEFAULT_SLEEP_BIAS,
            default_mass: DEFAULT_BODY_MASS,
        }
    }
}

impl BodyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("bodies.sleep_epsilon", self.sleep_epsilon)?;
        non_negative("bodies.wake_threshold", self.wake_threshold)?;
        in_range("bodies.sleep_bias", self.sleep_bias, 0.0, 1.0)?;
        if !(self.default_mass.is_finite() && self.default_mass > 0.0) {
            return Err(ConfigError::InvalidMass(self.default_mass));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcdConfig {
    pub enabled: bool,
    pub surface_epsilon: f32,
}

impl Default for CcdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            surface_epsilon: DEFAULT_CCD_SURFACE_EPSILON,
        }
    }
}

/// Complete configuration snapshot consumed at the start of each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    pub fixed_time_step: f32,
    pub spatial_partition: SpatialPartitionStrategy,
    pub dynamic_tree: DynamicTreeConfig,
    pub sparse_hash_grid: SparseHashGridConfig,
    pub solver: SolverConfig,
    pub bodies: BodyConfig,
    pub ccd: CcdConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::from_array(DEFAULT_GRAVITY),
            fixed_time_step: DEFAULT_TIME_STEP,
            spatial_partition: SpatialPartitionStrategy::default(),
            dynamic_tree: DynamicTreeConfig::default(),
            sparse_hash_grid: SparseHashGridConfig::default(),
            solver: SolverConfig::default(),
            bodies: BodyConfig::default(),
            ccd: CcdConfig::default(),
        }
    }
}

impl PhysicsConfig {
    /// Parses a JSON document (missing fields fall back to defaults) and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self.validate_inner();
        if let Err(err) = &result {
            log::warn!("rejected physics config: {err}");
        }
        result
    }

    fn validate_inner(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::NegativeOrNonFinite {
                field: "gravity",
                value: f32::NAN,
            });
        }
        positive("fixed_time_step", self.fixed_time_step)?;
        self.dynamic_tree.validate()?;
        self.sparse_hash_grid.validate()?;
        self.solver.validate()?;
        self.bodies.validate()?;
        non_negative("ccd.surface_epsilon", self.ccd.surface_epsilon)
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeOrNonFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}
