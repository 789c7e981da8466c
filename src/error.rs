//! Error types for collider construction and configuration loading.
//!
//! Runtime conditions such as "no contact" or "nothing under the ray" are
//! ordinary return values and never appear here.

use thiserror::Error;

/// Rejected collider geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("non-finite coordinate at point {index}")]
    NonFinitePoint { index: usize },
    #[error("edge {index} has zero length")]
    ZeroLengthEdge { index: usize },
    #[error("polygon has zero area")]
    ZeroArea,
    #[error("polygon is not convex (reflex vertex at {index}); use PolygonCollider::triangulate")]
    NotConvex { index: usize },
    #[error("polygon could not be triangulated")]
    TriangulationFailed,
    #[error("circle radius must be finite and positive, got {0}")]
    InvalidRadius(f32),
    #[error("composite collider has no children")]
    EmptyComposite,
}

/// Rejected configuration snapshot.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min}, got {value}")]
    IterationCount {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("{field} must be finite and non-negative, got {value}")]
    NegativeOrNonFinite { field: &'static str, value: f32 },
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("mass must be finite and positive, got {0}")]
    InvalidMass(f32),
    #[error("failed to parse physics config: {0}")]
    Parse(#[from] serde_json::Error),
}
