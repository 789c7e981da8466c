//! Impulse2D – a 2D rigid-body collision core for Rust.
//!
//! Colliders are indexed by a dynamic AABB tree (or a sparse hash grid),
//! tested with the separating axis theorem, and resolved by a
//! sequential-impulse solver with warm starting. [`PhysicsWorld`] wires the
//! pieces into a fixed-step simulation; every piece is also usable alone.

pub mod collision;
pub mod config;
pub mod core;
pub mod debug;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use collision::{
    contact::{CollisionContact, ContactEvent, ContactId},
    queries::{RayCastHit, RayCastOptions},
    shapes::{CircleCollider, CompositeCollider, CompositeStrategy, PolygonCollider},
    DynamicTree, NarrowPhase,
};
pub use config::{PhysicsConfig, SpatialPartitionStrategy};
pub use crate::core::{
    bounds::BoundingBox,
    collider::{Collider, ColliderId, CollisionGroup},
    ray::Ray,
    rigidbody::{BodyId, CollisionType, DegreeOfFreedom, RigidBody},
    types::{Transform, Velocity},
};
pub use debug::{DebugColor, DebugDraw, DebugRecorder, NoopDraw};
pub use dynamics::{Integrator, RealisticSolver};
pub use error::{ConfigError, GeometryError};
pub use utils::allocator::{Arena, Handle};
pub use world::PhysicsWorld;
