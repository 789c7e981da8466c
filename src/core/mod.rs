//! Geometry primitives, transforms, bodies and colliders.

pub mod bounds;
pub mod collider;
pub mod projection;
pub mod ray;
pub mod rigidbody;
pub mod segment;
pub mod types;

pub use bounds::BoundingBox;
pub use collider::{Collider, ColliderId, CollisionGroup};
pub use projection::Projection;
pub use ray::Ray;
pub use rigidbody::{BodyId, CollisionType, DegreeOfFreedom, RigidBody};
pub use segment::LineSegment;
pub use types::{Transform, Velocity};
