//! Concrete collider shapes behind [`crate::core::collider::Collider`].

pub mod circle;
pub mod composite;
pub mod polygon;

pub use circle::CircleCollider;
pub use composite::{CompositeCollider, CompositeStrategy};
pub use polygon::PolygonCollider;
