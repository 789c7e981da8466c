//! Collision detection: spatial indices, separating axis tests, contacts, queries, CCD.

pub mod broadphase;
pub mod ccd;
pub mod clipping;
pub mod closest;
pub mod contact;
pub mod dynamic_tree;
pub mod hash_grid;
pub mod narrowphase;
pub mod queries;
pub mod separating_axis;
pub mod shapes;

pub use broadphase::{CollisionProcessor, DynamicTreeProcessor, Pair, SparseHashGridProcessor};
pub use ccd::CcdDetector;
pub use contact::{CollisionContact, ContactEvent, ContactId, ContactPoint, ContactTracker};
pub use dynamic_tree::{ColliderProxy, DynamicTree};
pub use hash_grid::SparseHashGrid;
pub use narrowphase::{contact_separation, NarrowPhase};
pub use queries::{RayCastHit, RayCastOptions};
pub use separating_axis::{SeparationInfo, SeparationPool};
pub use shapes::{CircleCollider, CompositeCollider, CompositeStrategy, PolygonCollider};
