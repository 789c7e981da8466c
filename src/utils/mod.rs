//! Utility helpers: math extensions, generational arena, object pool, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod pool;
pub mod profiling;

pub use allocator::{Arena, Handle};
pub use math::*;
pub use pool::{Pool, Poolable};
pub use profiling::PhysicsProfiler;
