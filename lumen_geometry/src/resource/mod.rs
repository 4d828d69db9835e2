//! Geometry resource module
//!
//! Per-surface geometry caches, the draw protocol and the lifecycle
//! listener, all driven through `GeometryManager`.

mod config;
mod geometry;
mod geometry_buffer;
mod geometry_cache;
mod geometry_manager;
mod lifecycle;
mod render_coordinator;
mod shading;

#[cfg(test)]
pub(crate) mod mock_shading;

pub use config::GeometryConfig;
pub use geometry::{GeometryDesc, GeometryRecord, VertexAttributes};
pub(crate) use geometry::GeometryBuffers;
pub use geometry_buffer::GeometryBuffer;
pub use geometry_cache::GeometryStats;
pub use geometry_manager::GeometryManager;
pub use lifecycle::EngineEvent;
pub use shading::{ShaderActivation, ShadingSubsystem};
