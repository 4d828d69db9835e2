//! Rendering surfaces
//!
//! A surface is a rendering target with its own graphics device. The
//! registry models the host environment: a surface that has been destroyed
//! there (context loss, closed view) is no longer live, and resources that
//! belonged to it are considered already released.

mod surface_registry;

pub use surface_registry::{Surface, SurfaceKey, SurfaceRegistry};
