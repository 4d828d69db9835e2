/*!
# Lumen Geometry

Geometry resource manager of the Lumen rendering engine.

Owns the mapping between geometry type identifiers and the GPU buffers
backing them, one cache per rendering surface, and drives the draw protocol
with the shading subsystem.

## Architecture

- **GeometryManager**: creation, existence checks, draws and lifecycle events
- **MemoryCoordinator**: evictor registry; retries allocations after eviction
- **SurfaceRegistry**: live rendering surfaces and their graphics devices
- **GraphicsDevice**: per-surface buffer and draw primitives (implemented by backends)
- **ShadingSubsystem**: receives update, activation and export notifications

Graphics backends provide concrete types implementing `GraphicsDevice` and
`Buffer`.
*/

// Internal modules
mod error;
mod engine;
mod utils;
pub mod log;
pub mod graphics_device;
pub mod memory;
pub mod resource;
pub mod surface;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Memory-pressure coordination
    pub use crate::memory::{EvictorId, MemoryCoordinator};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Graphics device sub-module
    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Surface sub-module
    pub mod surface {
        pub use crate::surface::*;
    }
}
