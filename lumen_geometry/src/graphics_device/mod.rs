/// Graphics device module - the low-level GPU surface the geometry cache talks to
///
/// Buffer objects are opaque handles; a `GraphicsDevice` is the per-surface
/// context that creates and destroys them and records draw state.

// Module declarations
pub mod graphics_device;
pub mod buffer;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
