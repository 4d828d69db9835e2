/// Registry of live rendering surfaces

use std::sync::{Arc, Mutex};
use slotmap::{new_key_type, SlotMap};

use crate::graphics_device::GraphicsDevice;

new_key_type! {
    /// Stable key of a rendering surface
    ///
    /// Keys of destroyed surfaces are never reused, so a stale key reliably
    /// reports the surface as gone.
    pub struct SurfaceKey;
}

/// A rendering surface and its graphics device
pub struct Surface {
    name: String,
    graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
}

impl Surface {
    /// Surface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Graphics device of this surface
    pub fn graphics_device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.graphics_device
    }
}

/// Host-side registry of rendering surfaces
pub struct SurfaceRegistry {
    surfaces: SlotMap<SurfaceKey, Surface>,
}

impl SurfaceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            surfaces: SlotMap::with_key(),
        }
    }

    /// Register a new surface backed by `graphics_device`
    pub fn create_surface(
        &mut self,
        name: &str,
        graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
    ) -> SurfaceKey {
        self.surfaces.insert(Surface {
            name: name.to_string(),
            graphics_device,
        })
    }

    /// Remove a surface from the host environment
    ///
    /// Returns false if the surface was already gone.
    pub fn destroy_surface(&mut self, key: SurfaceKey) -> bool {
        self.surfaces.remove(key).is_some()
    }

    /// Whether the surface still exists
    pub fn contains(&self, key: SurfaceKey) -> bool {
        self.surfaces.contains_key(key)
    }

    /// Get a surface
    pub fn surface(&self, key: SurfaceKey) -> Option<&Surface> {
        self.surfaces.get(key)
    }

    /// Graphics device of a live surface
    pub fn graphics_device(&self, key: SurfaceKey) -> Option<Arc<Mutex<dyn GraphicsDevice>>> {
        self.surfaces.get(key).map(|s| s.graphics_device.clone())
    }

    /// Name of a live surface
    pub fn name(&self, key: SurfaceKey) -> Option<&str> {
        self.surfaces.get(key).map(|s| s.name.as_str())
    }

    /// Number of live surfaces
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Keys of all live surfaces
    pub fn keys(&self) -> impl Iterator<Item = SurfaceKey> + '_ {
        self.surfaces.keys()
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "surface_registry_tests.rs"]
mod tests;
