//! Geometry manager: the public face of the geometry cache.
//!
//! Owns the shared geometry state, registers the LRU evictor with the memory
//! coordinator, and routes creation, draw and lifecycle calls.

use std::sync::{Arc, Mutex, TryLockError, Weak};

use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::memory::{EvictorId, MemoryCoordinator};
use crate::resource::geometry_cache::{GeometryState, GeometryStats};
use crate::resource::{
    EngineEvent, GeometryBuffers, GeometryConfig, GeometryDesc, GeometryRecord, ShadingSubsystem,
};
use crate::surface::SurfaceKey;
use crate::utils::lock_or_recover;
use crate::{engine_debug, engine_error, engine_warn};

const SOURCE: &str = "lumen::GeometryManager";

/// Per-surface geometry cache with LRU eviction and bind elision
///
/// # Example
///
/// ```ignore
/// let memory = Arc::new(MemoryCoordinator::new());
/// let mut geometry = GeometryManager::new(memory.clone());
/// let surface = geometry.create_surface("main", graphics_device);
/// geometry.handle_event(EngineEvent::SurfaceActivated(surface))?;
///
/// let desc = GeometryDesc::new("triangles", positions, vec![0, 1, 2]);
/// let cube = geometry.create_geometry(Some("cube"), desc)?;
/// if geometry.test_geometry_exists(&cube) {
///     geometry.draw_geometry(&cube)?;
/// }
/// ```
pub struct GeometryManager {
    state: Arc<Mutex<GeometryState>>,
    memory: Arc<MemoryCoordinator>,
    evictor: EvictorId,
    shading: Option<Arc<Mutex<dyn ShadingSubsystem>>>,
    config: GeometryConfig,
}

impl GeometryManager {
    /// Create a manager with the default configuration
    pub fn new(memory: Arc<MemoryCoordinator>) -> Self {
        Self::with_config(memory, GeometryConfig::default())
    }

    /// Create a manager and register its evictor with `memory`
    pub fn with_config(memory: Arc<MemoryCoordinator>, config: GeometryConfig) -> Self {
        let state = Arc::new(Mutex::new(GeometryState::new()));
        let weak = Arc::downgrade(&state);
        let evictor = memory.register_evictor("geometry", move || evict_from(&weak));

        Self {
            state,
            memory,
            evictor,
            shading: None,
            config,
        }
    }

    /// Connect the shading subsystem that receives draw notifications
    pub fn set_shading_subsystem(&mut self, shading: Arc<Mutex<dyn ShadingSubsystem>>) {
        self.shading = Some(shading);
    }

    /// Disconnect the shading subsystem
    pub fn clear_shading_subsystem(&mut self) {
        self.shading = None;
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    // ===== SURFACES =====

    /// Register a rendering surface backed by `graphics_device`
    pub fn create_surface(&mut self, name: &str, graphics_device: Arc<Mutex<dyn GraphicsDevice>>) -> SurfaceKey {
        let key = lock_or_recover(&self.state).surfaces.create_surface(name, graphics_device);
        engine_debug!(SOURCE, "Created surface '{}' ({:?})", name, key);
        key
    }

    /// Remove a surface from the host environment (context loss)
    ///
    /// Its cache survives until the next reset; its records are no longer
    /// eviction candidates and their buffers are never explicitly released.
    pub fn destroy_surface(&mut self, key: SurfaceKey) -> bool {
        let destroyed = lock_or_recover(&self.state).surfaces.destroy_surface(key);
        if destroyed {
            engine_debug!(SOURCE, "Destroyed surface {:?}", key);
        }
        destroyed
    }

    // ===== EVENTS =====

    /// Deliver one lifecycle event
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` when activating a surface that is not live.
    pub fn handle_event(&mut self, event: EngineEvent) -> Result<()> {
        lock_or_recover(&self.state)
            .apply_event(event)
            .map_err(log_error)
    }

    // ===== GEOMETRY =====

    /// Create a geometry on the active surface and return its type identifier
    ///
    /// A fresh identifier is generated when `type_id` is `None`. An existing
    /// record with the same identifier is destroyed and replaced, but only
    /// once every buffer of the new record has been allocated.
    ///
    /// # Errors
    ///
    /// * `Error::NoActiveSurface` - No surface is active
    /// * `Error::Configuration` - Missing or invalid primitive or arrays
    /// * `Error::OutOfMemory` - Allocation failed and nothing could be evicted
    ///
    /// On error no buffer allocated by this call is left alive.
    pub fn create_geometry(&mut self, type_id: Option<&str>, desc: GeometryDesc) -> Result<String> {
        let (surface, graphics_device, type_id, primitive) = {
            let mut state = lock_or_recover(&self.state);
            let surface = state.active_surface.ok_or(Error::NoActiveSurface).map_err(log_error)?;
            let graphics_device = state.surfaces.graphics_device(surface)
                .ok_or_else(|| Error::InvalidResource(format!("active surface {:?} is no longer live", surface)))
                .map_err(log_error)?;
            let primitive = desc.validate().map_err(log_error)?;
            let type_id = match type_id {
                Some(type_id) => type_id.to_string(),
                None => state.generate_type_id(surface, &self.config.generated_type_prefix),
            };
            (surface, graphics_device, type_id, primitive)
        };

        // The state lock is released here: allocation may run the evictor
        let buffers = GeometryBuffers::allocate(&self.memory, &graphics_device, &desc)
            .map_err(|error| {
                engine_error!(SOURCE, "Failed to allocate geometry '{}': {}", type_id, error);
                error
            })?;

        let mut state = lock_or_recover(&self.state);
        let serial = state.take_use_serial();
        let record = GeometryRecord::new(type_id.clone(), primitive, buffers, surface, state.clock, serial);
        let (vertex_count, index_count) = (record.vertex_count(), record.index_count());
        state.commit(record).map_err(log_error)?;

        engine_debug!(SOURCE, "Created geometry '{}' ({}, {} vertices, {} indices)",
            type_id, primitive, vertex_count, index_count);
        Ok(type_id)
    }

    /// Whether `type_id` exists in the active surface's cache
    pub fn test_geometry_exists(&self, type_id: &str) -> bool {
        lock_or_recover(&self.state).active_record(type_id).is_some()
    }

    /// Draw a geometry of the active surface
    ///
    /// Callers check `test_geometry_exists` first and re-create evicted
    /// geometry.
    ///
    /// # Errors
    ///
    /// * `Error::NoActiveSurface` - No surface is active
    /// * `Error::InvalidResource` - The geometry does not exist
    /// * Any error reported by the device or the shading subsystem
    pub fn draw_geometry(&mut self, type_id: &str) -> Result<()> {
        let mut state = lock_or_recover(&self.state);
        let mut shading = self.shading.as_ref().map(|shading| lock_or_recover(shading));
        state
            .draw_geometry(type_id, shading.as_deref_mut(), &self.config)
            .map_err(log_error)
    }

    /// Destroy a geometry of the active surface, returns false if absent
    pub fn destroy_geometry(&mut self, type_id: &str) -> bool {
        let mut state = lock_or_recover(&self.state);
        match state.active_surface {
            Some(surface) => state.destroy_record(surface, type_id),
            None => false,
        }
    }

    /// Run the LRU evictor once, as the memory coordinator would
    pub fn evict_least_recently_used(&self) -> bool {
        lock_or_recover(&self.state).evict_least_recently_used()
    }

    // ===== INTROSPECTION =====

    /// Type currently bound on the active surface
    pub fn bound_type(&self) -> Option<String> {
        lock_or_recover(&self.state).bound_type.clone()
    }

    pub fn active_surface(&self) -> Option<SurfaceKey> {
        lock_or_recover(&self.state).active_surface
    }

    /// Current logical tick
    pub fn clock(&self) -> u64 {
        lock_or_recover(&self.state).clock
    }

    /// Last-use tick of a geometry of the active surface
    pub fn last_used(&self, type_id: &str) -> Option<u64> {
        lock_or_recover(&self.state).active_record(type_id).map(GeometryRecord::last_used)
    }

    /// Inspect a geometry of the active surface
    pub fn with_geometry<R>(&self, type_id: &str, f: impl FnOnce(&GeometryRecord) -> R) -> Option<R> {
        lock_or_recover(&self.state).active_record(type_id).map(f)
    }

    /// Number of geometries on the active surface
    pub fn geometry_count(&self) -> usize {
        lock_or_recover(&self.state).active_cache().map_or(0, |cache| cache.len())
    }

    /// Number of geometries across every surface cache
    pub fn total_geometry_count(&self) -> usize {
        lock_or_recover(&self.state).caches.values().map(|cache| cache.len()).sum()
    }

    /// Sorted type identifiers of the active surface
    pub fn geometry_types(&self) -> Vec<String> {
        let state = lock_or_recover(&self.state);
        let mut types: Vec<String> = state.active_cache()
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default();
        types.sort();
        types
    }

    /// Whether a cache exists for `surface`
    pub fn has_surface_cache(&self, surface: SurfaceKey) -> bool {
        lock_or_recover(&self.state).caches.contains_key(&surface)
    }

    pub fn stats(&self) -> GeometryStats {
        lock_or_recover(&self.state).stats
    }
}

impl Drop for GeometryManager {
    fn drop(&mut self) {
        self.memory.unregister_evictor(self.evictor);
    }
}

/// Evictor body: runs inside `MemoryCoordinator::allocate`
fn evict_from(state: &Weak<Mutex<GeometryState>>) -> bool {
    let Some(state) = state.upgrade() else {
        return false;
    };
    let evicted = match state.try_lock() {
        Ok(mut state) => state.evict_least_recently_used(),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().evict_least_recently_used(),
        Err(TryLockError::WouldBlock) => {
            engine_warn!(SOURCE, "Geometry state busy, cannot evict");
            false
        }
    };
    evicted
}

fn log_error(error: Error) -> Error {
    engine_error!(SOURCE, "{}", error);
    error
}

#[cfg(test)]
#[path = "geometry_manager_tests.rs"]
mod tests;
