/// Per-surface geometry caches and the LRU eviction policy.
///
/// `GeometryState` is the single context object shared by the geometry
/// manager and its evictor: the surface registry, one cache per activated
/// surface, the active surface, the currently bound type, and the logical
/// clock.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::resource::GeometryRecord;
use crate::surface::{SurfaceKey, SurfaceRegistry};
use crate::utils::lock_or_recover;
use crate::{engine_debug, engine_info, engine_warn};

const SOURCE: &str = "lumen::GeometryCache";

/// Geometry records of one surface, keyed by type identifier
pub(crate) type SurfaceCache = FxHashMap<String, GeometryRecord>;

/// Lifetime counters of a geometry manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryStats {
    /// Records created (including re-creations of an existing type)
    pub created: u64,
    /// Records destroyed, for any reason
    pub destroyed: u64,
    /// Records destroyed by the evictor
    pub evicted: u64,
    /// Draw calls issued
    pub draws: u64,
    /// Draws that exported and bound geometry
    pub binds: u64,
    /// Draws that reused the already bound geometry
    pub elided_binds: u64,
}

pub(crate) struct GeometryState {
    pub(crate) surfaces: SurfaceRegistry,
    pub(crate) caches: FxHashMap<SurfaceKey, SurfaceCache>,
    pub(crate) active_surface: Option<SurfaceKey>,
    pub(crate) bound_type: Option<String>,
    pub(crate) clock: u64,
    next_use_serial: u64,
    next_generated_id: u64,
    pub(crate) stats: GeometryStats,
}

impl GeometryState {
    pub(crate) fn new() -> Self {
        Self {
            surfaces: SurfaceRegistry::new(),
            caches: FxHashMap::default(),
            active_surface: None,
            bound_type: None,
            clock: 0,
            next_use_serial: 0,
            next_generated_id: 0,
            stats: GeometryStats::default(),
        }
    }

    /// Cache of the active surface
    pub(crate) fn active_cache(&self) -> Option<&SurfaceCache> {
        self.active_surface.and_then(|key| self.caches.get(&key))
    }

    /// Record of `type_id` in the active surface's cache
    pub(crate) fn active_record(&self, type_id: &str) -> Option<&GeometryRecord> {
        self.active_cache().and_then(|cache| cache.get(type_id))
    }

    /// Next value of the process-wide use serial
    pub(crate) fn take_use_serial(&mut self) -> u64 {
        let serial = self.next_use_serial;
        self.next_use_serial += 1;
        serial
    }

    /// Generate a type identifier not present in `surface`'s cache
    pub(crate) fn generate_type_id(&mut self, surface: SurfaceKey, prefix: &str) -> String {
        loop {
            let candidate = format!("{}{}", prefix, self.next_generated_id);
            self.next_generated_id += 1;
            let taken = self.caches.get(&surface)
                .is_some_and(|cache| cache.contains_key(&candidate));
            if !taken {
                return candidate;
            }
        }
    }

    /// Store a fully built record in its surface's cache
    ///
    /// A record already stored under the same type is destroyed first. If
    /// the surface's cache no longer exists the new record is released and
    /// an error is returned.
    pub(crate) fn commit(&mut self, record: GeometryRecord) -> Result<()> {
        let surface = record.surface();
        if !self.caches.contains_key(&surface) {
            let type_id = record.type_id().to_string();
            self.release_record(record);
            return Err(Error::InvalidResource(format!(
                "surface cache for geometry '{}' no longer exists", type_id
            )));
        }

        if self.destroy_record(surface, record.type_id()) {
            engine_debug!(SOURCE, "Replaced existing geometry '{}'", record.type_id());
        }

        if let Some(cache) = self.caches.get_mut(&surface) {
            cache.insert(record.type_id().to_string(), record);
            self.stats.created += 1;
        }
        Ok(())
    }

    /// Remove a record from its surface's cache and release its buffers
    ///
    /// The bound type is cleared if it names this type. Buffers are only
    /// released explicitly while the owning surface is still live. Returns
    /// false if there was no such record.
    pub(crate) fn destroy_record(&mut self, surface: SurfaceKey, type_id: &str) -> bool {
        let Some(record) = self.caches.get_mut(&surface).and_then(|cache| cache.remove(type_id)) else {
            return false;
        };

        if self.bound_type.as_deref() == Some(type_id) {
            self.bound_type = None;
        }
        self.release_record(record);
        self.stats.destroyed += 1;
        true
    }

    fn release_record(&self, record: GeometryRecord) {
        let Some(graphics_device) = self.surfaces.graphics_device(record.surface()) else {
            engine_debug!(SOURCE, "Surface of geometry '{}' is gone, skipping buffer release", record.type_id());
            return;
        };
        let mut graphics_device = lock_or_recover(&graphics_device);
        record.destroy(&mut *graphics_device);
    }

    /// Destroy the least recently used record among all live surfaces
    ///
    /// Returns false if no live surface holds any record.
    pub(crate) fn evict_least_recently_used(&mut self) -> bool {
        let candidate = self.caches.iter()
            .filter(|(surface, _)| self.surfaces.contains(**surface))
            .flat_map(|(surface, cache)| cache.values().map(move |record| (*surface, record)))
            .min_by_key(|(_, record)| record.lru_key())
            .map(|(surface, record)| (surface, record.type_id().to_string(), record.last_used()));

        match candidate {
            Some((surface, type_id, last_used)) => {
                self.destroy_record(surface, &type_id);
                self.stats.evicted += 1;
                engine_info!(SOURCE, "Evicted geometry '{}' (last used at tick {})", type_id, last_used);
                true
            }
            None => {
                engine_warn!(SOURCE, "Nothing to evict: no geometry on any live surface");
                false
            }
        }
    }

    /// Destroy every record of every cache and discard all caches
    pub(crate) fn reset(&mut self) {
        let records: Vec<(SurfaceKey, String)> = self.caches.iter()
            .flat_map(|(surface, cache)| cache.keys().map(move |type_id| (*surface, type_id.clone())))
            .collect();

        for (surface, type_id) in &records {
            self.destroy_record(*surface, type_id);
        }

        self.caches.clear();
        self.active_surface = None;
        self.bound_type = None;
        engine_info!(SOURCE, "Reset: destroyed {} geometry record(s)", records.len());
    }
}

#[cfg(test)]
#[path = "geometry_cache_tests.rs"]
mod tests;
