/// Draw protocol with bind elision.
///
/// A draw notifies the shading subsystem, refreshes the record's LRU key,
/// exports and binds the geometry unless it is already bound, then issues
/// the indexed draw.

use crate::error::{Error, Result};
use crate::graphics_device::IndexType;
use crate::resource::geometry_cache::GeometryState;
use crate::resource::{EngineEvent, GeometryConfig, ShaderActivation, ShadingSubsystem};
use crate::utils::lock_or_recover;
use crate::engine_trace;

const SOURCE: &str = "lumen::RenderCoordinator";

impl GeometryState {
    /// Draw the record `type_id` of the active surface
    ///
    /// Lock order is state, then shading, then device. Nothing here
    /// allocates, so the evictor never runs during a draw.
    pub(crate) fn draw_geometry(
        &mut self,
        type_id: &str,
        mut shading: Option<&mut (dyn ShadingSubsystem + 'static)>,
        config: &GeometryConfig,
    ) -> Result<()> {
        let surface = self.active_surface.ok_or(Error::NoActiveSurface)?;
        let graphics_device = self.surfaces.graphics_device(surface).ok_or_else(|| {
            Error::InvalidResource(format!("active surface {:?} is no longer live", surface))
        })?;

        let Some(record) = self.caches.get(&surface).and_then(|cache| cache.get(type_id)) else {
            return Err(Error::InvalidResource(format!("geometry '{}' does not exist", type_id)));
        };

        if let Some(shading) = shading.as_deref_mut() {
            shading.geometry_updated(record);
            if shading.activate_shader() == ShaderActivation::Activated {
                self.apply_event(EngineEvent::ShaderActivated)?;
            }
        }

        let serial = self.take_use_serial();
        let clock = self.clock;
        let Some(record) = self.caches.get_mut(&surface).and_then(|cache| cache.get_mut(type_id)) else {
            return Err(Error::InvalidResource(format!("geometry '{}' does not exist", type_id)));
        };
        record.touch(clock, serial);
        let record = &*record;

        let mut graphics_device = lock_or_recover(&graphics_device);

        if self.bound_type.as_deref() == Some(type_id) {
            self.stats.elided_binds += 1;
        } else {
            // A failed rebind leaves the device half-bound
            self.bound_type = None;
            for slot in 0..config.vertex_attribute_slots {
                graphics_device.disable_vertex_attribute(slot)?;
            }
            if let Some(shading) = shading.as_deref_mut() {
                shading.geometry_exported(record, &mut *graphics_device)?;
            }
            graphics_device.bind_index_buffer(record.index_buffer().buffer())?;
            self.bound_type = Some(type_id.to_string());
            self.stats.binds += 1;
            engine_trace!(SOURCE, "Bound geometry '{}'", type_id);
        }

        graphics_device.draw_indexed(record.primitive(), record.index_count(), IndexType::U16)?;
        if config.flush_after_draw {
            graphics_device.flush()?;
        }
        self.stats.draws += 1;
        engine_trace!(SOURCE, "Drew geometry '{}' ({} {} indices)", type_id, record.index_count(), record.primitive());
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_coordinator_tests.rs"]
mod tests;
