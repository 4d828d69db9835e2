/// Engine lifecycle events and their effect on the geometry state.

use crate::error::{Error, Result};
use crate::resource::geometry_cache::{GeometryState, SurfaceCache};
use crate::surface::SurfaceKey;
use crate::{engine_debug, engine_trace, engine_warn};

const SOURCE: &str = "lumen::GeometryLifecycle";

/// Events delivered to the geometry manager, in order, by the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The logical clock advanced to the given tick
    TimeUpdated(u64),
    /// A scene was (re)activated
    SceneActivated,
    /// A rendering surface became active
    SurfaceActivated(SurfaceKey),
    /// The active rendering surface was deactivated
    SurfaceDeactivated,
    /// The shading subsystem activated a program
    ShaderActivated,
    /// The shading subsystem deactivated its program
    ShaderDeactivated,
    /// Global reset: every cached geometry is discarded
    Reset,
}

impl GeometryState {
    /// Apply one lifecycle event
    ///
    /// Only `SurfaceActivated` can fail, when the surface is not live; the
    /// state is left untouched in that case.
    pub(crate) fn apply_event(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::TimeUpdated(tick) => {
                if tick < self.clock {
                    engine_warn!(SOURCE, "Ignoring clock rewind from tick {} to {}", self.clock, tick);
                } else {
                    self.clock = tick;
                }
            }
            EngineEvent::SceneActivated | EngineEvent::SurfaceDeactivated => {
                self.active_surface = None;
                self.bound_type = None;
            }
            EngineEvent::SurfaceActivated(surface) => {
                if !self.surfaces.contains(surface) {
                    return Err(Error::InvalidResource(format!(
                        "cannot activate unknown surface {:?}", surface
                    )));
                }
                if !self.caches.contains_key(&surface) {
                    engine_debug!(SOURCE, "Created geometry cache for surface {:?}", surface);
                    self.caches.insert(surface, SurfaceCache::default());
                }
                self.active_surface = Some(surface);
                self.bound_type = None;
            }
            EngineEvent::ShaderActivated | EngineEvent::ShaderDeactivated => {
                self.bound_type = None;
            }
            EngineEvent::Reset => self.reset(),
        }
        engine_trace!(SOURCE, "Applied {:?}", event);
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
