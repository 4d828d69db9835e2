/// Outbound notifications to the shading subsystem

use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::resource::GeometryRecord;

/// Outcome of a shader activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderActivation {
    /// A (different) program was activated; previously bound geometry state is stale
    Activated,
    /// The requested program was already active
    Unchanged,
}

/// The shading subsystem, as seen from the geometry manager
///
/// Calls are delivered synchronously and in order during a draw:
/// `geometry_updated`, then `activate_shader`, then (only when the geometry
/// is not already bound) `geometry_exported`.
///
/// Implementations must not call back into the `GeometryManager` that is
/// notifying them.
pub trait ShadingSubsystem: Send {
    /// A record is about to be drawn; prepare a program for its vertex layout
    fn geometry_updated(&mut self, record: &GeometryRecord);

    /// Activate the program for the upcoming draw
    fn activate_shader(&mut self) -> ShaderActivation;

    /// Bind the record's vertex attributes to the active program's inputs
    fn geometry_exported(&mut self, record: &GeometryRecord, device: &mut dyn GraphicsDevice) -> Result<()>;
}
