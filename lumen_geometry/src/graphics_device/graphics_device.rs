/// GraphicsDevice trait - per-surface GPU context

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferDesc};

// ============================================================================
// Common types
// ============================================================================

/// Primitive topology used by an indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Point list
    PointList,
    /// Line list
    LineList,
    /// Closed line loop
    LineLoop,
    /// Line strip
    LineStrip,
    /// Triangle list
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

impl PrimitiveTopology {
    /// All recognized topologies
    pub const ALL: [PrimitiveTopology; 7] = [
        PrimitiveTopology::PointList,
        PrimitiveTopology::LineList,
        PrimitiveTopology::LineLoop,
        PrimitiveTopology::LineStrip,
        PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip,
        PrimitiveTopology::TriangleFan,
    ];

    /// Canonical configuration name ("triangles", "line-strip", ...)
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveTopology::PointList => "points",
            PrimitiveTopology::LineList => "lines",
            PrimitiveTopology::LineLoop => "line-loop",
            PrimitiveTopology::LineStrip => "line-strip",
            PrimitiveTopology::TriangleList => "triangles",
            PrimitiveTopology::TriangleStrip => "triangle-strip",
            PrimitiveTopology::TriangleFan => "triangle-fan",
        }
    }
}

impl fmt::Display for PrimitiveTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveTopology {
    type Err = Error;

    /// Parse a primitive name
    ///
    /// Only the canonical names are accepted, spelled exactly.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "points" => Ok(PrimitiveTopology::PointList),
            "lines" => Ok(PrimitiveTopology::LineList),
            "line-loop" => Ok(PrimitiveTopology::LineLoop),
            "line-strip" => Ok(PrimitiveTopology::LineStrip),
            "triangles" => Ok(PrimitiveTopology::TriangleList),
            "triangle-strip" => Ok(PrimitiveTopology::TriangleStrip),
            "triangle-fan" => Ok(PrimitiveTopology::TriangleFan),
            _ => Err(Error::Configuration(format!("unknown primitive '{}'", s))),
        }
    }
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
        }
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Per-surface GPU context
///
/// Each rendering surface owns one device. The geometry cache creates and
/// destroys buffers through it, and the render coordinator records the
/// attribute/index binding and draw commands on it.
pub trait GraphicsDevice: Send {
    /// Create a buffer
    ///
    /// Fails with `Error::OutOfMemory` when the device cannot satisfy the
    /// allocation; the memory coordinator retries such failures after eviction.
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Release a buffer previously created by this device
    fn destroy_buffer(&mut self, buffer: &Arc<dyn Buffer>);

    /// Disable a fixed vertex attribute slot
    fn disable_vertex_attribute(&mut self, slot: u32) -> Result<()>;

    /// Bind a buffer to a vertex attribute slot
    ///
    /// # Arguments
    ///
    /// * `slot` - Attribute slot (shader input location)
    /// * `buffer` - Vertex buffer holding tightly packed f32 components
    /// * `components` - Number of f32 components per vertex (2 or 3)
    fn bind_vertex_attribute(&mut self, slot: u32, buffer: &Arc<dyn Buffer>, components: u32) -> Result<()>;

    /// Bind the index buffer used by subsequent indexed draws
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>) -> Result<()>;

    /// Issue an indexed draw with the currently bound index buffer
    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: u32, index_type: IndexType) -> Result<()>;

    /// Flush the command stream
    fn flush(&mut self) -> Result<()>;
}

#[cfg(test)]
#[path = "graphics_device_tests.rs"]
mod tests;
