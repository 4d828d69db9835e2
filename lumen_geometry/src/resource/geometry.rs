//! Resource-level geometry types.
//!
//! A `GeometryRecord` is one drawable geometry on one rendering surface:
//! a primitive topology plus the GPU buffers holding its vertex attributes
//! and 16-bit indices.
//!
//! # Buffers
//!
//! ```text
//! GeometryRecord "cube"
//! ├── vertex_buffer  (mandatory, 3 x f32 per vertex)
//! ├── normal_buffer  (optional,  3 x f32 per vertex)
//! ├── uv_buffer      (optional,  2 x f32 per vertex)
//! ├── uv2_buffer     (optional,  2 x f32 per vertex)
//! └── index_buffer   (mandatory, u16 per index)
//! ```
//!
//! Buffers are allocated together by `GeometryBuffers::allocate`, which
//! releases everything it already created if a later allocation fails, so a
//! record never exists with a partial buffer set.

use std::sync::{Arc, Mutex};
use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::graphics_device::{BufferUsage, GraphicsDevice, IndexType, PrimitiveTopology};
use crate::memory::MemoryCoordinator;
use crate::resource::GeometryBuffer;
use crate::surface::SurfaceKey;
use crate::utils::lock_or_recover;

bitflags! {
    /// Vertex attributes present in a geometry record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexAttributes: u32 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const UV = 1 << 2;
        const UV2 = 1 << 3;
    }
}

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Source data of a geometry
///
/// Optional attribute arrays are "absent" when empty.
#[derive(Debug, Clone, Default)]
pub struct GeometryDesc {
    /// Primitive name ("points", "lines", "line-loop", "line-strip",
    /// "triangles", "triangle-strip", "triangle-fan")
    pub primitive: Option<String>,
    /// Vertex positions, 3 floats per vertex
    pub positions: Vec<f32>,
    /// Vertex normals, 3 floats per vertex (optional)
    pub normals: Vec<f32>,
    /// First texture coordinate set, 2 floats per vertex (optional)
    pub uv: Vec<f32>,
    /// Second texture coordinate set, 2 floats per vertex (optional)
    pub uv2: Vec<f32>,
    /// 16-bit indices
    pub indices: Vec<u16>,
}

impl GeometryDesc {
    /// Descriptor with positions and indices only
    pub fn new(primitive: &str, positions: Vec<f32>, indices: Vec<u16>) -> Self {
        Self {
            primitive: Some(primitive.to_string()),
            positions,
            indices,
            ..Self::default()
        }
    }

    /// Number of vertices described by `positions`
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Validate the descriptor and resolve its primitive topology
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the primitive is missing or unknown,
    /// if positions or indices are missing, if an attribute array does not
    /// hold exactly one item per vertex, or if an index is out of range.
    pub fn validate(&self) -> Result<PrimitiveTopology> {
        let name = self.primitive.as_deref()
            .ok_or_else(|| Error::Configuration("primitive is required".to_string()))?;
        let primitive = name.parse::<PrimitiveTopology>()?;

        if self.positions.is_empty() {
            return Err(Error::Configuration("positions are required".to_string()));
        }
        if self.positions.len() % 3 != 0 {
            return Err(Error::Configuration(format!(
                "positions length {} is not a multiple of 3", self.positions.len()
            )));
        }

        let vertex_count = self.vertex_count();
        Self::validate_attribute("normals", &self.normals, 3, vertex_count)?;
        Self::validate_attribute("uv", &self.uv, 2, vertex_count)?;
        Self::validate_attribute("uv2", &self.uv2, 2, vertex_count)?;

        if self.indices.is_empty() {
            return Err(Error::Configuration("indices are required".to_string()));
        }
        if let Some(&max) = self.indices.iter().max() {
            if max as usize >= vertex_count {
                return Err(Error::Configuration(format!(
                    "index {} out of range for {} vertices", max, vertex_count
                )));
            }
        }

        Ok(primitive)
    }

    fn validate_attribute(name: &str, data: &[f32], components: usize, vertex_count: usize) -> Result<()> {
        if data.is_empty() || data.len() == components * vertex_count {
            return Ok(());
        }
        Err(Error::Configuration(format!(
            "{} length {} does not match {} vertices x {} components",
            name, data.len(), vertex_count, components
        )))
    }
}

// ============================================================================
// BUFFER SET
// ============================================================================

/// The complete set of GPU buffers of one geometry
pub struct GeometryBuffers {
    vertex: GeometryBuffer,
    normal: Option<GeometryBuffer>,
    uv: Option<GeometryBuffer>,
    uv2: Option<GeometryBuffer>,
    index: GeometryBuffer,
}

/// Buffers allocated so far by one `GeometryBuffers::allocate` call
struct Staging<'a> {
    memory: &'a MemoryCoordinator,
    graphics_device: &'a Arc<Mutex<dyn GraphicsDevice>>,
    allocated: Vec<Arc<dyn crate::graphics_device::Buffer>>,
}

impl Staging<'_> {
    fn buffer(&mut self, label: &str, usage: BufferUsage, components: u32, bytes: &[u8]) -> Result<GeometryBuffer> {
        let item_size = match usage {
            BufferUsage::Vertex => components as usize * std::mem::size_of::<f32>(),
            BufferUsage::Index => IndexType::U16.size_bytes() as usize,
        };
        let item_count = (bytes.len() / item_size) as u32;
        let buffer = GeometryBuffer::allocate(
            self.memory, self.graphics_device, label, usage, components, item_count, bytes,
        )?;
        self.allocated.push(buffer.buffer().clone());
        Ok(buffer)
    }

    fn optional(&mut self, label: &str, components: u32, data: &[f32]) -> Result<Option<GeometryBuffer>> {
        if data.is_empty() {
            return Ok(None);
        }
        self.buffer(label, BufferUsage::Vertex, components, bytemuck::cast_slice(data)).map(Some)
    }

    fn allocate_all(&mut self, desc: &GeometryDesc) -> Result<GeometryBuffers> {
        let vertex = self.buffer("vertex buffer", BufferUsage::Vertex, 3, bytemuck::cast_slice(&desc.positions))?;
        let normal = self.optional("normal buffer", 3, &desc.normals)?;
        let uv = self.optional("uv buffer", 2, &desc.uv)?;
        let uv2 = self.optional("uv2 buffer", 2, &desc.uv2)?;
        let index = self.buffer("index buffer", BufferUsage::Index, 1, bytemuck::cast_slice(&desc.indices))?;

        Ok(GeometryBuffers { vertex, normal, uv, uv2, index })
    }

    fn rollback(self) {
        let mut graphics_device = lock_or_recover(self.graphics_device);
        for buffer in &self.allocated {
            graphics_device.destroy_buffer(buffer);
        }
    }
}

impl GeometryBuffers {
    /// Allocate every buffer of `desc`, in order: vertex, normal, uv, uv2, index
    ///
    /// Each allocation goes through the memory coordinator and may evict
    /// other geometry. If any allocation or upload fails, every buffer
    /// already created by this call is released before the error is returned.
    pub(crate) fn allocate(
        memory: &MemoryCoordinator,
        graphics_device: &Arc<Mutex<dyn GraphicsDevice>>,
        desc: &GeometryDesc,
    ) -> Result<Self> {
        let mut staging = Staging {
            memory,
            graphics_device,
            allocated: Vec::with_capacity(5),
        };

        match staging.allocate_all(desc) {
            Ok(buffers) => Ok(buffers),
            Err(error) => {
                staging.rollback();
                Err(error)
            }
        }
    }

    /// Release every buffer (vertex, normal, index, uv, uv2)
    pub(crate) fn destroy(self, graphics_device: &mut dyn GraphicsDevice) {
        self.vertex.destroy(graphics_device);
        if let Some(normal) = self.normal {
            normal.destroy(graphics_device);
        }
        self.index.destroy(graphics_device);
        if let Some(uv) = self.uv {
            uv.destroy(graphics_device);
        }
        if let Some(uv2) = self.uv2 {
            uv2.destroy(graphics_device);
        }
    }

    fn attributes(&self) -> VertexAttributes {
        let mut attributes = VertexAttributes::POSITION;
        attributes.set(VertexAttributes::NORMAL, self.normal.is_some());
        attributes.set(VertexAttributes::UV, self.uv.is_some());
        attributes.set(VertexAttributes::UV2, self.uv2.is_some());
        attributes
    }
}

// ============================================================================
// GEOMETRY RECORD
// ============================================================================

/// A cached geometry on one rendering surface
pub struct GeometryRecord {
    type_id: String,
    primitive: PrimitiveTopology,
    buffers: GeometryBuffers,
    /// Logical tick of the last draw (or of creation)
    last_used: u64,
    /// Process-wide use order, breaks ties between equal ticks
    use_serial: u64,
    /// Owning surface (non-owning back-reference)
    surface: SurfaceKey,
}

impl GeometryRecord {
    pub(crate) fn new(
        type_id: String,
        primitive: PrimitiveTopology,
        buffers: GeometryBuffers,
        surface: SurfaceKey,
        tick: u64,
        use_serial: u64,
    ) -> Self {
        Self {
            type_id,
            primitive,
            buffers,
            last_used: tick,
            use_serial,
            surface,
        }
    }

    /// Mark the record as used at `tick`
    ///
    /// `last_used` never decreases.
    pub(crate) fn touch(&mut self, tick: u64, use_serial: u64) {
        self.last_used = self.last_used.max(tick);
        self.use_serial = use_serial;
    }

    /// Eviction order key: smaller is older
    pub(crate) fn lru_key(&self) -> (u64, u64) {
        (self.last_used, self.use_serial)
    }

    /// Release the record's buffers on its surface's device
    pub(crate) fn destroy(self, graphics_device: &mut dyn GraphicsDevice) {
        self.buffers.destroy(graphics_device);
    }

    // ===== ACCESSORS =====

    /// Geometry type identifier (unique within its surface)
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Primitive topology
    pub fn primitive(&self) -> PrimitiveTopology {
        self.primitive
    }

    /// Position buffer
    pub fn vertex_buffer(&self) -> &GeometryBuffer {
        &self.buffers.vertex
    }

    /// Normal buffer, if the source had normals
    pub fn normal_buffer(&self) -> Option<&GeometryBuffer> {
        self.buffers.normal.as_ref()
    }

    /// First texture coordinate buffer, if present
    pub fn uv_buffer(&self) -> Option<&GeometryBuffer> {
        self.buffers.uv.as_ref()
    }

    /// Second texture coordinate buffer, if present
    pub fn uv2_buffer(&self) -> Option<&GeometryBuffer> {
        self.buffers.uv2.as_ref()
    }

    /// Index buffer
    pub fn index_buffer(&self) -> &GeometryBuffer {
        &self.buffers.index
    }

    /// Present vertex attributes
    pub fn attributes(&self) -> VertexAttributes {
        self.buffers.attributes()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.buffers.vertex.item_count()
    }

    /// Number of indices
    pub fn index_count(&self) -> u32 {
        self.buffers.index.item_count()
    }

    /// Logical tick of the last use
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    /// Owning surface
    pub fn surface(&self) -> SurfaceKey {
        self.surface
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
