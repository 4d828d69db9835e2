//! GPU buffer handles owned by geometry records.
//!
//! A `GeometryBuffer` wraps one opaque device buffer together with its
//! vertex layout (components per item, item count). Buffers are created
//! through the memory coordinator and are released explicitly; dropping a
//! handle never touches the GPU.

use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, GraphicsDevice};
use crate::memory::MemoryCoordinator;
use crate::utils::lock_or_recover;

/// One GPU buffer of a geometry record
pub struct GeometryBuffer {
    buffer: Arc<dyn Buffer>,
    usage: BufferUsage,
    components: u32,
    item_count: u32,
}

impl GeometryBuffer {
    /// Allocate a buffer and upload `bytes` into it
    ///
    /// Allocation goes through `memory`, so an out-of-memory failure may
    /// evict other geometry before the allocation is retried. If the upload
    /// fails, the freshly created buffer is released before returning.
    pub(crate) fn allocate(
        memory: &MemoryCoordinator,
        graphics_device: &Arc<Mutex<dyn GraphicsDevice>>,
        label: &str,
        usage: BufferUsage,
        components: u32,
        item_count: u32,
        bytes: &[u8],
    ) -> Result<Self> {
        let desc = BufferDesc {
            size: bytes.len() as u64,
            usage,
        };
        let buffer = memory.allocate(label, || {
            lock_or_recover(graphics_device).create_buffer(desc.clone())
        })?;

        if let Err(error) = buffer.update(0, bytes) {
            lock_or_recover(graphics_device).destroy_buffer(&buffer);
            return Err(error);
        }

        Ok(Self {
            buffer,
            usage,
            components,
            item_count,
        })
    }

    /// Release the GPU buffer
    pub(crate) fn destroy(self, graphics_device: &mut dyn GraphicsDevice) {
        graphics_device.destroy_buffer(&self.buffer);
    }

    /// The underlying device buffer
    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    /// Buffer usage
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Components per item (3 for positions/normals, 2 for UVs, 1 for indices)
    pub fn components(&self) -> u32 {
        self.components
    }

    /// Number of items (vertices or indices)
    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.buffer.size()
    }
}

#[cfg(test)]
#[path = "geometry_buffer_tests.rs"]
mod tests;
