/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Records every command it receives, tracks live buffers so tests can
/// check for leaks and double releases, and can simulate a memory budget
/// or inject failures into buffer creation and upload.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, BufferUsage, GraphicsDevice, IndexType, PrimitiveTopology,
};

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub size: u64,
    pub usage: BufferUsage,
    pub data: Mutex<Vec<u8>>,
    fail_update: bool,
}

impl MockBuffer {
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            size,
            usage,
            data: Mutex::new(vec![0u8; size as usize]),
            fail_update: false,
        }
    }

    /// Contents of the buffer as written by `update`
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.fail_update {
            return Err(Error::BackendError("mock upload failure".to_string()));
        }
        let start = offset as usize;
        let end = start + data.len();
        let mut storage = self.data.lock().unwrap();
        if end > storage.len() {
            return Err(Error::BackendError(format!(
                "update range [{}, {}) exceeds buffer size {}", start, end, storage.len()
            )));
        }
        storage[start..end].copy_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    /// Every command received, in order
    pub commands: Vec<String>,
    /// Buffers created and not yet destroyed
    live_buffers: Vec<Arc<dyn Buffer>>,
    /// Typed view of every buffer ever created (for content checks)
    created: Vec<Arc<MockBuffer>>,
    /// Number of destroy calls on a buffer that was not live
    pub invalid_destroys: usize,
    /// Maximum number of live buffers before OutOfMemory
    buffer_budget: Option<usize>,
    /// Number of create_buffer calls so far
    create_calls: usize,
    /// Fail the n-th create_buffer call (1-based) with the given error
    fail_create_at: Option<(usize, Error)>,
    /// Make the n-th created buffer (1-based) reject uploads
    fail_update_at: Option<usize>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            live_buffers: Vec::new(),
            created: Vec::new(),
            invalid_destroys: 0,
            buffer_budget: None,
            create_calls: 0,
            fail_create_at: None,
            fail_update_at: None,
        }
    }

    /// Create a mock device that holds at most `budget` live buffers
    pub fn with_buffer_budget(budget: usize) -> Self {
        let mut device = Self::new();
        device.buffer_budget = Some(budget);
        device
    }

    /// Create a shared device, returning the concrete handle for inspection
    pub fn shared() -> Arc<Mutex<MockGraphicsDevice>> {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn set_buffer_budget(&mut self, budget: Option<usize>) {
        self.buffer_budget = budget;
    }

    /// Fail the `call`-th (1-based, counted from now) create_buffer call
    pub fn fail_create_at(&mut self, call: usize, error: Error) {
        self.fail_create_at = Some((self.create_calls + call, error));
    }

    /// Make the `call`-th (1-based, counted from now) created buffer reject uploads
    pub fn fail_update_at(&mut self, call: usize) {
        self.fail_update_at = Some(self.create_calls + call);
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn created_buffer_count(&self) -> usize {
        self.created.len()
    }

    /// The n-th buffer ever created (0-based)
    pub fn created_buffer(&self, index: usize) -> Option<&Arc<MockBuffer>> {
        self.created.get(index)
    }

    pub fn is_live(&self, buffer: &Arc<dyn Buffer>) -> bool {
        self.live_buffers.iter().any(|b| Arc::ptr_eq(b, buffer))
    }

    /// Number of recorded commands starting with `prefix`
    pub fn count_commands(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.create_calls += 1;

        if let Some((call, error)) = &self.fail_create_at {
            if *call == self.create_calls {
                let error = error.clone();
                self.fail_create_at = None;
                return Err(error);
            }
        }

        if let Some(budget) = self.buffer_budget {
            if self.live_buffers.len() >= budget {
                return Err(Error::OutOfMemory);
            }
        }

        let mut buffer = MockBuffer::new(desc.size, desc.usage);
        if self.fail_update_at == Some(self.create_calls) {
            buffer.fail_update = true;
            self.fail_update_at = None;
        }

        let buffer = Arc::new(buffer);
        self.created.push(buffer.clone());
        let handle: Arc<dyn Buffer> = buffer;
        self.live_buffers.push(handle.clone());
        self.commands.push(format!("create_buffer {:?} {}", desc.usage, desc.size));
        Ok(handle)
    }

    fn destroy_buffer(&mut self, buffer: &Arc<dyn Buffer>) {
        match self.live_buffers.iter().position(|b| Arc::ptr_eq(b, buffer)) {
            Some(index) => {
                self.live_buffers.swap_remove(index);
                self.commands.push("destroy_buffer".to_string());
            }
            None => self.invalid_destroys += 1,
        }
    }

    fn disable_vertex_attribute(&mut self, slot: u32) -> Result<()> {
        self.commands.push(format!("disable_attribute {}", slot));
        Ok(())
    }

    fn bind_vertex_attribute(&mut self, slot: u32, buffer: &Arc<dyn Buffer>, components: u32) -> Result<()> {
        if !self.is_live(buffer) {
            return Err(Error::InvalidResource("bind of a destroyed buffer".to_string()));
        }
        self.commands.push(format!("bind_attribute {} {}", slot, components));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>) -> Result<()> {
        if !self.is_live(buffer) {
            return Err(Error::InvalidResource("bind of a destroyed buffer".to_string()));
        }
        self.commands.push("bind_index_buffer".to_string());
        Ok(())
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: u32, index_type: IndexType) -> Result<()> {
        self.commands.push(format!("draw_indexed {} {} {:?}", topology, index_count, index_type));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.commands.push("flush".to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
