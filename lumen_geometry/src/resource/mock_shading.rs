/// Mock shading subsystem for tests
///
/// Records every notification and binds the exported record's attributes
/// to fixed slots: position 0, normal 1, uv 2, uv2 3.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::resource::{GeometryRecord, ShaderActivation, ShadingSubsystem};

pub struct MockShading {
    /// Every notification received, in order
    pub events: Vec<String>,
    /// Scripted answers to activate_shader (Unchanged once exhausted)
    activations: VecDeque<ShaderActivation>,
    /// Type identifier whose export fails after binding its positions
    failing_export: Option<String>,
}

impl MockShading {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            activations: VecDeque::new(),
            failing_export: None,
        }
    }

    pub fn shared() -> Arc<Mutex<MockShading>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Queue the answer of a future activate_shader call
    pub fn push_activation(&mut self, activation: ShaderActivation) {
        self.activations.push_back(activation);
    }

    pub fn fail_export_of(&mut self, type_id: &str) {
        self.failing_export = Some(type_id.to_string());
    }

    /// Type identifiers of every exported record, in order
    pub fn exports(&self) -> Vec<String> {
        self.events.iter()
            .filter_map(|e| e.strip_prefix("exported ").map(str::to_string))
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }
}

impl Default for MockShading {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadingSubsystem for MockShading {
    fn geometry_updated(&mut self, record: &GeometryRecord) {
        self.events.push(format!("updated {}", record.type_id()));
    }

    fn activate_shader(&mut self) -> ShaderActivation {
        self.events.push("activate".to_string());
        self.activations.pop_front().unwrap_or(ShaderActivation::Unchanged)
    }

    fn geometry_exported(&mut self, record: &GeometryRecord, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.events.push(format!("exported {}", record.type_id()));
        let vertex = record.vertex_buffer();
        device.bind_vertex_attribute(0, vertex.buffer(), vertex.components())?;
        if self.failing_export.as_deref() == Some(record.type_id()) {
            return Err(Error::BackendError(format!("cannot export '{}'", record.type_id())));
        }
        if let Some(normal) = record.normal_buffer() {
            device.bind_vertex_attribute(1, normal.buffer(), normal.components())?;
        }
        if let Some(uv) = record.uv_buffer() {
            device.bind_vertex_attribute(2, uv.buffer(), uv.components())?;
        }
        if let Some(uv2) = record.uv2_buffer() {
            device.bind_vertex_attribute(3, uv2.buffer(), uv2.components())?;
        }
        Ok(())
    }
}
