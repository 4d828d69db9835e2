/// Geometry manager configuration

/// Configuration of a `GeometryManager`
///
/// # Example
///
/// ```
/// use lumen_geometry::lumen::resource::GeometryConfig;
///
/// let config = GeometryConfig {
///     vertex_attribute_slots: 16,
///     ..GeometryConfig::default()
/// };
/// assert_eq!(config.generated_type_prefix, "geometry_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryConfig {
    /// Number of fixed vertex attribute slots disabled before each export
    pub vertex_attribute_slots: u32,
    /// Prefix of generated geometry type identifiers
    pub generated_type_prefix: String,
    /// Flush the command stream after every draw
    pub flush_after_draw: bool,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            vertex_attribute_slots: 8,
            generated_type_prefix: "geometry_".to_string(),
            flush_after_draw: true,
        }
    }
}
