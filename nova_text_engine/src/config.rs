//! Renderer configuration

/// Severity filter applied to validation/debug messenger output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only validation errors
    ErrorsOnly,
    /// Validation errors and warnings
    ErrorsAndWarnings,
    /// Everything, including verbose/info messages
    All,
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Application name (surfaced to the GPU driver)
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Minimum severity forwarded from the debug messenger
    pub debug_severity: DebugSeverity,
    /// Initial capacity of the per-frame streaming arena, in bytes
    pub arena_capacity: u64,
    /// Prefer host-coherent memory for the streaming arena when available
    pub prefer_coherent: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "NovaText Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            arena_capacity: 1 << 20,
            prefer_coherent: true,
        }
    }
}
