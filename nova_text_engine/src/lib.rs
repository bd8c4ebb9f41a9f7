/*!
# NovaText Engine

Core types for the NovaText GPU text rendering engine.

This crate is backend-agnostic: it owns error handling, logging, renderer
configuration, CPU-side font atlas packing, glyph line layout, and the
bump-allocation bookkeeping used by the streaming vertex arena. Backend
crates (Vulkan) build on these types to own the actual GPU resources.

## Architecture

- **FontAtlas**: packed single-channel glyph atlas plus per-glyph metrics
- **TriInstance**: 32-byte per-triangle instance payload for the text pipeline
- **BumpLayout**: offset bookkeeping for a persistently mapped frame arena
- **RendererConfig**: backend configuration (validation, arena sizing)
- **Engine**: global logging registry behind the `engine_*!` macros
*/

// Internal modules
mod config;
mod engine;
mod error;
pub mod log;
pub mod text;
pub mod utils;

// Main novatext namespace module
pub mod novatext {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine logging registry
    pub use crate::engine::Engine;

    // Renderer configuration
    pub use crate::config::{DebugSeverity, RendererConfig};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Text sub-module: atlas packing and line layout
    pub mod text {
        pub use crate::text::*;
    }

    // Utility sub-module
    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
