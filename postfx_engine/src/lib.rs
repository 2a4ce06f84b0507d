/*!
# PostFX Engine

Core types for the PostFX post-processing engine.

This crate runs ordered sequences of full-screen shader passes, organized into
groups, on top of a host render target's color/depth images, and composites
the final image back onto the host's presentation target. It never talks to a
graphics API directly: backends (OpenGL, ...) implement the `GraphicsDevice`
trait and are handed to the `Engine` at startup.

## Architecture

- **Engine**: explicit context owning the device, shader registry and host side table
- **GraphicsDevice**: backend trait (textures, framebuffers, programs, state)
- **RenderTarget / DataTexture**: lazily (re)allocated GPU images
- **Pass / Group / Pipeline**: the pass graph and its per-frame executor
- **ShaderRegistry / ShaderPatcher**: named shader programs and GLSL source editing
- **TargetManager**: per-host attachment records and init callbacks
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod shader;
pub mod target;
pub mod pass_graph;

// Main postfx namespace module
pub mod postfx {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine context and configuration
    pub use crate::engine::{Engine, Config};

    // Graphics device trait
    pub use crate::graphics_device::GraphicsDevice;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module with all backend-facing types
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Target sub-module (render targets, data textures, host side table)
    pub mod target {
        pub use crate::target::*;
    }

    // Pass graph sub-module
    pub mod pass_graph {
        pub use crate::pass_graph::*;
    }
}

// Re-export math library at crate root
pub use glam;
