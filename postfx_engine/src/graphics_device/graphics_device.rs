/// GraphicsDevice trait - backend interface used by the pass graph
///
/// Everything the engine does on the GPU goes through this trait: texture and
/// framebuffer lifetime, program activation, uniform/sampler binding, the
/// global blend/alpha-test state that the pipeline saves and restores, and the
/// full-screen quad draw.
///
/// Devices are driven from the single rendering thread, so the trait is not
/// `Send + Sync`.

use crate::error::Result;
use crate::graphics_device::{TextureDesc, BlendState, UniformValue};

// ============================================================================
// Handles
// ============================================================================

/// Opaque texture handle (backend object name)
///
/// `TextureHandle::NONE` (name 0) is the harmless default texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The default texture (name 0)
    pub const NONE: TextureHandle = TextureHandle(0);

    /// Returns true for the default texture
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Opaque framebuffer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub u32);

/// Opaque shader program handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Resolved uniform location inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

// ============================================================================
// Descriptors
// ============================================================================

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport covering `width` x `height` from the origin
    pub fn sized(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Shader program sources
#[derive(Debug, Clone, Copy)]
pub struct ShaderDesc<'a> {
    /// Name used in diagnostics
    pub debug_name: &'a str,
    /// Vertex stage GLSL source
    pub vertex_source: &'a str,
    /// Fragment stage GLSL source
    pub fragment_source: &'a str,
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Backend device trait
pub trait GraphicsDevice {
    // ===== TEXTURES =====

    /// Allocate an uninitialized texture described by `desc`
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;

    /// Upload `data` into the region at the origin sized by `desc`
    fn upload_texture(&mut self, texture: TextureHandle, desc: &TextureDesc, data: &[u8]) -> Result<()>;

    /// Free a texture (unknown handles are ignored)
    fn destroy_texture(&mut self, texture: TextureHandle);

    // ===== FRAMEBUFFERS =====

    /// Create an empty framebuffer object
    fn create_framebuffer(&mut self) -> Result<FramebufferHandle>;

    /// Free a framebuffer object
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Currently bound draw framebuffer (`None` = default framebuffer)
    fn bound_framebuffer(&self) -> Option<FramebufferHandle>;

    /// Bind a draw framebuffer (`None` = default framebuffer)
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);

    /// Attach `texture` as the sole color attachment of the bound framebuffer
    fn attach_color_target(&mut self, texture: TextureHandle) -> Result<()>;

    /// Clear the color buffer of the bound framebuffer
    fn clear_color(&mut self, color: [f32; 4]);

    /// Set the draw viewport
    fn set_viewport(&mut self, viewport: Viewport);

    // ===== GLOBAL STATE =====

    /// Read back the current blend state
    fn blend_state(&self) -> BlendState;

    /// Apply a blend state (enable flag, equations and factors)
    fn set_blend_state(&mut self, state: &BlendState);

    /// Whether fixed-function alpha testing is enabled
    fn alpha_test_enabled(&self) -> bool;

    /// Enable or disable fixed-function alpha testing
    fn set_alpha_test_enabled(&mut self, enabled: bool);

    // ===== PROGRAMS =====

    /// Compile and link a program
    fn create_program(&mut self, desc: &ShaderDesc<'_>) -> Result<ProgramHandle>;

    /// Free a program
    fn destroy_program(&mut self, program: ProgramHandle);

    /// Activate a program for subsequent uniform updates and draws
    fn use_program(&mut self, program: ProgramHandle);

    /// Look up a uniform; `None` when the program does not declare it
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Set a uniform of the active program
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    /// Bind `texture` to texture unit `slot` (`None` unbinds)
    fn bind_texture(&mut self, slot: u32, texture: Option<TextureHandle>);

    // ===== DRAWING =====

    /// Draw two triangles covering the viewport with the active program
    fn draw_fullscreen_quad(&mut self) -> Result<()>;

    /// Number of texture units usable by a single draw
    fn max_texture_slots(&self) -> u32 {
        32
    }
}
