/*!
# PostFX Engine - OpenGL Backend

OpenGL implementation of the PostFX `GraphicsDevice` trait.

This crate drives the pass graph through the `glow` bindings on a context the
host already owns and keeps current. Engine handles are plain GL object names,
so the host's color and depth textures are passed to the engine as-is.

Texture allocations always check `glGetError()`. Build with the
`gl-error-checks` feature to also poll it after every upload and draw.
*/

mod gl_debug;
mod gl_format;
mod gl_graphics_device;

pub use gl_graphics_device::GlGraphicsDevice;

// Re-export error statistics
pub use gl_debug::{GlErrorStats, get_gl_error_stats, reset_gl_error_stats, print_gl_error_report};

/// Create an engine backed by an OpenGL device
///
/// # Example
///
/// ```no_run
/// use postfx_engine::postfx::Config;
/// use std::sync::Arc;
///
/// # fn context() -> glow::Context { unimplemented!() }
/// let gl = Arc::new(context());
/// let engine = postfx_engine_renderer_gl::create_engine(gl, Config::default())?;
/// # Ok::<(), postfx_engine::postfx::Error>(())
/// ```
pub fn create_engine(
    gl: std::sync::Arc<glow::Context>,
    config: postfx_engine::postfx::Config,
) -> postfx_engine::postfx::Result<postfx_engine::postfx::Engine> {
    let device = GlGraphicsDevice::new(gl)?;
    postfx_engine::postfx::Engine::new(Box::new(device), config)
}
