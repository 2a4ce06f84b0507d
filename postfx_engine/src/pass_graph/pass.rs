/// Pass - one full-screen shader invocation writing into its own render target.
///
/// A pass references its shader by key (the registry owns the program) and
/// renders at the host size divided by its divisor, clamped to at least 1x1.

use crate::graphics_device::{GraphicsDevice, TextureHandle, PixelFormat, TextureWrap};
use crate::shader::ShaderKey;
use crate::target::RenderTarget;

/// `(max(width / divisor, 1), max(height / divisor, 1))`
pub fn divided_size(width: u32, height: u32, divisor: u32) -> (u32, u32) {
    let divisor = divisor.max(1);
    ((width / divisor).max(1), (height / divisor).max(1))
}

#[derive(Debug)]
pub struct Pass {
    target: RenderTarget,
    shader: ShaderKey,
    divisor: u32,
    format: PixelFormat,
}

impl Pass {
    /// Full-resolution RGBA pass with mirrored addressing
    pub fn new(shader: ShaderKey) -> Self {
        Self {
            target: RenderTarget::new(TextureWrap::MirroredRepeat),
            shader,
            divisor: 1,
            format: PixelFormat::RGBA,
        }
    }

    /// Resolution divisor (0 is treated as 1)
    pub fn with_divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor.max(1);
        self
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Addressing mode of the target (takes effect on next allocation)
    pub fn with_wrap(mut self, wrap: TextureWrap) -> Self {
        self.target = RenderTarget::new(wrap);
        self
    }

    /// Target size for a host of `width` x `height`
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        divided_size(width, height, self.divisor)
    }

    pub fn shader(&self) -> ShaderKey {
        self.shader
    }

    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut RenderTarget {
        &mut self.target
    }

    /// Texture of the target, `None` while unallocated
    pub fn output(&self) -> Option<TextureHandle> {
        self.target.texture()
    }

    /// Free the target
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        self.target.release(device);
    }
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
