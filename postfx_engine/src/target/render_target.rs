/// Render target - a lazily (re)allocated GPU image owned by a pass.
///
/// The texture handle is valid iff the target has been sized at least once
/// and not released since. Changing size or format replaces the handle
/// entirely; old content is discarded.

use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, TextureHandle, TextureDesc, PixelFormat, TextureWrap};

/// A pass's color target
#[derive(Debug)]
pub struct RenderTarget {
    texture: Option<TextureHandle>,
    width: u32,
    height: u32,
    format: PixelFormat,
    wrap: TextureWrap,
}

impl RenderTarget {
    /// Create an unallocated target with the given addressing mode
    pub fn new(wrap: TextureWrap) -> Self {
        Self {
            texture: None,
            width: 0,
            height: 0,
            format: PixelFormat::RGBA,
            wrap,
        }
    }

    /// Make sure the target is allocated at exactly (width, height, format)
    ///
    /// Zero dimensions are clamped to 1. Returns `Ok(true)` when a new texture
    /// was allocated, `Ok(false)` when the existing one already matched.
    ///
    /// # Errors
    ///
    /// Propagates the device's allocation error. The target is left
    /// unallocated in that case.
    pub fn ensure_size(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<bool> {
        let width = width.max(1);
        let height = height.max(1);

        if self.texture.is_some() && self.width == width && self.height == height && self.format == format {
            return Ok(false);
        }

        self.release(device);

        let desc = TextureDesc::render_target(width, height, format, self.wrap);
        let texture = device.create_texture(&desc)?;

        self.texture = Some(texture);
        self.width = width;
        self.height = height;
        self.format = format;
        Ok(true)
    }

    /// Free the texture (no-op when unallocated)
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(texture) = self.texture.take() {
            device.destroy_texture(texture);
        }
        self.width = 0;
        self.height = 0;
    }

    /// Texture handle, `None` while unallocated
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Whether a texture is currently allocated
    pub fn is_allocated(&self) -> bool {
        self.texture.is_some()
    }

    /// Allocated width (0 while unallocated)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Allocated height (0 while unallocated)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Format of the last allocation
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Addressing mode used for allocations
    pub fn wrap(&self) -> TextureWrap {
        self.wrap
    }
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self::new(TextureWrap::MirroredRepeat)
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
