/// Data textures - typed 1D/2D/3D textures carrying auxiliary data to passes.
///
/// Bind one to a group with `Group::set_texture` to expose it to shaders.
/// Filtering is nearest and addressing is clamped so texel fetches return the
/// uploaded values unchanged.

use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, TextureHandle, TextureDesc, TextureDimension, PixelFormat};

/// Texel extent of a data texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataExtent {
    D1(u32),
    D2(u32, u32),
    D3(u32, u32, u32),
}

impl DataExtent {
    pub fn dimension(self) -> TextureDimension {
        match self {
            DataExtent::D1(_) => TextureDimension::D1,
            DataExtent::D2(..) => TextureDimension::D2,
            DataExtent::D3(..) => TextureDimension::D3,
        }
    }

    /// (x, y, z) with unused axes set to 1
    pub fn size(self) -> (u32, u32, u32) {
        match self {
            DataExtent::D1(x) => (x, 1, 1),
            DataExtent::D2(x, y) => (x, y, 1),
            DataExtent::D3(x, y, z) => (x, y, z),
        }
    }

    fn exceeds(self, other: DataExtent) -> bool {
        let (x, y, z) = self.size();
        let (ox, oy, oz) = other.size();
        x > ox || y > oy || z > oz
    }
}

/// Typed data texture
#[derive(Debug)]
pub struct DataTexture {
    texture: Option<TextureHandle>,
    extent: DataExtent,
    format: PixelFormat,
}

impl DataTexture {
    /// Create an unallocated data texture of the given dimensionality
    pub fn new(dimension: TextureDimension, format: PixelFormat) -> Self {
        let extent = match dimension {
            TextureDimension::D1 => DataExtent::D1(0),
            TextureDimension::D2 => DataExtent::D2(0, 0),
            TextureDimension::D3 => DataExtent::D3(0, 0, 0),
        };
        Self { texture: None, extent, format }
    }

    /// (Re)allocate at `extent` with `format`, optionally uploading `data`
    pub fn init(
        &mut self,
        device: &mut dyn GraphicsDevice,
        extent: DataExtent,
        format: PixelFormat,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.release(device);

        let (x, y, z) = extent.size();
        let desc = TextureDesc::data(extent.dimension(), x.max(1), y.max(1), z.max(1), format);
        let texture = device.create_texture(&desc)?;

        self.texture = Some(texture);
        self.extent = extent;
        self.format = format;

        match data {
            Some(bytes) if !bytes.is_empty() => device.upload_texture(texture, &desc, bytes),
            _ => Ok(()),
        }
    }

    /// Upload `data` covering `extent` at the origin, growing the texture if needed
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` when `extent` does not have this texture's
    /// dimensionality or `data` is not exactly the extent's byte size.
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice, extent: DataExtent, data: &[u8]) -> Result<()> {
        if extent.dimension() != self.extent.dimension() {
            let message = format!(
                "Tried uploading {}D data into a {}D texture",
                extent.dimension().count(), self.extent.dimension().count()
            );
            crate::engine_error!("postfx::DataTexture", "{}", message);
            return Err(Error::InvalidResource(message));
        }

        if data.is_empty() {
            return Ok(());
        }

        let (x, y, z) = extent.size();
        let desc = TextureDesc::data(extent.dimension(), x.max(1), y.max(1), z.max(1), self.format);
        if data.len() != desc.byte_size() {
            return Err(Error::InvalidResource(format!(
                "Data texture upload of {} bytes, expected {}", data.len(), desc.byte_size()
            )));
        }

        self.fit(device, extent)?;

        match self.texture {
            Some(texture) => device.upload_texture(texture, &desc, data),
            None => Err(Error::InvalidResource("Data texture is not allocated".to_string())),
        }
    }

    /// Reallocate when `extent` exceeds the current size on any axis
    ///
    /// Returns `Ok(true)` when the texture was reallocated.
    pub fn fit(&mut self, device: &mut dyn GraphicsDevice, extent: DataExtent) -> Result<bool> {
        if self.texture.is_some() && !extent.exceeds(self.extent) {
            return Ok(false);
        }
        self.init(device, extent, self.format, None)?;
        Ok(true)
    }

    /// Reallocate when `extent` differs from the current size
    ///
    /// Returns `Ok(true)` when the texture was reallocated.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, extent: DataExtent) -> Result<bool> {
        if self.texture.is_some() && extent == self.extent {
            return Ok(false);
        }
        self.init(device, extent, self.format, None)?;
        Ok(true)
    }

    /// Free the texture (no-op when unallocated)
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(texture) = self.texture.take() {
            device.destroy_texture(texture);
        }
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn extent(&self) -> DataExtent {
        self.extent
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

#[cfg(test)]
#[path = "data_texture_tests.rs"]
mod tests;
