/// Pixel formats and texture descriptors

// ===== PIXEL FORMAT =====

/// Channel layout of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    R,
    RG,
    RGB,
    RGBA,
}

impl ChannelLayout {
    /// Number of channels
    pub fn channel_count(self) -> u32 {
        match self {
            ChannelLayout::R => 1,
            ChannelLayout::RG => 2,
            ChannelLayout::RGB => 3,
            ChannelLayout::RGBA => 4,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ChannelLayout::R => "R",
            ChannelLayout::RG => "RG",
            ChannelLayout::RGB => "RGB",
            ChannelLayout::RGBA => "RGBA",
        }
    }
}

/// Shader-visible component type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Floating point (or normalized fixed point when 8 bits wide)
    Float,
    /// Signed integer (`isampler*`)
    Int,
    /// Unsigned integer (`usampler*`)
    UInt,
}

/// Explicit component bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitWidth {
    B8,
    B16,
    B32,
}

impl BitWidth {
    /// Width in bytes
    pub fn bytes(self) -> u32 {
        match self {
            BitWidth::B8 => 1,
            BitWidth::B16 => 2,
            BitWidth::B32 => 4,
        }
    }
}

/// Pixel format: (layout, component type, optional bit width)
///
/// The storage format is derived from the triple:
///
/// | layout | component | bits   | storage   |
/// |--------|-----------|--------|-----------|
/// | RGBA   | Float     | `None` | `RGBA`    |
/// | RGBA   | Float     | 8      | `RGBA8`   |
/// | RGBA   | Float     | 16/32  | `RGBA16F` / `RGBA32F` |
/// | RG     | UInt      | 8      | `RG8UI`   |
/// | R      | Int       | `None` | `R32I`    |
///
/// Unsized float formats are uploaded as 32-bit floats; unsized integer
/// formats are treated as 32 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub layout: ChannelLayout,
    pub component: ComponentType,
    pub bits: Option<BitWidth>,
}

impl PixelFormat {
    /// Unsized RGBA (the host's own color format)
    pub const RGBA: PixelFormat = PixelFormat::new(ChannelLayout::RGBA, ComponentType::Float, None);
    /// Unsized RGB
    pub const RGB: PixelFormat = PixelFormat::new(ChannelLayout::RGB, ComponentType::Float, None);
    /// Normalized 8-bit RGBA
    pub const RGBA8: PixelFormat = PixelFormat::new(ChannelLayout::RGBA, ComponentType::Float, Some(BitWidth::B8));
    /// Half-float RGBA
    pub const RGBA16F: PixelFormat = PixelFormat::new(ChannelLayout::RGBA, ComponentType::Float, Some(BitWidth::B16));
    /// Float RGBA
    pub const RGBA32F: PixelFormat = PixelFormat::new(ChannelLayout::RGBA, ComponentType::Float, Some(BitWidth::B32));
    /// Single-channel float
    pub const R32F: PixelFormat = PixelFormat::new(ChannelLayout::R, ComponentType::Float, Some(BitWidth::B32));

    /// Build a format from its triple
    pub const fn new(layout: ChannelLayout, component: ComponentType, bits: Option<BitWidth>) -> Self {
        Self { layout, component, bits }
    }

    /// Number of channels
    pub fn channel_count(&self) -> u32 {
        self.layout.channel_count()
    }

    /// Integer formats must be sampled with nearest filtering
    pub fn is_integer(&self) -> bool {
        matches!(self.component, ComponentType::Int | ComponentType::UInt)
    }

    /// Bytes per component as uploaded
    pub fn component_bytes(&self) -> u32 {
        self.bits.map(BitWidth::bytes).unwrap_or(4)
    }

    /// Bytes per pixel as uploaded
    pub fn bytes_per_pixel(&self) -> u32 {
        self.component_bytes() * self.channel_count()
    }

    /// Name of the derived storage format (GL sized/unsized internal format naming)
    pub fn storage_name(&self) -> String {
        let prefix = self.layout.prefix();
        match (self.component, self.bits) {
            (ComponentType::Float, None) => prefix.to_string(),
            (ComponentType::Float, Some(BitWidth::B8)) => format!("{}8", prefix),
            (ComponentType::Float, Some(bits)) => format!("{}{}F", prefix, bits.bytes() * 8),
            (ComponentType::Int, bits) => format!("{}{}I", prefix, bits.map(BitWidth::bytes).unwrap_or(4) * 8),
            (ComponentType::UInt, bits) => format!("{}{}UI", prefix, bits.map(BitWidth::bytes).unwrap_or(4) * 8),
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::RGBA
    }
}

// ===== SAMPLING =====

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D3,
}

impl TextureDimension {
    /// Dimension count (1, 2 or 3)
    pub fn count(self) -> u32 {
        match self {
            TextureDimension::D1 => 1,
            TextureDimension::D2 => 2,
            TextureDimension::D3 => 3,
        }
    }
}

/// Minification/magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    /// Full-screen effect buffers
    #[default]
    MirroredRepeat,
    /// Data / auxiliary buffers
    ClampToEdge,
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels (1 for 1D)
    pub height: u32,
    /// Depth in pixels (1 for 1D/2D)
    pub depth: u32,
    /// Dimensionality
    pub dimension: TextureDimension,
    /// Pixel format
    pub format: PixelFormat,
    /// Sampling filter
    pub filter: TextureFilter,
    /// Addressing mode
    pub wrap: TextureWrap,
}

impl TextureDesc {
    /// 2D color target for a pass: linear filtering unless the format is integer
    pub fn render_target(width: u32, height: u32, format: PixelFormat, wrap: TextureWrap) -> Self {
        Self {
            width,
            height,
            depth: 1,
            dimension: TextureDimension::D2,
            format,
            filter: if format.is_integer() { TextureFilter::Nearest } else { TextureFilter::Linear },
            wrap,
        }
    }

    /// Data texture of the given dimensionality: nearest filtering, clamped addressing
    pub fn data(dimension: TextureDimension, width: u32, height: u32, depth: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            depth,
            dimension,
            format,
            filter: TextureFilter::Nearest,
            wrap: TextureWrap::ClampToEdge,
        }
    }

    /// Number of bytes a full upload must contain
    pub fn byte_size(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.depth as usize
            * self.format.bytes_per_pixel() as usize
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
