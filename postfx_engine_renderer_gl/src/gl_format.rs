/// Conversions between engine enums and OpenGL enums

use postfx_engine::postfx::device::{
    PixelFormat, ChannelLayout, ComponentType, BitWidth,
    TextureDimension, TextureFilter, TextureWrap,
    BlendEquation, BlendFactor,
};

/// Storage triple for `glTexImage*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlTextureFormat {
    pub internal_format: u32,
    pub format: u32,
    pub pixel_type: u32,
}

// ===== TEXTURES =====

/// Internal format, upload format and component type of a pixel format
///
/// Unsized float formats keep the unsized internal format and upload 32-bit
/// floats; unsized integer formats are 32 bits wide.
pub(crate) fn texture_format_to_gl(format: PixelFormat) -> GlTextureFormat {
    use ChannelLayout::*;

    let (internal_format, pixel_type) = match (format.component, format.bits) {
        (ComponentType::Float, None) => (
            match format.layout { R => glow::RED, RG => glow::RG, RGB => glow::RGB, RGBA => glow::RGBA },
            glow::FLOAT,
        ),
        (ComponentType::Float, Some(BitWidth::B8)) => (
            match format.layout { R => glow::R8, RG => glow::RG8, RGB => glow::RGB8, RGBA => glow::RGBA8 },
            glow::UNSIGNED_BYTE,
        ),
        (ComponentType::Float, Some(BitWidth::B16)) => (
            match format.layout { R => glow::R16F, RG => glow::RG16F, RGB => glow::RGB16F, RGBA => glow::RGBA16F },
            glow::HALF_FLOAT,
        ),
        (ComponentType::Float, Some(BitWidth::B32)) => (
            match format.layout { R => glow::R32F, RG => glow::RG32F, RGB => glow::RGB32F, RGBA => glow::RGBA32F },
            glow::FLOAT,
        ),
        (ComponentType::Int, Some(BitWidth::B8)) => (
            match format.layout { R => glow::R8I, RG => glow::RG8I, RGB => glow::RGB8I, RGBA => glow::RGBA8I },
            glow::BYTE,
        ),
        (ComponentType::Int, Some(BitWidth::B16)) => (
            match format.layout { R => glow::R16I, RG => glow::RG16I, RGB => glow::RGB16I, RGBA => glow::RGBA16I },
            glow::SHORT,
        ),
        (ComponentType::Int, Some(BitWidth::B32) | None) => (
            match format.layout { R => glow::R32I, RG => glow::RG32I, RGB => glow::RGB32I, RGBA => glow::RGBA32I },
            glow::INT,
        ),
        (ComponentType::UInt, Some(BitWidth::B8)) => (
            match format.layout { R => glow::R8UI, RG => glow::RG8UI, RGB => glow::RGB8UI, RGBA => glow::RGBA8UI },
            glow::UNSIGNED_BYTE,
        ),
        (ComponentType::UInt, Some(BitWidth::B16)) => (
            match format.layout { R => glow::R16UI, RG => glow::RG16UI, RGB => glow::RGB16UI, RGBA => glow::RGBA16UI },
            glow::UNSIGNED_SHORT,
        ),
        (ComponentType::UInt, Some(BitWidth::B32) | None) => (
            match format.layout { R => glow::R32UI, RG => glow::RG32UI, RGB => glow::RGB32UI, RGBA => glow::RGBA32UI },
            glow::UNSIGNED_INT,
        ),
    };

    let format = if format.is_integer() {
        match format.layout { R => glow::RED_INTEGER, RG => glow::RG_INTEGER, RGB => glow::RGB_INTEGER, RGBA => glow::RGBA_INTEGER }
    } else {
        match format.layout { R => glow::RED, RG => glow::RG, RGB => glow::RGB, RGBA => glow::RGBA }
    };

    GlTextureFormat { internal_format, format, pixel_type }
}

/// Texture target; 1D data is stored as a `width x 1` 2D texture
pub(crate) fn texture_target(dimension: TextureDimension) -> u32 {
    match dimension {
        TextureDimension::D1 | TextureDimension::D2 => glow::TEXTURE_2D,
        TextureDimension::D3 => glow::TEXTURE_3D,
    }
}

pub(crate) fn filter_to_gl(filter: TextureFilter) -> u32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
    }
}

pub(crate) fn wrap_to_gl(wrap: TextureWrap) -> u32 {
    match wrap {
        TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
    }
}

// ===== BLENDING =====

pub(crate) fn blend_equation_to_gl(equation: BlendEquation) -> u32 {
    match equation {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

/// Reverse of `blend_equation_to_gl` (`None` for values the engine never sets)
pub(crate) fn blend_equation_from_gl(value: u32) -> Option<BlendEquation> {
    match value {
        glow::FUNC_ADD => Some(BlendEquation::Add),
        glow::FUNC_SUBTRACT => Some(BlendEquation::Subtract),
        glow::FUNC_REVERSE_SUBTRACT => Some(BlendEquation::ReverseSubtract),
        glow::MIN => Some(BlendEquation::Min),
        glow::MAX => Some(BlendEquation::Max),
        _ => None,
    }
}

pub(crate) fn blend_factor_to_gl(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::ConstantAlpha => glow::CONSTANT_ALPHA,
        BlendFactor::OneMinusConstantAlpha => glow::ONE_MINUS_CONSTANT_ALPHA,
        BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
    }
}

pub(crate) fn blend_factor_from_gl(value: u32) -> Option<BlendFactor> {
    match value {
        glow::ZERO => Some(BlendFactor::Zero),
        glow::ONE => Some(BlendFactor::One),
        glow::SRC_COLOR => Some(BlendFactor::SrcColor),
        glow::ONE_MINUS_SRC_COLOR => Some(BlendFactor::OneMinusSrcColor),
        glow::DST_COLOR => Some(BlendFactor::DstColor),
        glow::ONE_MINUS_DST_COLOR => Some(BlendFactor::OneMinusDstColor),
        glow::SRC_ALPHA => Some(BlendFactor::SrcAlpha),
        glow::ONE_MINUS_SRC_ALPHA => Some(BlendFactor::OneMinusSrcAlpha),
        glow::DST_ALPHA => Some(BlendFactor::DstAlpha),
        glow::ONE_MINUS_DST_ALPHA => Some(BlendFactor::OneMinusDstAlpha),
        glow::CONSTANT_COLOR => Some(BlendFactor::ConstantColor),
        glow::ONE_MINUS_CONSTANT_COLOR => Some(BlendFactor::OneMinusConstantColor),
        glow::CONSTANT_ALPHA => Some(BlendFactor::ConstantAlpha),
        glow::ONE_MINUS_CONSTANT_ALPHA => Some(BlendFactor::OneMinusConstantAlpha),
        glow::SRC_ALPHA_SATURATE => Some(BlendFactor::SrcAlphaSaturate),
        _ => None,
    }
}

// ===== ERRORS =====

/// Symbolic name of a `glGetError` code
pub(crate) fn gl_error_name(code: u32) -> &'static str {
    match code {
        glow::NO_ERROR => "GL_NO_ERROR",
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

// ===== FRAMEBUFFERS =====

/// Bind point for pass framebuffers; the caller's read framebuffer is never touched
pub(crate) const FRAMEBUFFER_TARGET: u32 = glow::DRAW_FRAMEBUFFER;

/// Binding query matching a framebuffer bind point
pub(crate) fn framebuffer_binding_query(target: u32) -> u32 {
    match target {
        glow::READ_FRAMEBUFFER => glow::READ_FRAMEBUFFER_BINDING,
        // FRAMEBUFFER aliases the draw binding for queries
        _ => glow::DRAW_FRAMEBUFFER_BINDING,
    }
}

/// Symbolic name of a `glCheckFramebufferStatus` result
pub(crate) fn framebuffer_status_name(status: u32) -> &'static str {
    match status {
        glow::FRAMEBUFFER_COMPLETE => "complete",
        glow::FRAMEBUFFER_UNDEFINED => "undefined",
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment",
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "missing attachment",
        glow::FRAMEBUFFER_UNSUPPORTED => "unsupported",
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "incomplete multisample",
        _ => "unknown status",
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
