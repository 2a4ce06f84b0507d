/// Blend equations, factors and the full blend state

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

/// Complete blend state: enable flag plus separate RGB/alpha equations and factors
///
/// Defaults to the GL initial state (disabled, Add, One/Zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub enabled: bool,
    pub color_equation: BlendEquation,
    pub alpha_equation: BlendEquation,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendState {
    /// Blending disabled
    pub const DISABLED: BlendState = BlendState {
        enabled: false,
        color_equation: BlendEquation::Add,
        alpha_equation: BlendEquation::Add,
        src_color: BlendFactor::One,
        dst_color: BlendFactor::Zero,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::Zero,
    };

    /// Blending enabled with the same equation/factors on both RGB and alpha
    pub fn uniform(equation: BlendEquation, src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            enabled: true,
            color_equation: equation,
            alpha_equation: equation,
            src_color: src,
            dst_color: dst,
            src_alpha: src,
            dst_alpha: dst,
        }
    }
}

impl Default for BlendState {
    fn default() -> Self {
        BlendState::DISABLED
    }
}
