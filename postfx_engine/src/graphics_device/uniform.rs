/// Typed uniform values
///
/// Group-level uniforms are carried as a kind tag plus a value whose raw byte
/// view matches the kind's size, so they can be stored, compared and rebuilt
/// from untyped buffers.

use glam::{Vec2, Vec3, Vec4, IVec2, IVec3, IVec4, UVec2, UVec3, UVec4};
use crate::error::{Error, Result};

/// Uniform kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
}

impl UniformKind {
    /// Number of scalar components
    pub fn components(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int | UniformKind::UInt => 1,
            UniformKind::Vec2 | UniformKind::IVec2 | UniformKind::UVec2 => 2,
            UniformKind::Vec3 | UniformKind::IVec3 | UniformKind::UVec3 => 3,
            UniformKind::Vec4 | UniformKind::IVec4 | UniformKind::UVec4 => 4,
        }
    }

    /// Size of the raw value in bytes
    pub fn byte_size(self) -> usize {
        self.components() * 4
    }

    /// GLSL type name
    pub fn glsl_name(self) -> &'static str {
        match self {
            UniformKind::Float => "float",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Int => "int",
            UniformKind::IVec2 => "ivec2",
            UniformKind::IVec3 => "ivec3",
            UniformKind::IVec4 => "ivec4",
            UniformKind::UInt => "uint",
            UniformKind::UVec2 => "uvec2",
            UniformKind::UVec3 => "uvec3",
            UniformKind::UVec4 => "uvec4",
        }
    }
}

/// Typed uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    UInt(u32),
    UVec2(UVec2),
    UVec3(UVec3),
    UVec4(UVec4),
}

impl UniformValue {
    /// Kind tag of this value
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::IVec2(_) => UniformKind::IVec2,
            UniformValue::IVec3(_) => UniformKind::IVec3,
            UniformValue::IVec4(_) => UniformKind::IVec4,
            UniformValue::UInt(_) => UniformKind::UInt,
            UniformValue::UVec2(_) => UniformKind::UVec2,
            UniformValue::UVec3(_) => UniformKind::UVec3,
            UniformValue::UVec4(_) => UniformKind::UVec4,
        }
    }

    /// Raw byte view, `kind().byte_size()` bytes long
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            UniformValue::Int(v) => bytemuck::bytes_of(v),
            UniformValue::IVec2(v) => bytemuck::bytes_of(v),
            UniformValue::IVec3(v) => bytemuck::bytes_of(v),
            UniformValue::IVec4(v) => bytemuck::bytes_of(v),
            UniformValue::UInt(v) => bytemuck::bytes_of(v),
            UniformValue::UVec2(v) => bytemuck::bytes_of(v),
            UniformValue::UVec3(v) => bytemuck::bytes_of(v),
            UniformValue::UVec4(v) => bytemuck::bytes_of(v),
        }
    }

    /// Rebuild a value from a kind tag and its raw bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if `bytes` is not exactly `kind.byte_size()` long.
    pub fn from_raw(kind: UniformKind, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != kind.byte_size() {
            return Err(Error::InvalidResource(format!(
                "Uniform of kind {} needs {} bytes, got {}",
                kind.glsl_name(), kind.byte_size(), bytes.len()
            )));
        }

        let value = match kind {
            UniformKind::Float => UniformValue::Float(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::Vec2 => UniformValue::Vec2(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::Vec3 => UniformValue::Vec3(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::Vec4 => UniformValue::Vec4(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::Int => UniformValue::Int(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::IVec2 => UniformValue::IVec2(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::IVec3 => UniformValue::IVec3(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::IVec4 => UniformValue::IVec4(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::UInt => UniformValue::UInt(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::UVec2 => UniformValue::UVec2(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::UVec3 => UniformValue::UVec3(bytemuck::pod_read_unaligned(bytes)),
            UniformKind::UVec4 => UniformValue::UVec4(bytemuck::pod_read_unaligned(bytes)),
        };
        Ok(value)
    }

    /// `(w, h, 1/w, 1/h)` size vector as used by `sourceSize` and `*_size` uniforms
    pub fn size_vector(width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        UniformValue::Vec4(Vec4::new(w, h, 1.0 / w, 1.0 / h))
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self { UniformValue::Float(v) }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self { UniformValue::Vec2(v) }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self { UniformValue::Vec3(v) }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self { UniformValue::Vec4(v) }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self { UniformValue::Int(v) }
}

impl From<IVec2> for UniformValue {
    fn from(v: IVec2) -> Self { UniformValue::IVec2(v) }
}

impl From<IVec3> for UniformValue {
    fn from(v: IVec3) -> Self { UniformValue::IVec3(v) }
}

impl From<IVec4> for UniformValue {
    fn from(v: IVec4) -> Self { UniformValue::IVec4(v) }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self { UniformValue::UInt(v) }
}

impl From<UVec2> for UniformValue {
    fn from(v: UVec2) -> Self { UniformValue::UVec2(v) }
}

impl From<UVec3> for UniformValue {
    fn from(v: UVec3) -> Self { UniformValue::UVec3(v) }
}

impl From<UVec4> for UniformValue {
    fn from(v: UVec4) -> Self { UniformValue::UVec4(v) }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
