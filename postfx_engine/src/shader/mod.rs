//! Shader module
//!
//! Named shader programs (registry with location caches and JSON manifest
//! loading), the built-in pass/composite sources, and a line-based GLSL
//! source patcher.

pub mod builtin;
mod shader_registry;
mod shader_patcher;

pub use shader_registry::{Shader, ShaderKey, ShaderRegistry, ShaderSource};
pub use shader_patcher::ShaderPatcher;
