/// Typed pass inputs and texture slot allocation
///
/// Shaders see pass inputs through a fixed naming convention:
///
/// | input                      | uniform name                 |
/// |----------------------------|------------------------------|
/// | `Source`                   | `source`                     |
/// | `SourceDepth`              | `sourceDepth`                |
/// | `PrevGroup`                | `prevPassGroup`              |
/// | `SourceSize`               | `sourceSize`                 |
/// | `Pass { index: N }`        | `passN` / `passN_size`       |
/// | `PrevPass`                 | `prevPass` / `prevPass_size` |
/// | `GroupOutput { distance }` | `pp_group` (marker x distance) |
/// | `GroupPass { distance, index: L }` | `pp_passL` / `pp_passL_size` |
/// | `GroupPassInd { distance }`| `pp_passInd` / `pp_passInd_size` |
///
/// The engine itself only deals in `InputRef` values; names are built once
/// per shader on a location-cache miss.

use crate::graphics_device::{GraphicsDevice, TextureHandle, UniformValue};
use crate::shader::Shader;

/// Typed reference to a shader-facing pass input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRef {
    Source,
    SourceDepth,
    PrevGroup,
    SourceSize,
    Pass { index: usize },
    PassSize { index: usize },
    PrevPass,
    PrevPassSize,
    GroupOutput { distance: usize },
    GroupPass { distance: usize, index: usize },
    GroupPassSize { distance: usize, index: usize },
    GroupPassInd { distance: usize },
    GroupPassIndSize { distance: usize },
}

impl InputRef {
    /// Shader-facing uniform name; `marker` repeated `distance` times prefixes group references
    pub fn uniform_name(&self, marker: char) -> String {
        let prefix = |distance: usize| -> String { std::iter::repeat(marker).take(distance).collect() };
        match *self {
            InputRef::Source => "source".to_string(),
            InputRef::SourceDepth => "sourceDepth".to_string(),
            InputRef::PrevGroup => "prevPassGroup".to_string(),
            InputRef::SourceSize => "sourceSize".to_string(),
            InputRef::Pass { index } => format!("pass{}", index),
            InputRef::PassSize { index } => format!("pass{}_size", index),
            InputRef::PrevPass => "prevPass".to_string(),
            InputRef::PrevPassSize => "prevPass_size".to_string(),
            InputRef::GroupOutput { distance } => format!("{}_group", prefix(distance)),
            InputRef::GroupPass { distance, index } => format!("{}_pass{}", prefix(distance), index),
            InputRef::GroupPassSize { distance, index } => format!("{}_pass{}_size", prefix(distance), index),
            InputRef::GroupPassInd { distance } => format!("{}_passInd", prefix(distance)),
            InputRef::GroupPassIndSize { distance } => format!("{}_passInd_size", prefix(distance)),
        }
    }

    /// Whether the input is a sampled texture (consumes a slot) rather than a size vector
    pub fn is_texture(&self) -> bool {
        !matches!(
            self,
            InputRef::SourceSize
                | InputRef::PassSize { .. }
                | InputRef::PrevPassSize
                | InputRef::GroupPassSize { .. }
                | InputRef::GroupPassIndSize { .. }
        )
    }
}

/// Hands out texture slots in call order for one pass draw
///
/// Every texture input consumes a slot whether or not the shader declares it,
/// so slot numbers only depend on the pass graph. Slots past the device limit
/// are not bound and produce a single warning per pass.
pub(crate) struct SlotBinder {
    marker: char,
    max_slots: u32,
    next_slot: u32,
    warned: bool,
    pass_index: usize,
}

impl SlotBinder {
    pub(crate) fn new(marker: char, max_slots: u32, pass_index: usize) -> Self {
        Self { marker, max_slots, next_slot: 0, warned: false, pass_index }
    }

    /// Bind a texture input to the next slot
    pub(crate) fn bind(
        &mut self,
        device: &mut dyn GraphicsDevice,
        shader: &mut Shader,
        input: InputRef,
        texture: TextureHandle,
    ) {
        let Some(slot) = self.claim(device, texture) else {
            return;
        };
        if let Some(location) = shader.input_location(&*device, input, self.marker) {
            device.set_uniform(location, &UniformValue::Int(slot as i32));
        }
    }

    /// Bind a named (group-level) texture to the next slot
    pub(crate) fn bind_named(
        &mut self,
        device: &mut dyn GraphicsDevice,
        shader: &mut Shader,
        name: &str,
        texture: TextureHandle,
    ) {
        let Some(slot) = self.claim(device, texture) else {
            return;
        };
        if let Some(location) = shader.uniform_location(&*device, name) {
            device.set_uniform(location, &UniformValue::Int(slot as i32));
        }
    }

    /// Point a texture input at slot 0 without consuming a slot
    pub(crate) fn bind_default(&mut self, device: &mut dyn GraphicsDevice, shader: &mut Shader, input: InputRef) {
        if let Some(location) = shader.input_location(&*device, input, self.marker) {
            device.set_uniform(location, &UniformValue::Int(0));
        }
    }

    /// Set a `(w, h, 1/w, 1/h)` size uniform
    pub(crate) fn set_size(
        &mut self,
        device: &mut dyn GraphicsDevice,
        shader: &mut Shader,
        input: InputRef,
        width: u32,
        height: u32,
    ) {
        if let Some(location) = shader.input_location(&*device, input, self.marker) {
            device.set_uniform(location, &UniformValue::size_vector(width, height));
        }
    }

    /// Number of slots consumed so far (including unbound ones past the limit)
    pub(crate) fn slots_used(&self) -> u32 {
        self.next_slot
    }

    fn claim(&mut self, device: &mut dyn GraphicsDevice, texture: TextureHandle) -> Option<u32> {
        let slot = self.next_slot;
        self.next_slot += 1;

        if slot >= self.max_slots {
            if !self.warned {
                self.warned = true;
                crate::engine_warn!("postfx::Pass",
                    "Pass {} ran out of texture slots ({} available), extra inputs are not bound",
                    self.pass_index, self.max_slots);
            }
            return None;
        }

        device.bind_texture(slot, Some(texture));
        Some(slot)
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
