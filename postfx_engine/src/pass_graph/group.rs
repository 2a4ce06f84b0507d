/// Group - ordered passes sharing a framebuffer, iteration, blend and viewport policy.
///
/// A group renders its passes in the order given by its iteration policy.
/// Each pass samples the pipeline source, the output from before the group,
/// its allocated siblings, the group's named textures and the outputs of
/// earlier groups (addressed by distance). The terminal pass's target becomes
/// the group output.

use crate::error::Result;
use crate::graphics_device::{
    GraphicsDevice, TextureHandle, FramebufferHandle, Viewport,
    BlendState, BlendEquation, BlendFactor, UniformValue, UniformKind,
};
use super::binding::{InputRef, SlotBinder};
use super::iteration::{Direction, Range, IterationPolicy, IterationPlan};
use super::pass::Pass;
use super::pipeline::{FrameContext, GroupInputs};

// ===== POLICIES =====

/// Which pass size dictates the draw viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewportMode {
    /// The pass's own size
    #[default]
    Current,
    /// The previous array neighbour's size
    Prev,
    /// The next array neighbour's size
    Next,
}

/// Blend mode of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Disabled,
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Blend mode plus source/destination factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBlend {
    pub mode: BlendMode,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl GroupBlend {
    /// Device blend state for this policy
    pub fn state(&self) -> BlendState {
        let equation = match self.mode {
            BlendMode::Disabled => return BlendState::DISABLED,
            BlendMode::Add => BlendEquation::Add,
            BlendMode::Subtract => BlendEquation::Subtract,
            BlendMode::ReverseSubtract => BlendEquation::ReverseSubtract,
            BlendMode::Min => BlendEquation::Min,
            BlendMode::Max => BlendEquation::Max,
        };
        BlendState::uniform(equation, self.src, self.dst)
    }
}

impl Default for GroupBlend {
    fn default() -> Self {
        Self {
            mode: BlendMode::Disabled,
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
        }
    }
}

// ===== GROUP =====

#[derive(Debug, Default)]
pub struct Group {
    passes: Vec<Pass>,
    framebuffer: Option<FramebufferHandle>,
    viewport_mode: ViewportMode,
    iteration: IterationPolicy,
    blend: GroupBlend,
    uniforms: Vec<(String, UniformValue)>,
    textures: Vec<(String, TextureHandle)>,
    output: Option<TextureHandle>,
}

impl Group {
    /// Empty group: forward over all passes, no blending, current-size viewport
    pub fn new() -> Self {
        Self::default()
    }

    // ===== BUILDER =====

    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn with_viewport_mode(mut self, mode: ViewportMode) -> Self {
        self.viewport_mode = mode;
        self
    }

    pub fn with_iteration(mut self, direction: Direction, range: Range) -> Self {
        self.iteration = IterationPolicy::new(direction, range);
        self
    }

    pub fn with_blend(mut self, mode: BlendMode, src: BlendFactor, dst: BlendFactor) -> Self {
        self.blend = GroupBlend { mode, src, dst };
        self
    }

    pub fn with_uniform(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.set_uniform(name, value);
        self
    }

    pub fn with_texture(mut self, name: &str, texture: TextureHandle) -> Self {
        self.set_texture(name, texture);
        self
    }

    // ===== PASSES =====

    /// Append a pass, returning its index
    pub fn push_pass(&mut self, pass: Pass) -> usize {
        self.passes.push(pass);
        self.passes.len() - 1
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    // ===== POLICIES =====

    pub fn viewport_mode(&self) -> ViewportMode {
        self.viewport_mode
    }

    pub fn set_viewport_mode(&mut self, mode: ViewportMode) {
        self.viewport_mode = mode;
    }

    pub fn iteration(&self) -> IterationPolicy {
        self.iteration
    }

    pub fn set_iteration(&mut self, direction: Direction, range: Range) {
        self.iteration = IterationPolicy::new(direction, range);
    }

    pub fn blend(&self) -> GroupBlend {
        self.blend
    }

    pub fn set_blend(&mut self, mode: BlendMode, src: BlendFactor, dst: BlendFactor) {
        self.blend = GroupBlend { mode, src, dst };
    }

    // ===== UNIFORMS AND TEXTURES =====

    /// Set a typed uniform applied to every pass (replaces a value of the same name)
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }

    /// Set a uniform from a kind tag and raw bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if `bytes` does not match the kind's size.
    pub fn set_uniform_raw(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) -> Result<()> {
        let value = UniformValue::from_raw(kind, bytes)?;
        self.set_uniform(name, value);
        Ok(())
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove_uniform(&mut self, name: &str) -> Option<UniformValue> {
        let index = self.uniforms.iter().position(|(n, _)| n == name)?;
        Some(self.uniforms.remove(index).1)
    }

    /// Uniforms in insertion order
    pub fn uniforms(&self) -> &[(String, UniformValue)] {
        &self.uniforms
    }

    /// Expose an external texture to every pass under `name`
    pub fn set_texture(&mut self, name: &str, texture: TextureHandle) {
        match self.textures.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = texture,
            None => self.textures.push((name.to_string(), texture)),
        }
    }

    pub fn remove_texture(&mut self, name: &str) -> Option<TextureHandle> {
        let index = self.textures.iter().position(|(n, _)| n == name)?;
        Some(self.textures.remove(index).1)
    }

    /// Named textures in insertion order
    pub fn textures(&self) -> &[(String, TextureHandle)] {
        &self.textures
    }

    // ===== STATE =====

    /// Output of the last render (aliases a pass target)
    pub fn output(&self) -> Option<TextureHandle> {
        self.output
    }

    pub fn framebuffer(&self) -> Option<FramebufferHandle> {
        self.framebuffer
    }

    /// Free every pass target and the framebuffer
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        for pass in &mut self.passes {
            pass.release(device);
        }
        if let Some(framebuffer) = self.framebuffer.take() {
            device.destroy_framebuffer(framebuffer);
        }
        self.output = None;
    }

    fn holds_gpu_resources(&self) -> bool {
        self.framebuffer.is_some() || self.passes.iter().any(|p| p.output().is_some())
    }

    // ===== EXECUTION =====

    /// Render every visited pass; returns the new running output
    ///
    /// `None` when the group is empty, visits nothing, or its terminal pass
    /// did not draw this frame; the running output is then left unchanged.
    pub(crate) fn render(&mut self, frame: &mut FrameContext<'_>, inputs: &GroupInputs<'_>) -> Result<Option<TextureHandle>> {
        if self.passes.is_empty() {
            return Ok(None);
        }

        let framebuffer = match self.framebuffer {
            Some(framebuffer) => framebuffer,
            None => {
                let framebuffer = frame.device.create_framebuffer()?;
                self.framebuffer = Some(framebuffer);
                framebuffer
            }
        };

        frame.device.set_blend_state(&self.blend.state());

        let plan = IterationPlan::new(self.iteration, self.passes.len());
        let mut previous: Option<usize> = None;
        let mut last_drawn = false;
        for &index in plan.order() {
            let (prev, next) = plan.neighbours(index);
            last_drawn = self.render_pass(frame, inputs, framebuffer, index, prev, next, previous)?;
            if last_drawn {
                frame.stats.passes_drawn += 1;
            } else {
                frame.stats.passes_skipped += 1;
            }
            previous = Some(index);
        }
        frame.stats.groups_rendered += 1;

        let Some(terminal) = plan.terminal() else {
            crate::engine_debug!("postfx::Group",
                "Iteration visits no pass of {}, running output unchanged", self.passes.len());
            self.output = None;
            return Ok(None);
        };

        // The terminal pass is the last one visited
        self.output = if last_drawn { self.passes[terminal].output() } else { None };
        if self.output.is_none() {
            crate::engine_warn!("postfx::Group",
                "Terminal pass {} did not draw, running output unchanged", terminal);
        }
        Ok(self.output)
    }

    /// Render one pass; returns false when the pass was skipped
    #[allow(clippy::too_many_arguments)]
    fn render_pass(
        &mut self,
        frame: &mut FrameContext<'_>,
        inputs: &GroupInputs<'_>,
        framebuffer: FramebufferHandle,
        index: usize,
        prev: usize,
        next: usize,
        previous: Option<usize>,
    ) -> Result<bool> {
        let surface = frame.surface;
        let host = (surface.width, surface.height);

        // Sizes
        let (width, height) = self.passes[index].target_size(host.0, host.1);
        let (vw, vh) = match self.viewport_mode {
            ViewportMode::Current => (width, height),
            ViewportMode::Prev => self.passes[prev].target_size(host.0, host.1),
            ViewportMode::Next => self.passes[next].target_size(host.0, host.1),
        };
        frame.device.set_viewport(Viewport::sized(vw, vh));

        // Shader first, so a pass that cannot draw never allocates
        let Some(shader) = frame.shaders.shader_mut(self.passes[index].shader()) else {
            crate::engine_warn!("postfx::Pass", "Pass {} references an unloaded shader", index);
            return Ok(false);
        };

        // Target
        let pass = &mut self.passes[index];
        let format = pass.format();
        match pass.target_mut().ensure_size(frame.device, width, height, format) {
            Ok(true) => frame.stats.targets_allocated += 1,
            Ok(false) => {}
            Err(e) => {
                crate::engine_error!("postfx::Pass",
                    "Cannot allocate {}x{} target for pass {}: {}", width, height, index, e);
                return Ok(false);
            }
        }
        let Some(target) = pass.output() else {
            return Ok(false);
        };

        // Framebuffer and program
        frame.device.bind_framebuffer(Some(framebuffer));
        frame.device.attach_color_target(target)?;
        frame.device.clear_color(frame.config.clear_color);
        frame.device.use_program(shader.program());

        let max_slots = match frame.config.max_texture_slots {
            Some(slots) => slots,
            None => frame.device.max_texture_slots(),
        };
        let mut binder = SlotBinder::new(frame.config.group_marker, max_slots, index);
        let device: &mut dyn GraphicsDevice = &mut *frame.device;

        // Source and pre-group output
        binder.bind(device, shader, InputRef::Source, surface.color);
        binder.bind(device, shader, InputRef::SourceDepth, surface.depth);
        binder.bind(device, shader, InputRef::PrevGroup, inputs.running_output);

        // Allocated siblings
        for (n, sibling) in self.passes.iter().enumerate() {
            if n == index {
                continue;
            }
            if let Some(texture) = sibling.output() {
                binder.bind(device, shader, InputRef::Pass { index: n }, texture);
                let t = sibling.target();
                binder.set_size(device, shader, InputRef::PassSize { index: n }, t.width(), t.height());
            }
        }

        // Previous pass in iteration order
        let prev_pass = previous.and_then(|p| {
            let t = self.passes[p].target();
            t.texture().map(|texture| (texture, t.width(), t.height()))
        });
        let (prev_texture, prev_w, prev_h) =
            prev_pass.unwrap_or((inputs.running_output, host.0, host.1));
        binder.bind(device, shader, InputRef::PrevPass, prev_texture);
        binder.set_size(device, shader, InputRef::PrevPassSize, prev_w, prev_h);

        // Group textures
        for (name, texture) in &self.textures {
            binder.bind_named(device, shader, name, *texture);
        }

        // Earlier groups, nearest first
        let group_index = inputs.earlier.len();
        for distance in 1..=group_index {
            let earlier_index = group_index - distance;
            let group = &inputs.earlier[earlier_index];
            let output = inputs.earlier_outputs
                .get(earlier_index)
                .copied()
                .unwrap_or(inputs.running_output);
            binder.bind(device, shader, InputRef::GroupOutput { distance }, output);

            for (l, earlier_pass) in group.passes.iter().enumerate() {
                if let Some(texture) = earlier_pass.output() {
                    let t = earlier_pass.target();
                    binder.bind(device, shader, InputRef::GroupPass { distance, index: l }, texture);
                    binder.set_size(device, shader, InputRef::GroupPassSize { distance, index: l }, t.width(), t.height());
                }
            }

            if let Some(ind) = group.passes.len().checked_sub(1).map(|last| index.min(last)) {
                let t = group.passes[ind].target();
                if let Some(texture) = t.texture() {
                    binder.bind(device, shader, InputRef::GroupPassInd { distance }, texture);
                    binder.set_size(device, shader, InputRef::GroupPassIndSize { distance }, t.width(), t.height());
                }
            }
        }
        binder.bind_default(device, shader, InputRef::GroupOutput { distance: group_index + 1 });

        // Uniforms
        binder.set_size(device, shader, InputRef::SourceSize, host.0, host.1);
        for (name, value) in &self.uniforms {
            if let Some(location) = shader.uniform_location(&*device, name) {
                device.set_uniform(location, value);
            }
        }

        crate::engine_trace!("postfx::Pass",
            "Pass {} '{}' {}x{} viewport {}x{} ({} slots)",
            index, shader.name(), width, height, vw, vh, binder.slots_used());

        device.draw_fullscreen_quad()?;
        Ok(true)
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        if self.holds_gpu_resources() {
            crate::engine_warn!("postfx::Group",
                "Group dropped with GPU resources still allocated, call release() first");
        }
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
