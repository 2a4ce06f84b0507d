/// Pipeline - ordered groups attached to one host target, plus the final composite.
///
/// The pipeline threads a single running output through its groups: it starts
/// as the host color image and is replaced by each group that produced an
/// image. Global device state touched by the groups (blend, alpha test, bound
/// framebuffer) is saved before the first group and restored afterwards.

use crate::engine::Config;
use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{GraphicsDevice, TextureHandle, Viewport, UniformValue};
use crate::shader::ShaderRegistry;
use crate::shader::builtin::{COMPOSITE_COLOR_UNIFORM, COMPOSITE_DEPTH_UNIFORM};
use crate::target::HostSurface;
use super::group::Group;

// ===== FRAME CONTEXT =====

/// Per-frame execution statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Groups with at least one pass that were rendered
    pub groups_rendered: u32,
    /// Passes that issued a draw
    pub passes_drawn: u32,
    /// Visited passes that were skipped (allocation failure, missing shader)
    pub passes_skipped: u32,
    /// Render targets (re)allocated this frame
    pub targets_allocated: u32,
}

/// Result of one pipeline render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Image composited onto the host (host color for an empty pipeline)
    pub output: TextureHandle,
    pub stats: RenderStats,
}

/// Everything a pipeline needs to render one frame
pub struct FrameContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub shaders: &'a mut ShaderRegistry,
    pub config: &'a Config,
    pub surface: HostSurface,
    pub stats: RenderStats,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        shaders: &'a mut ShaderRegistry,
        config: &'a Config,
        surface: HostSurface,
    ) -> Self {
        Self {
            device,
            shaders,
            config,
            surface,
            stats: RenderStats::default(),
        }
    }
}

/// What a group sees of the groups rendered before it
pub(crate) struct GroupInputs<'a> {
    /// Groups before the current one, in pipeline order
    pub(crate) earlier: &'a [Group],
    /// Running output after each earlier group
    pub(crate) earlier_outputs: &'a [TextureHandle],
    /// Running output before the current group
    pub(crate) running_output: TextureHandle,
}

// ===== PIPELINE =====

#[derive(Debug, Default)]
pub struct Pipeline {
    groups: Vec<Group>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group, returning its index
    pub fn push(&mut self, group: Group) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Mutable group list (what init callbacks populate)
    pub fn groups_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Free the GPU resources of every group (groups are kept)
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        for group in &mut self.groups {
            group.release(device);
        }
    }

    /// Free every group and empty the list
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        self.release(device);
        self.groups.clear();
    }

    /// Run every group then composite the running output onto the host
    ///
    /// # Errors
    ///
    /// Device errors raised while drawing are returned after the saved state
    /// has been restored; the composite is skipped in that case. A missing
    /// compositing shader is an error.
    pub fn render(&mut self, frame: &mut FrameContext<'_>) -> Result<PipelineOutput> {
        let output = if self.groups.is_empty() {
            frame.surface.color
        } else {
            let saved_blend = frame.device.blend_state();
            let saved_alpha_test = frame.device.alpha_test_enabled();
            let saved_framebuffer = frame.device.bound_framebuffer();

            frame.device.set_alpha_test_enabled(false);
            let result = self.render_groups(frame);

            frame.device.set_blend_state(&saved_blend);
            frame.device.set_alpha_test_enabled(saved_alpha_test);
            frame.device.bind_framebuffer(saved_framebuffer);

            match result {
                Ok(output) => output,
                Err(e) => {
                    crate::engine_error!("postfx::Pipeline", "Group rendering failed: {}", e);
                    return Err(e);
                }
            }
        };

        self.composite(frame, output)?;

        Ok(PipelineOutput { output, stats: frame.stats })
    }

    fn render_groups(&mut self, frame: &mut FrameContext<'_>) -> Result<TextureHandle> {
        let mut running_output = frame.surface.color;
        let mut outputs: Vec<TextureHandle> = Vec::with_capacity(self.groups.len());

        for index in 0..self.groups.len() {
            let (earlier, rest) = self.groups.split_at_mut(index);
            let group = &mut rest[0];
            let inputs = GroupInputs {
                earlier,
                earlier_outputs: &outputs,
                running_output,
            };
            if let Some(output) = group.render(frame, &inputs)? {
                running_output = output;
            }
            outputs.push(running_output);
        }

        crate::engine_trace!("postfx::Pipeline",
            "Rendered {} groups ({} passes drawn, {} skipped)",
            frame.stats.groups_rendered, frame.stats.passes_drawn, frame.stats.passes_skipped);

        Ok(running_output)
    }

    fn composite(&self, frame: &mut FrameContext<'_>, output: TextureHandle) -> Result<()> {
        let name = frame.config.composite_shader.as_str();
        let Some(key) = frame.shaders.get(name) else {
            engine_bail!("postfx::Pipeline", "Compositing shader '{}' is not loaded", name);
        };
        let Some(shader) = frame.shaders.shader_mut(key) else {
            engine_bail!("postfx::Pipeline", "Compositing shader '{}' is not loaded", name);
        };

        let surface = frame.surface;
        let device: &mut dyn GraphicsDevice = &mut *frame.device;

        device.use_program(shader.program());
        device.set_viewport(Viewport::sized(surface.width, surface.height));

        device.bind_texture(0, Some(output));
        if let Some(location) = shader.uniform_location(&*device, COMPOSITE_COLOR_UNIFORM) {
            device.set_uniform(location, &UniformValue::Int(0));
        }
        device.bind_texture(1, Some(surface.depth));
        if let Some(location) = shader.uniform_location(&*device, COMPOSITE_DEPTH_UNIFORM) {
            device.set_uniform(location, &UniformValue::Int(1));
        }

        device.draw_fullscreen_quad()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
