/// Tests for Pipeline execution
///
/// These tests validate running-output threading across groups, addressing
/// of earlier groups by distance, the final composite and save/restore of
/// the caller's device state.

use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{BlendState, BlendEquation, BlendFactor, FramebufferHandle};
use crate::pass_graph::{Pass, Direction, Range, BlendMode};
use crate::shader::{ShaderKey, ShaderSource};
use crate::shader::builtin::{PASS_VERTEX_SHADER, COMPOSITE_FRAGMENT_SHADER};

const COLOR: TextureHandle = TextureHandle(500);
const DEPTH: TextureHandle = TextureHandle(501);
const CALLER_FRAMEBUFFER: FramebufferHandle = FramebufferHandle(4242);

const INSPECT: &str = "#version 330 core\n\
in vec2 texCoord;\n\
uniform sampler2D source;\n\
uniform sampler2D prevPassGroup;\n\
uniform sampler2D prevPass;\n\
uniform sampler2D p_group;\n\
uniform sampler2D p_pass0;\n\
uniform vec4 p_pass0_size;\n\
uniform sampler2D p_passInd;\n\
uniform vec4 p_passInd_size;\n\
uniform sampler2D pp_group;\n\
uniform sampler2D ppp_group;\n\
out vec4 fragColor;\n\
void main() { fragColor = texture(source, texCoord); }\n";

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    device: MockGraphicsDevice,
    shaders: ShaderRegistry,
    config: Config,
    surface: HostSurface,
    inspect: ShaderKey,
}

impl Fixture {
    fn new() -> Self {
        let mut device = MockGraphicsDevice::new();
        let mut shaders = ShaderRegistry::new();
        let config = Config::default();
        shaders.load_source(
            &mut device,
            &config.composite_shader,
            &ShaderSource::new(PASS_VERTEX_SHADER, COMPOSITE_FRAGMENT_SHADER),
        ).unwrap();
        let inspect = shaders.load_source(&mut device, "inspect", &ShaderSource::pass(INSPECT)).unwrap();

        Self {
            device,
            shaders,
            config,
            surface: HostSurface {
                framebuffer: None,
                color: COLOR,
                depth: DEPTH,
                width: 80,
                height: 40,
            },
            inspect,
        }
    }

    fn render(&mut self, pipeline: &mut Pipeline) -> Result<PipelineOutput> {
        let mut frame = FrameContext::new(&mut self.device, &mut self.shaders, &self.config, self.surface);
        pipeline.render(&mut frame)
    }

    fn group(&self, passes: usize) -> Group {
        let mut group = Group::new();
        for _ in 0..passes {
            group.push_pass(Pass::new(self.inspect));
        }
        group
    }

    fn pass_draws(&self) -> Vec<&crate::graphics_device::mock_graphics_device::DrawRecord> {
        self.device.draws_with("inspect")
    }

    fn composite_draw(&self) -> &crate::graphics_device::mock_graphics_device::DrawRecord {
        self.device.draws_with("postShader")[0]
    }
}

fn custom_blend() -> BlendState {
    BlendState {
        enabled: true,
        color_equation: BlendEquation::ReverseSubtract,
        alpha_equation: BlendEquation::Max,
        src_color: BlendFactor::DstColor,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        src_alpha: BlendFactor::ConstantAlpha,
        dst_alpha: BlendFactor::SrcAlphaSaturate,
    }
}

// ============================================================================
// Tests: scenarios
// ============================================================================

#[test]
fn test_empty_pipeline_composites_host_color() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    fx.device.alpha_test = true;
    fx.device.bound_framebuffer = Some(CALLER_FRAMEBUFFER);

    let result = fx.render(&mut pipeline).unwrap();

    assert_eq!(result.output, COLOR);
    assert_eq!(result.stats, RenderStats::default());
    assert_eq!(fx.device.draws.len(), 1);
    assert_eq!(fx.composite_draw().sampler_texture("colorImage"), Some(COLOR));
    assert!(fx.device.commands.iter().all(|c| !c.starts_with("bind_framebuffer")));
    assert!(fx.device.alpha_test);
}

#[test]
fn test_single_group_single_pass() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));

    let result = fx.render(&mut pipeline).unwrap();

    let target = pipeline.groups()[0].passes()[0].output().unwrap();
    assert_eq!(result.output, target);
    assert_eq!(pipeline.groups()[0].output(), Some(target));
    assert_eq!(fx.pass_draws().len(), 1);
    assert_eq!(fx.device.textures[&target].width, 80);
    assert_eq!(fx.device.textures[&target].height, 40);
    assert_eq!(fx.composite_draw().sampler_texture("colorImage"), Some(target));
    assert_eq!(fx.composite_draw().sampler_texture("depthImage"), Some(DEPTH));
}

#[test]
fn test_skip_last_output_is_second_pass() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(3).with_iteration(Direction::Forward, Range::SkipLast));

    let result = fx.render(&mut pipeline).unwrap();

    let passes = pipeline.groups()[0].passes();
    assert_eq!(fx.pass_draws().len(), 2);
    assert_eq!(Some(result.output), passes[1].output());
    assert!(passes[2].output().is_none());
    assert_eq!(result.stats.passes_drawn, 2);
}

#[test]
fn test_second_group_addresses_first_by_distance() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));
    pipeline.push(fx.group(1));

    let result = fx.render(&mut pipeline).unwrap();

    let first = pipeline.groups()[0].output().unwrap();
    let second = pipeline.groups()[1].output().unwrap();
    assert_eq!(result.output, second);

    let draw = fx.pass_draws()[1];
    assert_eq!(draw.sampler_texture("p_group"), Some(first));
    assert_eq!(draw.sampler_texture("prevPassGroup"), Some(first));
    // No group two steps back: default slot 0
    assert_eq!(draw.sampler_slot("pp_group"), Some(0));
    assert_eq!(draw.sampler_slot("ppp_group"), None);
}

#[test]
fn test_earlier_group_pass_references() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));
    pipeline.push(fx.group(1));

    fx.render(&mut pipeline).unwrap();

    let first_pass = pipeline.groups()[0].passes()[0].output();
    let draw = fx.pass_draws()[1];
    // source, sourceDepth, prevPassGroup, prevPass, p_group, p_pass0, p_passInd
    assert_eq!(draw.sampler_slot("p_group"), Some(4));
    assert_eq!(draw.sampler_slot("p_pass0"), Some(5));
    assert_eq!(draw.sampler_texture("p_pass0"), first_pass);
    assert_eq!(draw.uniform("p_pass0_size"), Some(&UniformValue::size_vector(80, 40)));
    assert_eq!(draw.sampler_slot("p_passInd"), Some(6));
    assert_eq!(draw.sampler_texture("p_passInd"), first_pass);
}

#[test]
fn test_pass_ind_is_clamped_into_earlier_group() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    let shader = fx.inspect;
    pipeline.push(Group::new()
        .with_pass(Pass::new(shader))
        .with_pass(Pass::new(shader).with_divisor(2)));
    pipeline.push(fx.group(4));

    fx.render(&mut pipeline).unwrap();

    let earlier = pipeline.groups()[0].passes();
    let draws = fx.pass_draws();
    // Second group's passes are draws 2..6
    assert_eq!(draws[2].sampler_texture("p_passInd"), earlier[0].output());
    assert_eq!(draws[3].sampler_texture("p_passInd"), earlier[1].output());
    assert_eq!(draws[5].sampler_texture("p_passInd"), earlier[1].output());
    assert_eq!(draws[5].uniform("p_passInd_size"), Some(&UniformValue::size_vector(40, 20)));
}

#[test]
fn test_three_groups_distance_two() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));
    pipeline.push(fx.group(1));
    pipeline.push(fx.group(1));

    fx.render(&mut pipeline).unwrap();

    let first = pipeline.groups()[0].output();
    let second = pipeline.groups()[1].output();
    let draw = fx.pass_draws()[2];
    assert_eq!(draw.sampler_texture("p_group"), second);
    assert_eq!(draw.sampler_texture("pp_group"), first);
    assert_eq!(draw.sampler_slot("ppp_group"), Some(0));
}

#[test]
fn test_empty_group_keeps_running_output() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));
    pipeline.push(Group::new());
    pipeline.push(fx.group(1));

    let result = fx.render(&mut pipeline).unwrap();

    let first = pipeline.groups()[0].output();
    let draw = fx.pass_draws()[1];
    assert_eq!(draw.sampler_texture("prevPassGroup"), first);
    // The empty group in between still counts as a distance step and exposes the running output
    assert_eq!(draw.sampler_texture("p_group"), first);
    assert_eq!(draw.sampler_texture("pp_group"), first);
    assert_eq!(result.stats.groups_rendered, 2);
}

// ============================================================================
// Tests: state restoration
// ============================================================================

#[test]
fn test_state_restored_after_render() {
    let mut fx = Fixture::new();
    fx.device.blend = custom_blend();
    fx.device.alpha_test = true;
    fx.device.bound_framebuffer = Some(CALLER_FRAMEBUFFER);

    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(2).with_blend(BlendMode::Add, BlendFactor::One, BlendFactor::One));
    pipeline.push(fx.group(1));

    fx.render(&mut pipeline).unwrap();

    assert_eq!(fx.device.blend, custom_blend());
    assert!(fx.device.alpha_test);
    assert_eq!(fx.device.bound_framebuffer, Some(CALLER_FRAMEBUFFER));
}

#[test]
fn test_state_restored_when_features_were_disabled() {
    let mut fx = Fixture::new();
    fx.device.blend = BlendState::DISABLED;
    fx.device.alpha_test = false;
    fx.device.bound_framebuffer = None;

    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1).with_blend(BlendMode::Max, BlendFactor::One, BlendFactor::One));

    fx.render(&mut pipeline).unwrap();

    assert_eq!(fx.device.blend, BlendState::DISABLED);
    assert!(!fx.device.alpha_test);
    assert_eq!(fx.device.bound_framebuffer, None);
}

#[test]
fn test_passes_run_without_alpha_test() {
    let mut fx = Fixture::new();
    fx.device.alpha_test = true;
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(2));

    fx.render(&mut pipeline).unwrap();

    assert!(fx.pass_draws().iter().all(|d| !d.alpha_test));
}

#[test]
fn test_composite_draws_into_caller_framebuffer() {
    let mut fx = Fixture::new();
    fx.device.bound_framebuffer = Some(CALLER_FRAMEBUFFER);
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1).with_iteration(Direction::Backward, Range::All));

    fx.render(&mut pipeline).unwrap();

    let composite = fx.composite_draw();
    assert_eq!(composite.framebuffer, Some(CALLER_FRAMEBUFFER));
    assert_eq!((composite.viewport.width, composite.viewport.height), (80, 40));
    assert_eq!(composite.sampler_slot("colorImage"), Some(0));
    assert_eq!(composite.sampler_slot("depthImage"), Some(1));
}

#[test]
fn test_state_restored_on_group_failure() {
    let mut fx = Fixture::new();
    fx.device.blend = custom_blend();
    fx.device.alpha_test = true;
    fx.device.bound_framebuffer = Some(CALLER_FRAMEBUFFER);
    fx.device.fail_framebuffer_creation = true;

    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1).with_blend(BlendMode::Add, BlendFactor::One, BlendFactor::One));

    let result = fx.render(&mut pipeline);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(fx.device.blend, custom_blend());
    assert!(fx.device.alpha_test);
    assert_eq!(fx.device.bound_framebuffer, Some(CALLER_FRAMEBUFFER));
    assert!(fx.device.draws.is_empty());
}

#[test]
fn test_missing_composite_shader_is_an_error() {
    let mut fx = Fixture::new();
    fx.config.composite_shader = "missing".to_string();
    let mut pipeline = Pipeline::new();

    assert!(fx.render(&mut pipeline).is_err());
}

// ============================================================================
// Tests: statistics and lifetime
// ============================================================================

#[test]
fn test_stats_count_allocations_per_frame() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(2));
    pipeline.push(fx.group(1));

    let first = fx.render(&mut pipeline).unwrap().stats;
    let second = fx.render(&mut pipeline).unwrap().stats;

    assert_eq!(first, RenderStats { groups_rendered: 2, passes_drawn: 3, passes_skipped: 0, targets_allocated: 3 });
    assert_eq!(second.targets_allocated, 0);
    assert_eq!(second.passes_drawn, 3);
}

#[test]
fn test_allocation_failure_keeps_running_output() {
    let mut fx = Fixture::new();
    fx.device.fail_texture_creation = true;
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));

    let result = fx.render(&mut pipeline).unwrap();

    assert_eq!(result.output, COLOR);
    assert_eq!(result.stats.passes_skipped, 1);
    assert_eq!(fx.composite_draw().sampler_texture("colorImage"), Some(COLOR));
}

#[test]
fn test_unloaded_shader_keeps_running_output() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));
    fx.shaders.remove(&mut fx.device, "inspect");

    let result = fx.render(&mut pipeline).unwrap();

    assert_eq!(result.output, COLOR);
    assert_eq!(result.stats.passes_skipped, 1);
    assert_eq!(result.stats.targets_allocated, 0);
    assert!(pipeline.groups()[0].passes()[0].output().is_none());
    assert!(fx.device.clears.is_empty());
    assert_eq!(fx.composite_draw().sampler_texture("colorImage"), Some(COLOR));
}

#[test]
fn test_stale_target_is_not_presented_after_shader_removal() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(1));
    fx.render(&mut pipeline).unwrap();
    let stale = pipeline.groups()[0].passes()[0].output().unwrap();

    fx.shaders.remove(&mut fx.device, "inspect");
    fx.device.draws.clear();
    let result = fx.render(&mut pipeline).unwrap();

    assert_eq!(result.output, COLOR);
    assert_eq!(pipeline.groups()[0].output(), None);
    assert_ne!(fx.composite_draw().sampler_texture("colorImage"), Some(stale));
}

#[test]
fn test_clear_releases_everything() {
    let mut fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.push(fx.group(2));
    pipeline.push(fx.group(1));
    fx.render(&mut pipeline).unwrap();

    pipeline.clear(&mut fx.device);

    assert!(pipeline.is_empty());
    assert_eq!(fx.device.live_texture_count(), 0);
    assert!(fx.device.framebuffers.is_empty());
}

#[test]
fn test_groups_mut_allows_population() {
    let fx = Fixture::new();
    let mut pipeline = Pipeline::new();
    pipeline.groups_mut().push(fx.group(1));
    assert_eq!(pipeline.len(), 1);
    assert_eq!(pipeline.push(Group::new()), 1);
}
