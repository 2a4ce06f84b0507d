/// Tests for TargetManager
///
/// These tests validate callback registration and deduplication, record
/// lookup and removal, and release of attached pipelines.

use super::*;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::PixelFormat;
use crate::pass_graph::Pass;
use slotmap::KeyData;

fn populate_one(ctx: &mut InitContext<'_>) {
    ctx.push_group(Group::new());
}

fn populate_two(ctx: &mut InitContext<'_>) {
    ctx.push_group(Group::new());
    ctx.push_group(Group::new());
}

fn host(id: u64) -> HostTargetId {
    HostTargetId(id)
}

// ============================================================================
// Tests: attach
// ============================================================================

#[test]
fn test_new_manager_is_empty() {
    let tm = TargetManager::new();
    assert_eq!(tm.host_count(), 0);
    assert!(tm.record(host(1)).is_none());
}

#[test]
fn test_attach_creates_uninitialized_record() {
    let mut tm = TargetManager::new();
    assert!(tm.attach(host(1), InitCallback::function(populate_one)));

    let record = tm.record(host(1)).unwrap();
    assert_eq!(record.state, HostState::Uninitialized);
    assert_eq!(record.callbacks.len(), 1);
    assert!(record.pipeline.is_empty());
    assert!(record.surface.is_none());
}

#[test]
fn test_attach_same_function_twice_registers_once() {
    let mut tm = TargetManager::new();
    assert!(tm.attach(host(1), InitCallback::function(populate_one)));
    assert!(!tm.attach(host(1), InitCallback::function(populate_one)));

    assert_eq!(tm.record(host(1)).unwrap().callbacks.len(), 1);
}

#[test]
fn test_attach_distinct_functions_keeps_order() {
    let mut tm = TargetManager::new();
    tm.attach(host(1), InitCallback::function(populate_one));
    tm.attach(host(1), InitCallback::function(populate_two));

    let callbacks = &tm.record(host(1)).unwrap().callbacks;
    assert_eq!(callbacks[0], InitCallback::function(populate_one));
    assert_eq!(callbacks[1], InitCallback::function(populate_two));
}

#[test]
fn test_shared_callbacks_compare_by_identity() {
    let a = InitCallback::shared(|ctx| { ctx.push_group(Group::new()); });
    let b = InitCallback::shared(|ctx| { ctx.push_group(Group::new()); });

    let mut tm = TargetManager::new();
    assert!(tm.attach(host(1), a.clone()));
    assert!(!tm.attach(host(1), a.clone()));
    assert!(tm.attach(host(1), b));
    assert_eq!(tm.record(host(1)).unwrap().callbacks.len(), 2);
}

#[test]
fn test_same_callback_on_two_hosts() {
    let mut tm = TargetManager::new();
    assert!(tm.attach(host(1), InitCallback::function(populate_one)));
    assert!(tm.attach(host(2), InitCallback::function(populate_one)));
    assert_eq!(tm.hosts(), vec![host(1), host(2)]);
}

#[test]
fn test_detach() {
    let mut tm = TargetManager::new();
    tm.attach(host(1), InitCallback::function(populate_one));

    assert!(tm.detach(host(1), &InitCallback::function(populate_one)));
    assert!(!tm.detach(host(1), &InitCallback::function(populate_one)));
    assert!(!tm.detach(host(9), &InitCallback::function(populate_one)));
    assert!(tm.contains(host(1)));
}

// ============================================================================
// Tests: callbacks
// ============================================================================

#[test]
fn test_callback_populates_groups() {
    let mut device = MockGraphicsDevice::new();
    let mut shaders = ShaderRegistry::new();
    let mut groups = Vec::new();
    let mut ctx = InitContext {
        surface: HostSurface {
            framebuffer: None,
            color: TextureHandle(1),
            depth: TextureHandle(2),
            width: 64,
            height: 32,
        },
        groups: &mut groups,
        shaders: &mut shaders,
        device: &mut device,
    };

    InitCallback::function(populate_two).call(&mut ctx);
    let key = ctx.load_shader_source("blur", &ShaderSource::pass("void main() {}")).unwrap();
    assert_eq!(ctx.shader("blur"), Some(key));

    assert_eq!(groups.len(), 2);
}

// ============================================================================
// Tests: removal
// ============================================================================

#[test]
fn test_destroy_releases_pipeline() {
    let mut device = MockGraphicsDevice::new();
    let mut tm = TargetManager::new();
    tm.attach(host(1), InitCallback::function(populate_one));

    let record = tm.record_mut(host(1)).unwrap();
    let mut pass = Pass::new(KeyData::from_ffi(1).into());
    pass.target_mut().ensure_size(&mut device, 8, 8, PixelFormat::RGBA).unwrap();
    record.pipeline.push(Group::new().with_pass(pass));

    record.destroy(&mut device);

    assert_eq!(record.state, HostState::Destroyed);
    assert!(record.pipeline.is_empty());
    assert_eq!(device.live_texture_count(), 0);
}

#[test]
fn test_remove_and_clear() {
    let mut device = MockGraphicsDevice::new();
    let mut tm = TargetManager::new();
    tm.attach(host(1), InitCallback::function(populate_one));
    tm.attach(host(2), InitCallback::function(populate_one));

    assert!(tm.remove(host(1)).is_some());
    assert!(tm.remove(host(1)).is_none());
    assert_eq!(tm.host_count(), 1);

    tm.clear(&mut device);
    assert_eq!(tm.host_count(), 0);
}
