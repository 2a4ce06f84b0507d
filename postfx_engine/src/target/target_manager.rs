/// Host target side table
///
/// The engine never touches the host render target object itself. Each host
/// is identified by an opaque `HostTargetId` and gets an attachment record
/// holding its init callbacks, its pipeline, the surface it last reported and
/// where it is in its lifecycle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, TextureHandle, FramebufferHandle};
use crate::pass_graph::{Group, Pipeline};
use crate::shader::{ShaderKey, ShaderRegistry, ShaderSource};

// ===== HOST =====

/// Identity of a host render target (chosen by the host)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostTargetId(pub u64);

/// What a host target exposes to the pass graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSurface {
    /// The host's own framebuffer
    pub framebuffer: Option<FramebufferHandle>,
    pub color: TextureHandle,
    pub depth: TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Lifecycle of an attached host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    /// Attached, never initialized
    Uninitialized,
    /// Callbacks ran for the current surface
    Populated,
    /// Released; the record is about to go away
    Destroyed,
}

// ===== CALLBACKS =====

/// Plain function init callback
pub type InitFn = fn(&mut InitContext<'_>);

/// Init callback registered against a host
///
/// Equality is identity: same function pointer or same `Arc`.
#[derive(Clone)]
pub enum InitCallback {
    Fn(InitFn),
    Shared(Arc<dyn Fn(&mut InitContext<'_>)>),
}

impl InitCallback {
    pub fn function(f: InitFn) -> Self {
        InitCallback::Fn(f)
    }

    /// Wrap a closure; clone the returned callback to attach it elsewhere
    pub fn shared(f: impl Fn(&mut InitContext<'_>) + 'static) -> Self {
        InitCallback::Shared(Arc::new(f))
    }

    pub fn call(&self, ctx: &mut InitContext<'_>) {
        match self {
            InitCallback::Fn(f) => f(ctx),
            InitCallback::Shared(f) => f(ctx),
        }
    }
}

impl PartialEq for InitCallback {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InitCallback::Fn(a), InitCallback::Fn(b)) => *a as usize == *b as usize,
            (InitCallback::Shared(a), InitCallback::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for InitCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitCallback::Fn(func) => write!(f, "InitCallback::Fn({:#x})", *func as usize),
            InitCallback::Shared(arc) => write!(f, "InitCallback::Shared({:p})", Arc::as_ptr(arc)),
        }
    }
}

impl From<InitFn> for InitCallback {
    fn from(f: InitFn) -> Self {
        InitCallback::Fn(f)
    }
}

/// What an init callback receives
///
/// `groups` is empty when the first callback runs; callbacks append groups
/// and load the shaders their passes reference.
pub struct InitContext<'a> {
    pub surface: HostSurface,
    pub groups: &'a mut Vec<Group>,
    pub shaders: &'a mut ShaderRegistry,
    pub device: &'a mut dyn GraphicsDevice,
}

impl<'a> InitContext<'a> {
    /// See `ShaderRegistry::load_pass_shader`
    pub fn load_pass_shader(&mut self, name: &str, fragment_path: impl AsRef<Path>) -> Result<ShaderKey> {
        self.shaders.load_pass_shader(self.device, name, fragment_path)
    }

    /// Compile (or recompile) a shader from in-memory sources
    pub fn load_shader_source(&mut self, name: &str, source: &ShaderSource) -> Result<ShaderKey> {
        self.shaders.load_source(self.device, name, source)
    }

    /// Key of an already loaded shader
    pub fn shader(&self, name: &str) -> Option<ShaderKey> {
        self.shaders.get(name)
    }

    /// Append a group, returning its index
    pub fn push_group(&mut self, group: Group) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }
}

// ===== RECORD =====

/// Per-host attachment record
#[derive(Debug)]
pub struct AttachmentRecord {
    pub callbacks: Vec<InitCallback>,
    pub pipeline: Pipeline,
    pub surface: Option<HostSurface>,
    pub state: HostState,
}

impl AttachmentRecord {
    fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            pipeline: Pipeline::new(),
            surface: None,
            state: HostState::Uninitialized,
        }
    }

    /// Release the pipeline and mark the record destroyed
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.pipeline.clear(device);
        self.surface = None;
        self.state = HostState::Destroyed;
    }
}

// ===== MANAGER =====

/// Side table of attached hosts (owned by the Engine)
#[derive(Debug, Default)]
pub struct TargetManager {
    records: FxHashMap<HostTargetId, AttachmentRecord>,
}

impl TargetManager {
    /// Create an empty side table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `host`, creating the record on first use
    ///
    /// Returns false (and registers nothing) when an identical callback is
    /// already registered for this host.
    pub fn attach(&mut self, host: HostTargetId, callback: InitCallback) -> bool {
        let record = self.records.entry(host).or_insert_with(AttachmentRecord::new);
        if record.callbacks.contains(&callback) {
            crate::engine_debug!("postfx::TargetManager",
                "Callback already attached to host {}", host.0);
            return false;
        }
        record.callbacks.push(callback);
        true
    }

    /// Unregister one callback; the record (and its pipeline) stays
    pub fn detach(&mut self, host: HostTargetId, callback: &InitCallback) -> bool {
        let Some(record) = self.records.get_mut(&host) else {
            return false;
        };
        let before = record.callbacks.len();
        record.callbacks.retain(|c| c != callback);
        record.callbacks.len() != before
    }

    pub fn record(&self, host: HostTargetId) -> Option<&AttachmentRecord> {
        self.records.get(&host)
    }

    pub fn record_mut(&mut self, host: HostTargetId) -> Option<&mut AttachmentRecord> {
        self.records.get_mut(&host)
    }

    /// Remove a record without releasing it
    pub fn remove(&mut self, host: HostTargetId) -> Option<AttachmentRecord> {
        self.records.remove(&host)
    }

    pub fn contains(&self, host: HostTargetId) -> bool {
        self.records.contains_key(&host)
    }

    pub fn host_count(&self) -> usize {
        self.records.len()
    }

    /// Attached hosts, sorted by id
    pub fn hosts(&self) -> Vec<HostTargetId> {
        let mut hosts: Vec<HostTargetId> = self.records.keys().copied().collect();
        hosts.sort();
        hosts
    }

    /// Destroy and drop every record
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, mut record) in self.records.drain() {
            record.destroy(device);
        }
    }
}

#[cfg(test)]
#[path = "target_manager_tests.rs"]
mod tests;
