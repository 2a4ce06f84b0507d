/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Tracks every object it hands out and the global state the pipeline is
/// expected to save and restore. Uniform declarations are parsed from the
/// program sources (`uniform <type> <name>;`), so lookups of undeclared names
/// return `None` exactly like a real driver. Each draw is recorded with the
/// samplers and uniform values visible to the active program.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::engine_bail;
use crate::graphics_device::{
    GraphicsDevice, TextureHandle, FramebufferHandle, ProgramHandle, UniformLocation,
    Viewport, ShaderDesc, TextureDesc, BlendState, UniformValue,
};

/// Locations encode `program * LOCATION_STRIDE + declaration index`
const LOCATION_STRIDE: u32 = 1024;

// ============================================================================
// Mock Program
// ============================================================================

#[derive(Debug, Clone)]
pub struct MockProgram {
    pub name: String,
    /// Declared uniforms as (glsl type, name), in declaration order
    pub declared: Vec<(String, String)>,
    /// Last value set per uniform name
    pub values: FxHashMap<String, UniformValue>,
}

impl MockProgram {
    fn parse(name: &str, sources: &[&str]) -> Self {
        let mut declared: Vec<(String, String)> = Vec::new();
        for source in sources {
            for line in source.lines() {
                let line = line.trim();
                let Some(rest) = line.strip_prefix("uniform ") else {
                    continue;
                };
                let mut parts = rest.split_whitespace();
                let (Some(ty), Some(ident)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let ident = ident.trim_end_matches(';');
                let ident = ident.split('[').next().unwrap_or(ident);
                if !declared.iter().any(|(_, n)| n == ident) {
                    declared.push((ty.to_string(), ident.to_string()));
                }
            }
        }

        Self {
            name: name.to_string(),
            declared,
            values: FxHashMap::default(),
        }
    }

    fn is_sampler(&self, name: &str) -> bool {
        self.declared.iter().any(|(ty, n)| n == name && ty.contains("sampler"))
    }
}

// ============================================================================
// Draw Record
// ============================================================================

/// Snapshot of one `draw_fullscreen_quad` call
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub program: ProgramHandle,
    pub program_name: String,
    pub framebuffer: Option<FramebufferHandle>,
    pub color_target: Option<TextureHandle>,
    pub viewport: Viewport,
    pub blend: BlendState,
    pub alpha_test: bool,
    /// Declared samplers: name -> (slot, texture bound at that slot)
    pub samplers: FxHashMap<String, (u32, Option<TextureHandle>)>,
    /// Declared non-sampler uniforms that have a value
    pub uniforms: FxHashMap<String, UniformValue>,
}

impl DrawRecord {
    /// Texture sampled through `name`
    pub fn sampler_texture(&self, name: &str) -> Option<TextureHandle> {
        self.samplers.get(name).and_then(|(_, texture)| *texture)
    }

    /// Slot assigned to the sampler `name`
    pub fn sampler_slot(&self, name: &str) -> Option<u32> {
        self.samplers.get(name).map(|(slot, _)| *slot)
    }

    /// Value of a non-sampler uniform
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

#[derive(Debug)]
pub struct MockGraphicsDevice {
    next_name: u32,
    pub textures: FxHashMap<TextureHandle, TextureDesc>,
    pub framebuffers: FxHashMap<FramebufferHandle, Option<TextureHandle>>,
    pub programs: FxHashMap<ProgramHandle, MockProgram>,
    pub bound_framebuffer: Option<FramebufferHandle>,
    pub blend: BlendState,
    pub alpha_test: bool,
    pub viewport: Viewport,
    pub active_program: Option<ProgramHandle>,
    pub texture_units: FxHashMap<u32, TextureHandle>,
    pub draws: Vec<DrawRecord>,
    pub clears: Vec<(Option<TextureHandle>, [f32; 4])>,
    pub uploads: Vec<(TextureHandle, usize)>,
    pub commands: Vec<String>,
    pub texture_creations: usize,
    pub framebuffer_creations: usize,
    pub destroyed_textures: Vec<TextureHandle>,
    pub destroyed_framebuffers: Vec<FramebufferHandle>,
    pub destroyed_programs: Vec<ProgramHandle>,
    pub fail_texture_creation: bool,
    pub fail_framebuffer_creation: bool,
    pub fail_program_creation: bool,
    pub max_slots: u32,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_name: 1,
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            programs: FxHashMap::default(),
            bound_framebuffer: None,
            blend: BlendState::default(),
            alpha_test: false,
            viewport: Viewport::default(),
            active_program: None,
            texture_units: FxHashMap::default(),
            draws: Vec::new(),
            clears: Vec::new(),
            uploads: Vec::new(),
            commands: Vec::new(),
            texture_creations: 0,
            framebuffer_creations: 0,
            destroyed_textures: Vec::new(),
            destroyed_framebuffers: Vec::new(),
            destroyed_programs: Vec::new(),
            fail_texture_creation: false,
            fail_framebuffer_creation: false,
            fail_program_creation: false,
            max_slots: 32,
        }
    }

    /// Mock limited to `max_slots` texture units
    pub fn with_max_slots(max_slots: u32) -> Self {
        Self { max_slots, ..Self::new() }
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    /// Number of textures currently alive
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Find the name of a program by handle
    pub fn program_name(&self, program: ProgramHandle) -> Option<&str> {
        self.programs.get(&program).map(|p| p.name.as_str())
    }

    /// Draws recorded with the program named `name`
    pub fn draws_with(&self, name: &str) -> Vec<&DrawRecord> {
        self.draws.iter().filter(|d| d.program_name == name).collect()
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        if self.fail_texture_creation {
            return Err(Error::OutOfMemory);
        }
        let handle = TextureHandle(self.next_name());
        self.textures.insert(handle, *desc);
        self.texture_creations += 1;
        self.commands.push(format!(
            "create_texture({}x{}x{}, {})",
            desc.width, desc.height, desc.depth, desc.format.storage_name()
        ));
        Ok(handle)
    }

    fn upload_texture(&mut self, texture: TextureHandle, desc: &TextureDesc, data: &[u8]) -> Result<()> {
        if !self.textures.contains_key(&texture) {
            engine_bail!("postfx::MockGraphicsDevice", "Upload into unknown texture {:?}", texture);
        }
        if data.len() != desc.byte_size() {
            return Err(Error::InvalidResource(format!(
                "Upload of {} bytes into a {} byte texture", data.len(), desc.byte_size()
            )));
        }
        self.uploads.push((texture, data.len()));
        self.commands.push(format!("upload_texture({})", texture.0));
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.destroyed_textures.push(texture);
            self.commands.push(format!("destroy_texture({})", texture.0));
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        if self.fail_framebuffer_creation {
            engine_bail!("postfx::MockGraphicsDevice", "Framebuffer creation failed");
        }
        let handle = FramebufferHandle(self.next_name());
        self.framebuffers.insert(handle, None);
        self.framebuffer_creations += 1;
        self.commands.push(format!("create_framebuffer({})", handle.0));
        Ok(handle)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if self.framebuffers.remove(&framebuffer).is_some() {
            self.destroyed_framebuffers.push(framebuffer);
            self.commands.push(format!("destroy_framebuffer({})", framebuffer.0));
        }
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_framebuffer
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.bound_framebuffer = framebuffer;
        self.commands.push(format!("bind_framebuffer({:?})", framebuffer.map(|f| f.0)));
    }

    fn attach_color_target(&mut self, texture: TextureHandle) -> Result<()> {
        let Some(framebuffer) = self.bound_framebuffer else {
            engine_bail!("postfx::MockGraphicsDevice", "No framebuffer bound for color attachment");
        };
        if !self.textures.contains_key(&texture) {
            return Err(Error::InvalidResource(format!("Unknown texture {:?}", texture)));
        }
        self.framebuffers.insert(framebuffer, Some(texture));
        self.commands.push(format!("attach_color_target({})", texture.0));
        Ok(())
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        let target = self.bound_framebuffer
            .and_then(|fb| self.framebuffers.get(&fb).copied().flatten());
        self.clears.push((target, color));
        self.commands.push("clear_color".to_string());
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn blend_state(&self) -> BlendState {
        self.blend
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        self.blend = *state;
    }

    fn alpha_test_enabled(&self) -> bool {
        self.alpha_test
    }

    fn set_alpha_test_enabled(&mut self, enabled: bool) {
        self.alpha_test = enabled;
    }

    fn create_program(&mut self, desc: &ShaderDesc<'_>) -> Result<ProgramHandle> {
        if self.fail_program_creation {
            engine_bail!("postfx::MockGraphicsDevice", "Link of '{}' failed", desc.debug_name);
        }
        let handle = ProgramHandle(self.next_name());
        let program = MockProgram::parse(desc.debug_name, &[desc.vertex_source, desc.fragment_source]);
        self.programs.insert(handle, program);
        self.commands.push(format!("create_program({})", desc.debug_name));
        Ok(handle)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_some() {
            self.destroyed_programs.push(program);
        }
        if self.active_program == Some(program) {
            self.active_program = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.active_program = Some(program);
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let declared = &self.programs.get(&program)?.declared;
        let index = declared.iter().position(|(_, n)| n == name)?;
        Some(UniformLocation(program.0 * LOCATION_STRIDE + index as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let program = ProgramHandle(location.0 / LOCATION_STRIDE);
        let index = (location.0 % LOCATION_STRIDE) as usize;
        if self.active_program != Some(program) {
            self.commands.push(format!("set_uniform on inactive program {}", program.0));
        }
        if let Some(mock) = self.programs.get_mut(&program) {
            if let Some((_, name)) = mock.declared.get(index).cloned() {
                mock.values.insert(name, *value);
            }
        }
    }

    fn bind_texture(&mut self, slot: u32, texture: Option<TextureHandle>) {
        match texture {
            Some(texture) => { self.texture_units.insert(slot, texture); }
            None => { self.texture_units.remove(&slot); }
        }
    }

    fn draw_fullscreen_quad(&mut self) -> Result<()> {
        let Some(handle) = self.active_program else {
            engine_bail!("postfx::MockGraphicsDevice", "Draw without an active program");
        };
        let Some(program) = self.programs.get(&handle) else {
            return Err(Error::InvalidResource(format!("Unknown program {:?}", handle)));
        };

        let mut samplers = FxHashMap::default();
        let mut uniforms = FxHashMap::default();
        for (name, value) in &program.values {
            if program.is_sampler(name) {
                if let UniformValue::Int(slot) = value {
                    let slot = *slot as u32;
                    samplers.insert(name.clone(), (slot, self.texture_units.get(&slot).copied()));
                }
            } else {
                uniforms.insert(name.clone(), *value);
            }
        }

        let color_target = self.bound_framebuffer
            .and_then(|fb| self.framebuffers.get(&fb).copied().flatten());

        self.draws.push(DrawRecord {
            program: handle,
            program_name: program.name.clone(),
            framebuffer: self.bound_framebuffer,
            color_target,
            viewport: self.viewport,
            blend: self.blend,
            alpha_test: self.alpha_test,
            samplers,
            uniforms,
        });
        self.commands.push(format!("draw({})", program.name));
        Ok(())
    }

    fn max_texture_slots(&self) -> u32 {
        self.max_slots
    }
}

// ============================================================================
// Shared Mock (for tests that hand the device to an Engine)
// ============================================================================

/// Mock device shared between an `Engine` (which owns a boxed device) and the test
#[derive(Debug, Clone, Default)]
pub struct SharedMockDevice(pub Rc<RefCell<MockGraphicsDevice>>);

impl SharedMockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mock(&self) -> Ref<'_, MockGraphicsDevice> {
        self.0.borrow()
    }

    pub fn mock_mut(&self) -> RefMut<'_, MockGraphicsDevice> {
        self.0.borrow_mut()
    }
}

impl GraphicsDevice for SharedMockDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        self.0.borrow_mut().create_texture(desc)
    }

    fn upload_texture(&mut self, texture: TextureHandle, desc: &TextureDesc, data: &[u8]) -> Result<()> {
        self.0.borrow_mut().upload_texture(texture, desc, data)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.0.borrow_mut().destroy_texture(texture)
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        self.0.borrow_mut().create_framebuffer()
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.0.borrow_mut().destroy_framebuffer(framebuffer)
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.0.borrow().bound_framebuffer()
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.0.borrow_mut().bind_framebuffer(framebuffer)
    }

    fn attach_color_target(&mut self, texture: TextureHandle) -> Result<()> {
        self.0.borrow_mut().attach_color_target(texture)
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.0.borrow_mut().clear_color(color)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.0.borrow_mut().set_viewport(viewport)
    }

    fn blend_state(&self) -> BlendState {
        self.0.borrow().blend_state()
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        self.0.borrow_mut().set_blend_state(state)
    }

    fn alpha_test_enabled(&self) -> bool {
        self.0.borrow().alpha_test_enabled()
    }

    fn set_alpha_test_enabled(&mut self, enabled: bool) {
        self.0.borrow_mut().set_alpha_test_enabled(enabled)
    }

    fn create_program(&mut self, desc: &ShaderDesc<'_>) -> Result<ProgramHandle> {
        self.0.borrow_mut().create_program(desc)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.0.borrow_mut().destroy_program(program)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.0.borrow_mut().use_program(program)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.0.borrow().uniform_location(program, name)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.0.borrow_mut().set_uniform(location, value)
    }

    fn bind_texture(&mut self, slot: u32, texture: Option<TextureHandle>) {
        self.0.borrow_mut().bind_texture(slot, texture)
    }

    fn draw_fullscreen_quad(&mut self) -> Result<()> {
        self.0.borrow_mut().draw_fullscreen_quad()
    }

    fn max_texture_slots(&self) -> u32 {
        self.0.borrow().max_texture_slots()
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
