/// GlGraphicsDevice - OpenGL implementation of the GraphicsDevice trait
///
/// Wraps a `glow::Context` that the host owns and keeps current. Engine
/// handles are raw GL object names, so host textures (its color and depth
/// images) can be handed to the pass graph without wrapping.

use postfx_engine::postfx::{GraphicsDevice, Result, Error};
use postfx_engine::postfx::device::{
    TextureHandle, FramebufferHandle, ProgramHandle, UniformLocation, Viewport,
    ShaderDesc, TextureDesc, TextureDimension, BlendState, BlendEquation, BlendFactor,
    UniformValue,
};
use postfx_engine::{engine_debug, engine_info, engine_warn, engine_err, engine_bail};
use glow::HasContext;
use rustc_hash::FxHashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::gl_debug::{
    begin_gl_check, check_gl_error, check_gl_allocation, discard_gl_errors, creation_error,
};
use crate::gl_format::{
    texture_format_to_gl, texture_target, filter_to_gl, wrap_to_gl,
    blend_equation_to_gl, blend_equation_from_gl, blend_factor_to_gl, blend_factor_from_gl,
    framebuffer_status_name, framebuffer_binding_query, FRAMEBUFFER_TARGET,
};

/// `GL_ALPHA_TEST` (compatibility profiles only)
const ALPHA_TEST: u32 = 0x0BC0;

/// Clip-space quad, two triangles
const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0], [1.0, -1.0], [1.0, 1.0],
    [-1.0, -1.0], [1.0, 1.0], [-1.0, 1.0],
];

/// Attribute the built-in vertex stage reads the quad from
const QUAD_ATTRIBUTE: u32 = 0;

// ===== HANDLE CONVERSIONS =====

fn native_texture(texture: TextureHandle) -> Option<glow::NativeTexture> {
    NonZeroU32::new(texture.0).map(glow::NativeTexture)
}

fn native_framebuffer(framebuffer: FramebufferHandle) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(framebuffer.0).map(glow::NativeFramebuffer)
}

fn native_program(program: ProgramHandle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(program.0).map(glow::NativeProgram)
}

fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ============================================================================
// GlGraphicsDevice
// ============================================================================

/// OpenGL 3.3+ device
pub struct GlGraphicsDevice {
    gl: Arc<glow::Context>,
    /// Textures created by this device, with their descriptors
    textures: FxHashMap<TextureHandle, TextureDesc>,
    /// Target last bound on each texture unit
    unit_targets: FxHashMap<u32, u32>,
    quad_vertex_array: glow::NativeVertexArray,
    quad_buffer: glow::NativeBuffer,
    max_texture_slots: u32,
    alpha_test_supported: bool,
}

impl GlGraphicsDevice {
    /// Create the device on the host's current context
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the quad vertex array or buffer cannot be created.
    pub fn new(gl: Arc<glow::Context>) -> Result<Self> {
        unsafe {
            let quad_vertex_array = gl.create_vertex_array()
                .map_err(|e| creation_error("quad vertex array", e))?;
            let quad_buffer = match gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(e) => {
                    gl.delete_vertex_array(quad_vertex_array);
                    return Err(creation_error("quad vertex buffer", e));
                }
            };

            gl.bind_vertex_array(Some(quad_vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(quad_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES[..]),
                glow::STATIC_DRAW,
            );
            gl.vertex_attrib_pointer_f32(QUAD_ATTRIBUTE, 2, glow::FLOAT, false, 8, 0);
            gl.enable_vertex_attrib_array(QUAD_ATTRIBUTE);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            let max_texture_slots = gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS).max(1) as u32;

            let version = gl.version();
            let alpha_test_supported = if version.is_embedded {
                false
            } else if (version.major, version.minor) < (3, 2) {
                true
            } else {
                let mask = gl.get_parameter_i32(glow::CONTEXT_PROFILE_MASK) as u32;
                mask & glow::CONTEXT_COMPATIBILITY_PROFILE_BIT != 0
            };

            engine_info!("postfx::gl", "OpenGL device ready: {} ({} texture units, alpha test {})",
                gl.get_parameter_string(glow::RENDERER),
                max_texture_slots,
                if alpha_test_supported { "available" } else { "unavailable" });

            Ok(Self {
                gl,
                textures: FxHashMap::default(),
                unit_targets: FxHashMap::default(),
                quad_vertex_array,
                quad_buffer,
                max_texture_slots,
                alpha_test_supported,
            })
        }
    }

    /// The wrapped context
    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Number of live textures created through this device
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn target_of(&self, texture: TextureHandle) -> u32 {
        self.textures
            .get(&texture)
            .map(|desc| texture_target(desc.dimension))
            .unwrap_or(glow::TEXTURE_2D)
    }
}

impl GraphicsDevice for GlGraphicsDevice {
    // ===== TEXTURES =====

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        let gl = &self.gl;
        let target = texture_target(desc.dimension);
        let format = texture_format_to_gl(desc.format);
        let height = match desc.dimension {
            TextureDimension::D1 => 1,
            _ => desc.height,
        };

        discard_gl_errors(gl, "create_texture");
        let texture = unsafe {
            let texture = gl.create_texture().map_err(|e| creation_error("texture", e))?;
            gl.bind_texture(target, Some(texture));
            gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter_to_gl(desc.filter) as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter_to_gl(desc.filter) as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap_to_gl(desc.wrap) as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap_to_gl(desc.wrap) as i32);

            if desc.dimension == TextureDimension::D3 {
                gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrap_to_gl(desc.wrap) as i32);
                gl.tex_image_3d(
                    target, 0, format.internal_format as i32,
                    gl_size(desc.width), gl_size(height), gl_size(desc.depth),
                    0, format.format, format.pixel_type, None,
                );
            } else {
                gl.tex_image_2d(
                    target, 0, format.internal_format as i32,
                    gl_size(desc.width), gl_size(height),
                    0, format.format, format.pixel_type, None,
                );
            }
            gl.bind_texture(target, None);

            if let Err(e) = check_gl_allocation(gl, "create_texture") {
                gl.delete_texture(texture);
                return Err(e);
            }
            texture
        };

        let handle = TextureHandle(texture.0.get());
        self.textures.insert(handle, *desc);
        engine_debug!("postfx::gl", "Created {}x{}x{} {} texture {}",
            desc.width, height, desc.depth, desc.format.storage_name(), handle.0);
        Ok(handle)
    }

    fn upload_texture(&mut self, texture: TextureHandle, desc: &TextureDesc, data: &[u8]) -> Result<()> {
        if data.len() != desc.byte_size() {
            return Err(Error::InvalidResource(format!(
                "Upload of {} bytes into texture {}, expected {}", data.len(), texture.0, desc.byte_size()
            )));
        }
        let Some(native) = native_texture(texture) else {
            return Err(Error::InvalidResource("Upload into the default texture".to_string()));
        };

        let gl = &self.gl;
        let target = self.target_of(texture);
        let format = texture_format_to_gl(desc.format);
        begin_gl_check(gl, "upload_texture");
        unsafe {
            gl.bind_texture(target, Some(native));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            if desc.dimension == TextureDimension::D3 {
                gl.tex_sub_image_3d(
                    target, 0, 0, 0, 0,
                    gl_size(desc.width), gl_size(desc.height), gl_size(desc.depth),
                    format.format, format.pixel_type, glow::PixelUnpackData::Slice(data),
                );
            } else {
                let height = if desc.dimension == TextureDimension::D1 { 1 } else { desc.height };
                gl.tex_sub_image_2d(
                    target, 0, 0, 0,
                    gl_size(desc.width), gl_size(height),
                    format.format, format.pixel_type, glow::PixelUnpackData::Slice(data),
                );
            }
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            gl.bind_texture(target, None);
        }
        check_gl_error(gl, "upload_texture")
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        // Host images are never deleted here
        if self.textures.remove(&texture).is_none() {
            return;
        }
        if let Some(native) = native_texture(texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        let framebuffer = unsafe { self.gl.create_framebuffer() }
            .map_err(|e| creation_error("framebuffer", e))?;
        Ok(FramebufferHandle(framebuffer.0.get()))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(native) = native_framebuffer(framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        let name = unsafe { self.gl.get_parameter_i32(framebuffer_binding_query(FRAMEBUFFER_TARGET)) };
        u32::try_from(name).ok().filter(|&n| n != 0).map(FramebufferHandle)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        unsafe {
            self.gl.bind_framebuffer(FRAMEBUFFER_TARGET, framebuffer.and_then(native_framebuffer));
        }
    }

    fn attach_color_target(&mut self, texture: TextureHandle) -> Result<()> {
        let gl = &self.gl;
        let status = unsafe {
            gl.framebuffer_texture_2d(
                FRAMEBUFFER_TARGET,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                native_texture(texture),
                0,
            );
            gl.check_framebuffer_status(FRAMEBUFFER_TARGET)
        };
        if status != glow::FRAMEBUFFER_COMPLETE {
            engine_bail!("postfx::gl", "Framebuffer with texture {} is {} (0x{:04X})",
                texture.0, framebuffer_status_name(status), status);
        }
        Ok(())
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl.viewport(viewport.x, viewport.y, gl_size(viewport.width), gl_size(viewport.height));
        }
    }

    // ===== GLOBAL STATE =====

    fn blend_state(&self) -> BlendState {
        let gl = &self.gl;
        unsafe {
            let equation = |pname| blend_equation_from_gl(gl.get_parameter_i32(pname) as u32).unwrap_or(BlendEquation::Add);
            let factor = |pname, default| blend_factor_from_gl(gl.get_parameter_i32(pname) as u32).unwrap_or(default);
            BlendState {
                enabled: gl.is_enabled(glow::BLEND),
                color_equation: equation(glow::BLEND_EQUATION_RGB),
                alpha_equation: equation(glow::BLEND_EQUATION_ALPHA),
                src_color: factor(glow::BLEND_SRC_RGB, BlendFactor::One),
                dst_color: factor(glow::BLEND_DST_RGB, BlendFactor::Zero),
                src_alpha: factor(glow::BLEND_SRC_ALPHA, BlendFactor::One),
                dst_alpha: factor(glow::BLEND_DST_ALPHA, BlendFactor::Zero),
            }
        }
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        let gl = &self.gl;
        unsafe {
            if state.enabled {
                gl.enable(glow::BLEND);
            } else {
                gl.disable(glow::BLEND);
            }
            gl.blend_equation_separate(
                blend_equation_to_gl(state.color_equation),
                blend_equation_to_gl(state.alpha_equation),
            );
            gl.blend_func_separate(
                blend_factor_to_gl(state.src_color),
                blend_factor_to_gl(state.dst_color),
                blend_factor_to_gl(state.src_alpha),
                blend_factor_to_gl(state.dst_alpha),
            );
        }
    }

    fn alpha_test_enabled(&self) -> bool {
        self.alpha_test_supported && unsafe { self.gl.is_enabled(ALPHA_TEST) }
    }

    fn set_alpha_test_enabled(&mut self, enabled: bool) {
        if !self.alpha_test_supported {
            return;
        }
        unsafe {
            if enabled {
                self.gl.enable(ALPHA_TEST);
            } else {
                self.gl.disable(ALPHA_TEST);
            }
        }
    }

    // ===== PROGRAMS =====

    fn create_program(&mut self, desc: &ShaderDesc<'_>) -> Result<ProgramHandle> {
        let gl = &self.gl;
        unsafe {
            let mut shaders = Vec::with_capacity(2);
            for (stage, kind, source) in [
                ("vertex", glow::VERTEX_SHADER, desc.vertex_source),
                ("fragment", glow::FRAGMENT_SHADER, desc.fragment_source),
            ] {
                let shader = gl.create_shader(kind).map_err(|e| creation_error("shader", e))?;
                gl.shader_source(shader, source);
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    for compiled in shaders {
                        gl.delete_shader(compiled);
                    }
                    engine_bail!("postfx::gl", "Shader '{}' {} stage failed to compile: {}",
                        desc.debug_name, stage, log.trim());
                }
                shaders.push(shader);
            }

            let program = match gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    for shader in shaders {
                        gl.delete_shader(shader);
                    }
                    return Err(creation_error("program", e));
                }
            };
            for &shader in &shaders {
                gl.attach_shader(program, shader);
            }
            gl.bind_attrib_location(program, QUAD_ATTRIBUTE, "aPos");
            gl.link_program(program);
            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(engine_err!("postfx::gl", "Shader '{}' failed to link: {}",
                    desc.debug_name, log.trim()));
            }

            Ok(ProgramHandle(program.0.get()))
        }
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if let Some(native) = native_program(program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        unsafe { self.gl.use_program(native_program(program)) };
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let native = native_program(program)?;
        unsafe { self.gl.get_uniform_location(native, name) }.map(|location| UniformLocation(location.0))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let gl = &self.gl;
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match *value {
                UniformValue::Float(x) => gl.uniform_1_f32(location, x),
                UniformValue::Vec2(v) => gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vec3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Int(x) => gl.uniform_1_i32(location, x),
                UniformValue::IVec2(v) => gl.uniform_2_i32(location, v.x, v.y),
                UniformValue::IVec3(v) => gl.uniform_3_i32(location, v.x, v.y, v.z),
                UniformValue::IVec4(v) => gl.uniform_4_i32(location, v.x, v.y, v.z, v.w),
                UniformValue::UInt(x) => gl.uniform_1_u32(location, x),
                UniformValue::UVec2(v) => gl.uniform_2_u32(location, v.x, v.y),
                UniformValue::UVec3(v) => gl.uniform_3_u32(location, v.x, v.y, v.z),
                UniformValue::UVec4(v) => gl.uniform_4_u32(location, v.x, v.y, v.z, v.w),
            }
        }
    }

    fn bind_texture(&mut self, slot: u32, texture: Option<TextureHandle>) {
        let target = match texture {
            Some(texture) => self.target_of(texture),
            None => self.unit_targets.get(&slot).copied().unwrap_or(glow::TEXTURE_2D),
        };
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + slot);
            self.gl.bind_texture(target, texture.and_then(native_texture));
            self.gl.active_texture(glow::TEXTURE0);
        }
        match texture {
            Some(_) => { self.unit_targets.insert(slot, target); }
            None => { self.unit_targets.remove(&slot); }
        }
    }

    // ===== DRAWING =====

    fn draw_fullscreen_quad(&mut self) -> Result<()> {
        let gl = &self.gl;
        begin_gl_check(gl, "draw_fullscreen_quad");
        unsafe {
            gl.bind_vertex_array(Some(self.quad_vertex_array));
            gl.draw_arrays(glow::TRIANGLES, 0, QUAD_VERTICES.len() as i32);
            gl.bind_vertex_array(None);
        }
        check_gl_error(gl, "draw_fullscreen_quad")
    }

    fn max_texture_slots(&self) -> u32 {
        self.max_texture_slots
    }
}

impl Drop for GlGraphicsDevice {
    fn drop(&mut self) {
        if !self.textures.is_empty() {
            engine_warn!("postfx::gl", "Dropping device with {} live textures", self.textures.len());
        }
        unsafe {
            for texture in self.textures.keys().copied().filter_map(native_texture) {
                self.gl.delete_texture(texture);
            }
            self.gl.delete_buffer(self.quad_buffer);
            self.gl.delete_vertex_array(self.quad_vertex_array);
        }
        self.textures.clear();
    }
}
