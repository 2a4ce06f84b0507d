/// Shader registry - named shader programs owned by the Engine.
///
/// Passes hold non-owning `ShaderKey`s into this registry. Reloading a name
/// recompiles the program in place, so keys handed out earlier stay valid.
/// Each shader caches resolved uniform locations, both for typed pass inputs
/// and for free-form group uniform names.

use std::path::{Path, PathBuf};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, ProgramHandle, ShaderDesc, UniformLocation};
use crate::pass_graph::InputRef;
use super::builtin::PASS_VERTEX_SHADER;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a shader within a ShaderRegistry.
    ///
    /// Survives recompilation of the same name; invalidated by `remove`.
    pub struct ShaderKey;
}

// ===== SHADER SOURCE =====

/// Vertex + fragment GLSL sources
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }

    /// Fragment source linked against the built-in pass vertex shader
    pub fn pass(fragment: impl Into<String>) -> Self {
        Self::new(PASS_VERTEX_SHADER, fragment)
    }
}

// ===== SHADER =====

/// A compiled program plus its uniform location caches
#[derive(Debug)]
pub struct Shader {
    name: String,
    program: ProgramHandle,
    input_locations: FxHashMap<InputRef, Option<UniformLocation>>,
    named_locations: FxHashMap<String, Option<UniformLocation>>,
}

impl Shader {
    fn new(name: &str, program: ProgramHandle) -> Self {
        Self {
            name: name.to_string(),
            program,
            input_locations: FxHashMap::default(),
            named_locations: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Location of a typed pass input; the uniform name is only built on a cache miss
    pub fn input_location(
        &mut self,
        device: &dyn GraphicsDevice,
        input: InputRef,
        marker: char,
    ) -> Option<UniformLocation> {
        let program = self.program;
        *self.input_locations
            .entry(input)
            .or_insert_with(|| device.uniform_location(program, &input.uniform_name(marker)))
    }

    /// Location of a named uniform (`None` when the program does not declare it)
    pub fn uniform_location(&mut self, device: &dyn GraphicsDevice, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.named_locations.get(name) {
            return *location;
        }
        let location = device.uniform_location(self.program, name);
        self.named_locations.insert(name.to_string(), location);
        location
    }

    /// Number of cached lookups (hits and misses)
    pub fn cached_location_count(&self) -> usize {
        self.input_locations.len() + self.named_locations.len()
    }

    fn replace_program(&mut self, program: ProgramHandle) -> ProgramHandle {
        self.input_locations.clear();
        self.named_locations.clear();
        std::mem::replace(&mut self.program, program)
    }
}

// ===== MANIFEST =====

#[derive(Debug, Deserialize)]
struct ShaderManifest {
    shaders: Vec<ShaderManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ShaderManifestEntry {
    name: String,
    vertex: String,
    fragment: String,
}

// ===== REGISTRY =====

/// Name-keyed shader registry
#[derive(Debug, Default)]
pub struct ShaderRegistry {
    shaders: SlotMap<ShaderKey, Shader>,
    names: FxHashMap<String, ShaderKey>,
}

impl ShaderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a shader from vertex/fragment files
    ///
    /// Loading an existing name recompiles it in place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if a file cannot be read, or the device's
    /// error if compilation fails (the previous program is kept then).
    pub fn load(
        &mut self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ShaderKey> {
        let source = ShaderSource {
            vertex: read_source(vertex_path.as_ref())?,
            fragment: read_source(fragment_path.as_ref())?,
        };
        self.load_source(device, name, &source)
    }

    /// Compile a shader from in-memory sources
    pub fn load_source(
        &mut self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        source: &ShaderSource,
    ) -> Result<ShaderKey> {
        let program = device.create_program(&ShaderDesc {
            debug_name: name,
            vertex_source: &source.vertex,
            fragment_source: &source.fragment,
        })?;

        if let Some(&key) = self.names.get(name) {
            if let Some(shader) = self.shaders.get_mut(key) {
                let old = shader.replace_program(program);
                device.destroy_program(old);
                crate::engine_info!("postfx::ShaderRegistry", "Reloaded shader '{}'", name);
                return Ok(key);
            }
        }

        let key = self.shaders.insert(Shader::new(name, program));
        self.names.insert(name.to_string(), key);
        crate::engine_info!("postfx::ShaderRegistry", "Loaded shader '{}'", name);
        Ok(key)
    }

    /// Load a pass shader: only the fragment stage comes from disk
    ///
    /// Returns the existing key without recompiling when `name` is already loaded.
    pub fn load_pass_shader(
        &mut self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ShaderKey> {
        if let Some(key) = self.get(name) {
            return Ok(key);
        }
        let fragment = read_source(fragment_path.as_ref())?;
        self.load_source(device, name, &ShaderSource::pass(fragment))
    }

    /// Load every shader listed in a JSON manifest
    ///
    /// Manifest format: `{"shaders":[{"name":..,"vertex":..,"fragment":..}]}`
    /// with paths relative to the manifest's directory. Entries that fail to
    /// load are logged and skipped. Returns the number of shaders loaded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if the manifest cannot be read or parsed.
    pub fn load_list(&mut self, device: &mut dyn GraphicsDevice, manifest_path: impl AsRef<Path>) -> Result<usize> {
        let manifest_path = manifest_path.as_ref();
        let text = read_source(manifest_path)?;
        let manifest: ShaderManifest = serde_json::from_str(&text).map_err(|e| {
            let message = format!("Invalid shader manifest '{}': {}", manifest_path.display(), e);
            crate::engine_error!("postfx::ShaderRegistry", "{}", message);
            Error::InvalidResource(message)
        })?;

        let base = manifest_path.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);
        let mut loaded = 0;
        for entry in &manifest.shaders {
            match self.load(device, &entry.name, base.join(&entry.vertex), base.join(&entry.fragment)) {
                Ok(_) => loaded += 1,
                Err(e) => {
                    crate::engine_warn!("postfx::ShaderRegistry",
                        "Skipping shader '{}' from manifest: {}", entry.name, e);
                }
            }
        }
        Ok(loaded)
    }

    /// Key of a loaded shader
    pub fn get(&self, name: &str) -> Option<ShaderKey> {
        self.names.get(name).copied()
    }

    /// Shader by key
    pub fn shader(&self, key: ShaderKey) -> Option<&Shader> {
        self.shaders.get(key)
    }

    /// Mutable shader by key (location caches)
    pub fn shader_mut(&mut self, key: ShaderKey) -> Option<&mut Shader> {
        self.shaders.get_mut(key)
    }

    /// Remove a shader and destroy its program
    ///
    /// Returns false if `name` was not loaded.
    pub fn remove(&mut self, device: &mut dyn GraphicsDevice, name: &str) -> bool {
        let Some(key) = self.names.remove(name) else {
            return false;
        };
        if let Some(shader) = self.shaders.remove(key) {
            device.destroy_program(shader.program);
        }
        true
    }

    /// Remove every shader
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, shader) in self.shaders.drain() {
            device.destroy_program(shader.program);
        }
        self.names.clear();
    }

    /// Number of loaded shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Names of all loaded shaders
    pub fn names(&self) -> Vec<&str> {
        self.names.keys().map(|k| k.as_str()).collect()
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        let message = format!("Cannot read '{}': {}", path.display(), e);
        crate::engine_error!("postfx::ShaderRegistry", "{}", message);
        Error::InvalidResource(message)
    })
}

#[cfg(test)]
#[path = "shader_registry_tests.rs"]
mod tests;
