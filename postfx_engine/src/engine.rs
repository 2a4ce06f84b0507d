/// PostFX Engine - explicit context owning the device, shaders and host side table
///
/// One `Engine` is created per graphics context. It owns the backend device,
/// the shader registry and the per-host attachment records, and drives the
/// host lifecycle (initialize / render / destroy). Only the logger is global.

use std::path::Path;
use std::sync::{OnceLock, RwLock};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::SystemTime;
use crate::error::{Result, Error};
use crate::graphics_device::GraphicsDevice;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::pass_graph::{Pipeline, PipelineOutput, FrameContext};
use crate::shader::{ShaderKey, ShaderRegistry, ShaderSource};
use crate::shader::builtin::{PASS_VERTEX_SHADER, COMPOSITE_FRAGMENT_SHADER};
use crate::target::{TargetManager, HostTargetId, HostSurface, HostState, InitCallback, InitContext};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogSeverity::Debug as u8);

// ===== CONFIGURATION =====

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Registry name of the built-in compositing shader
    pub composite_shader: String,
    /// Character repeated per group of distance in earlier-group uniform names
    pub group_marker: char,
    /// Clear color of every pass target
    pub clear_color: [f32; 4],
    /// Texture slot limit per pass (`None` = ask the device)
    pub max_texture_slots: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            composite_shader: "postShader".to_string(),
            group_marker: 'p',
            clear_color: [0.0, 0.0, 0.0, 0.0],
            max_texture_slots: None,
        }
    }
}

// ===== ENGINE =====

/// Main engine context
///
/// # Example
///
/// ```no_run
/// use postfx_engine::postfx::{Engine, Config};
/// use postfx_engine::postfx::target::{HostTargetId, HostSurface, InitCallback, InitContext};
/// use postfx_engine::postfx::pass_graph::{Group, Pass};
/// # fn device() -> Box<dyn postfx_engine::postfx::GraphicsDevice> { unimplemented!() }
///
/// fn bloom(ctx: &mut InitContext<'_>) {
///     if let Ok(shader) = ctx.load_pass_shader("bloom", "shaders/bloom.frag") {
///         ctx.push_group(Group::new().with_pass(Pass::new(shader).with_divisor(2)));
///     }
/// }
///
/// let mut engine = Engine::new(device(), Config::default())?;
/// let host = HostTargetId(1);
/// engine.attach(host, InitCallback::function(bloom));
/// # let surface: HostSurface = unimplemented!();
/// engine.initialize_host(host, surface);
/// let output = engine.render_host(host)?;
/// # Ok::<(), postfx_engine::postfx::Error>(())
/// ```
pub struct Engine {
    device: Box<dyn GraphicsDevice>,
    config: Config,
    shaders: ShaderRegistry,
    targets: TargetManager,
}

impl Engine {
    /// Create an engine on top of a backend device
    ///
    /// Registers the built-in compositing shader under `config.composite_shader`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the compositing shader cannot be built.
    pub fn new(device: Box<dyn GraphicsDevice>, config: Config) -> Result<Self> {
        let mut engine = Self {
            device,
            config,
            shaders: ShaderRegistry::new(),
            targets: TargetManager::new(),
        };

        let composite = ShaderSource::new(PASS_VERTEX_SHADER, COMPOSITE_FRAGMENT_SHADER);
        if let Err(e) = engine.shaders.load_source(engine.device.as_mut(), &engine.config.composite_shader, &composite) {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                format!("Cannot build compositing shader '{}': {}", engine.config.composite_shader, e)
            )));
        }

        crate::engine_info!("postfx::Engine", "Engine initialized");
        Ok(engine)
    }

    /// Create an engine with the default configuration
    pub fn with_device<D: GraphicsDevice + 'static>(device: D) -> Result<Self> {
        Self::new(Box::new(device), Config::default())
    }

    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("postfx::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("postfx::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    pub fn shaders_mut(&mut self) -> &mut ShaderRegistry {
        &mut self.shaders
    }

    pub fn targets(&self) -> &TargetManager {
        &self.targets
    }

    // ===== SHADERS =====

    /// See `ShaderRegistry::load`
    pub fn load_shader(
        &mut self,
        name: &str,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ShaderKey> {
        self.shaders.load(self.device.as_mut(), name, vertex_path, fragment_path)
    }

    /// See `ShaderRegistry::load_source`
    pub fn load_shader_source(&mut self, name: &str, source: &ShaderSource) -> Result<ShaderKey> {
        self.shaders.load_source(self.device.as_mut(), name, source)
    }

    /// See `ShaderRegistry::load_pass_shader`
    pub fn load_pass_shader(&mut self, name: &str, fragment_path: impl AsRef<Path>) -> Result<ShaderKey> {
        self.shaders.load_pass_shader(self.device.as_mut(), name, fragment_path)
    }

    /// See `ShaderRegistry::load_list`
    pub fn load_shader_list(&mut self, manifest_path: impl AsRef<Path>) -> Result<usize> {
        self.shaders.load_list(self.device.as_mut(), manifest_path)
    }

    pub fn shader(&self, name: &str) -> Option<ShaderKey> {
        self.shaders.get(name)
    }

    // ===== HOST LIFECYCLE =====

    /// Register an init callback for a host
    ///
    /// Returns false when the identical callback is already registered.
    pub fn attach(&mut self, host: HostTargetId, callback: impl Into<InitCallback>) -> bool {
        self.targets.attach(host, callback.into())
    }

    /// Unregister an init callback; the host keeps its current pipeline
    pub fn detach(&mut self, host: HostTargetId, callback: &InitCallback) -> bool {
        self.targets.detach(host, callback)
    }

    /// (Re)initialize a host: rebuild its pipeline from its callbacks
    ///
    /// Releases the previous pipeline, records `surface`, then runs every
    /// callback once in registration order against an empty group list.
    /// Returns false (and does nothing) for hosts without an attachment record.
    pub fn initialize_host(&mut self, host: HostTargetId, surface: HostSurface) -> bool {
        let Some(record) = self.targets.record_mut(host) else {
            crate::engine_debug!("postfx::Engine", "Host {} has no attachment, ignoring init", host.0);
            return false;
        };

        record.pipeline.clear(self.device.as_mut());
        record.surface = Some(surface);

        let mut ctx = InitContext {
            surface,
            groups: record.pipeline.groups_mut(),
            shaders: &mut self.shaders,
            device: self.device.as_mut(),
        };
        for callback in &record.callbacks {
            callback.call(&mut ctx);
        }

        record.state = HostState::Populated;
        crate::engine_debug!("postfx::Engine",
            "Host {} initialized at {}x{} with {} groups ({} callbacks)",
            host.0, surface.width, surface.height, record.pipeline.len(), record.callbacks.len());
        true
    }

    /// Render a host's pipeline and composite the result
    ///
    /// Returns `Ok(None)` for hosts that are not attached or not populated;
    /// such hosts present on their own.
    pub fn render_host(&mut self, host: HostTargetId) -> Result<Option<PipelineOutput>> {
        let Some(record) = self.targets.record_mut(host) else {
            return Ok(None);
        };
        if record.state != HostState::Populated {
            return Ok(None);
        }
        let Some(surface) = record.surface else {
            return Ok(None);
        };

        let mut frame = FrameContext::new(self.device.as_mut(), &mut self.shaders, &self.config, surface);
        record.pipeline.render(&mut frame).map(Some)
    }

    /// Release a host's pipeline and drop its record
    ///
    /// Returns false for hosts without an attachment record.
    pub fn destroy_host(&mut self, host: HostTargetId) -> bool {
        let Some(mut record) = self.targets.remove(host) else {
            return false;
        };
        record.destroy(self.device.as_mut());
        crate::engine_debug!("postfx::Engine", "Host {} destroyed", host.0);
        true
    }

    /// Lifecycle state of a host (`None` when not attached)
    pub fn host_state(&self, host: HostTargetId) -> Option<HostState> {
        self.targets.record(host).map(|r| r.state)
    }

    /// Pipeline of a host
    pub fn pipeline(&self, host: HostTargetId) -> Option<&Pipeline> {
        self.targets.record(host).map(|r| &r.pipeline)
    }

    pub fn pipeline_mut(&mut self, host: HostTargetId) -> Option<&mut Pipeline> {
        self.targets.record_mut(host).map(|r| &mut r.pipeline)
    }

    /// Release every host and shader
    ///
    /// Also called on drop. The engine stays usable but empty; the
    /// compositing shader has to be reloaded before rendering again.
    pub fn shutdown(&mut self) {
        if self.targets.host_count() == 0 && self.shaders.is_empty() {
            return;
        }
        self.targets.clear(self.device.as_mut());
        self.shaders.clear(self.device.as_mut());
        crate::engine_info!("postfx::Engine", "Engine shut down");
    }

    // ===== LOGGING =====

    /// Set a custom logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use postfx_engine::postfx::Engine;
    /// use postfx_engine::postfx::log::{Logger, LogEntry};
    ///
    /// struct MyLogger;
    /// impl Logger for MyLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         println!("[{}] {}", entry.source, entry.message);
    ///     }
    /// }
    ///
    /// Engine::set_logger(MyLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Set the minimum severity forwarded to the logger (Error is always forwarded)
    pub fn set_log_level(level: LogSeverity) {
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    pub fn log_level() -> LogSeverity {
        LogSeverity::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
    }

    /// Whether a message of `severity` passes the minimum level
    pub fn log_enabled(severity: LogSeverity) -> bool {
        severity >= Self::log_level()
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
