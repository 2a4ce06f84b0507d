/// OpenGL error checking - glGetError polling with per-code counters
///
/// Texture allocations always drain the GL error queue afterwards, so a
/// failed `glTexImage*` turns into an engine `Error` the pass can skip on.
/// With the `gl-error-checks` feature, uploads and draws are checked the
/// same way. Every checked operation first discards errors left in the
/// queue by earlier GL work, so they are not blamed on it.

use colored::*;
use postfx_engine::postfx::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::gl_format::gl_error_name;

/// Global error statistics (thread-safe atomic counters)
static GL_ERROR_STATS: GlErrorStatsTracker = GlErrorStatsTracker::new();

/// Counters per error class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlErrorStats {
    pub out_of_memory: u32,
    pub invalid_usage: u32,
    pub framebuffer: u32,
    pub other: u32,
}

impl GlErrorStats {
    pub fn total(&self) -> u32 {
        self.out_of_memory + self.invalid_usage + self.framebuffer + self.other
    }
}

struct GlErrorStatsTracker {
    out_of_memory: AtomicU32,
    invalid_usage: AtomicU32,
    framebuffer: AtomicU32,
    other: AtomicU32,
}

impl GlErrorStatsTracker {
    const fn new() -> Self {
        Self {
            out_of_memory: AtomicU32::new(0),
            invalid_usage: AtomicU32::new(0),
            framebuffer: AtomicU32::new(0),
            other: AtomicU32::new(0),
        }
    }

    fn record(&self, code: u32) {
        let counter = match code {
            glow::OUT_OF_MEMORY => &self.out_of_memory,
            glow::INVALID_ENUM | glow::INVALID_VALUE | glow::INVALID_OPERATION => &self.invalid_usage,
            glow::INVALID_FRAMEBUFFER_OPERATION => &self.framebuffer,
            _ => &self.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> GlErrorStats {
        GlErrorStats {
            out_of_memory: self.out_of_memory.load(Ordering::Relaxed),
            invalid_usage: self.invalid_usage.load(Ordering::Relaxed),
            framebuffer: self.framebuffer.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.out_of_memory.store(0, Ordering::Relaxed);
        self.invalid_usage.store(0, Ordering::Relaxed);
        self.framebuffer.store(0, Ordering::Relaxed);
        self.other.store(0, Ordering::Relaxed);
    }
}

/// Get the current GL error statistics
pub fn get_gl_error_stats() -> GlErrorStats {
    GL_ERROR_STATS.get_stats()
}

/// Reset the GL error statistics
pub fn reset_gl_error_stats() {
    GL_ERROR_STATS.reset();
}

/// Print a colored summary of the GL errors seen so far
pub fn print_gl_error_report() {
    let stats = get_gl_error_stats();
    println!("{}", "=== OpenGL error report ===".bold());
    if stats.total() == 0 {
        println!("  {}", "no errors".green());
        return;
    }
    println!("  out of memory:        {}", stats.out_of_memory.to_string().red());
    println!("  invalid usage:        {}", stats.invalid_usage.to_string().yellow());
    println!("  framebuffer:          {}", stats.framebuffer.to_string().yellow());
    println!("  other:                {}", stats.other.to_string().yellow());
}

/// Pop errors from `next_error` until it reports `GL_NO_ERROR`
///
/// Every popped code is counted; the first one is returned.
pub(crate) fn drain_errors(mut next_error: impl FnMut() -> u32) -> Option<u32> {
    let mut first = None;
    loop {
        let code = next_error();
        if code == glow::NO_ERROR {
            return first;
        }
        GL_ERROR_STATS.record(code);
        first.get_or_insert(code);
    }
}

/// Engine result for the first error raised by `operation`
pub(crate) fn error_result(first: Option<u32>, operation: &str) -> Result<()> {
    match first {
        None => Ok(()),
        Some(glow::OUT_OF_MEMORY) => {
            postfx_engine::engine_error!("postfx::gl", "{} failed: GL_OUT_OF_MEMORY", operation);
            Err(Error::OutOfMemory)
        }
        Some(code) => Err(postfx_engine::engine_err!("postfx::gl",
            "{} failed: {} (0x{:04X})", operation, gl_error_name(code), code)),
    }
}

fn drain_gl_errors(gl: &glow::Context) -> Option<u32> {
    use glow::HasContext;
    drain_errors(|| unsafe { gl.get_error() })
}

/// Discard errors raised before the operation about to be checked
pub(crate) fn discard_gl_errors(gl: &glow::Context, operation: &str) {
    if let Some(code) = drain_gl_errors(gl) {
        postfx_engine::engine_debug!("postfx::gl",
            "Discarding {} left in the error queue before {}", gl_error_name(code), operation);
    }
}

/// Drain the GL error queue after an allocation (always on)
pub(crate) fn check_gl_allocation(gl: &glow::Context, operation: &str) -> Result<()> {
    error_result(drain_gl_errors(gl), operation)
}

/// `discard_gl_errors` for operations only checked with `gl-error-checks`
#[cfg(feature = "gl-error-checks")]
pub(crate) fn begin_gl_check(gl: &glow::Context, operation: &str) {
    discard_gl_errors(gl, operation);
}

#[cfg(not(feature = "gl-error-checks"))]
#[inline(always)]
pub(crate) fn begin_gl_check(_gl: &glow::Context, _operation: &str) {}

/// Drain the GL error queue after `operation`
///
/// Returns `OutOfMemory` for `GL_OUT_OF_MEMORY`, a `BackendError` for
/// anything else, and `Ok` when the queue was empty.
#[cfg(feature = "gl-error-checks")]
pub(crate) fn check_gl_error(gl: &glow::Context, operation: &str) -> Result<()> {
    error_result(drain_gl_errors(gl), operation)
}

#[cfg(not(feature = "gl-error-checks"))]
#[inline(always)]
pub(crate) fn check_gl_error(_gl: &glow::Context, _operation: &str) -> Result<()> {
    Ok(())
}

/// Error for a failed GL object creation
pub(crate) fn creation_error(object: &str, reason: String) -> Error {
    postfx_engine::engine_error!("postfx::gl", "Cannot create {}: {}", object, reason);
    Error::BackendError(format!("Cannot create {}: {}", object, reason))
}

#[cfg(test)]
#[path = "gl_debug_tests.rs"]
mod tests;
