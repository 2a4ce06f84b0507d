//! Internal logging system for the PostFX engine
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error) with a global minimum level
//! - Colored console output by default
//! - Thread-safe logging with RwLock
//! - File and line information for detailed ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to route engine diagnostics somewhere else
/// (file, in-game console, test capture, ...).
///
/// # Example
///
/// ```no_run
/// use postfx_engine::postfx::log::{Logger, LogEntry};
///
/// struct ConsoleOverlay;
///
/// impl Logger for ConsoleOverlay {
///     fn log(&self, entry: &LogEntry) {
///         // Push to the overlay...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "postfx::Pipeline", "postfx::gl")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame details (pass execution, binding slots)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (critical issues with file:line details)
    Error,
}

impl LogSeverity {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (per-frame details, filtered out by default)
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_trace;
/// engine_trace!("postfx::Group", "Rendering pass {}", 2);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        if $crate::postfx::Engine::log_enabled($crate::postfx::log::LogSeverity::Trace) {
            $crate::postfx::Engine::log(
                $crate::postfx::log::LogSeverity::Trace,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log a DEBUG message (development information)
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_debug;
/// engine_debug!("postfx::Engine", "Populated {} groups", 3);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        if $crate::postfx::Engine::log_enabled($crate::postfx::log::LogSeverity::Debug) {
            $crate::postfx::Engine::log(
                $crate::postfx::log::LogSeverity::Debug,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_info;
/// engine_info!("postfx::ShaderRegistry", "Loaded shader '{}'", "bloom");
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        if $crate::postfx::Engine::log_enabled($crate::postfx::log::LogSeverity::Info) {
            $crate::postfx::Engine::log(
                $crate::postfx::log::LogSeverity::Info,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log a WARN message (potential issues)
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_warn;
/// engine_warn!("postfx::Pass", "Ran out of texture slots at {}", 32);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        if $crate::postfx::Engine::log_enabled($crate::postfx::log::LogSeverity::Warn) {
            $crate::postfx::Engine::log(
                $crate::postfx::log::LogSeverity::Warn,
                $source,
                format!($($arg)*)
            )
        }
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_error;
/// engine_error!("postfx::RenderTarget", "Allocation failed: {}", "out of memory");
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::postfx::Engine::log_detailed(
            $crate::postfx::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
