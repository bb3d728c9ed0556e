//! Logging infrastructure - structured tracing throughout the allocator
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log levels per module
//! - Zero-cost when disabled
//! - Span-based performance tracking
//! - Console or daily-rotated file output

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

pub use tracing::{debug, error, info, trace, warn};

/// Global logging state; holds the file writer guard so buffered lines get flushed
static LOGGER: OnceCell<Mutex<Option<WorkerGuard>>> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; console output when absent
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // GUEST_HEAP_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("GUEST_HEAP_LOG_LEVEL") {
            config.level = parse_level(&level_str);
        }

        // GUEST_HEAP_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("GUEST_HEAP_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("GUEST_HEAP_LOG_JSON").is_ok();
        config.show_spans = std::env::var("GUEST_HEAP_LOG_SPANS").is_ok();

        config
    }

    /// Create high-performance config (minimal logging)
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Create debug config (verbose logging)
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: Some("guest_heap.log".to_string()),
            json_format: false,
            show_spans: true,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging with default configuration
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration (first call wins)
pub fn init_with_config(config: LogConfig) {
    LOGGER.get_or_init(|| {
        let (writer, guard) = match &config.log_path {
            Some(path) => {
                let path = std::path::Path::new(path);
                let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty());
                let prefix = path
                    .file_name()
                    .map_or_else(|| "guest_heap.log".into(), |name| name.to_string_lossy());
                let appender =
                    tracing_appender::rolling::daily(directory.unwrap_or(std::path::Path::new(".")), prefix.as_ref());
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }
            None => (BoxMakeWriter::new(io::stdout), None),
        };

        // Ignore the error if another subscriber is already installed (tests, embedders)
        tracing_subscriber::registry()
            .with(build_layer(&config, writer))
            .try_init()
            .ok();

        Mutex::new(guard)
    });
}

fn build_layer(config: &LogConfig, writer: BoxMakeWriter) -> Box<dyn Layer<Registry> + Send + Sync> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("guest_heap={}", config.level.as_str().to_lowercase()))
    });

    let span_events = if config.show_spans {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_target(true)
        .with_thread_ids(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions));

    if config.json_format {
        layer.json().with_filter(env_filter).boxed()
    } else {
        layer.with_filter(env_filter).boxed()
    }
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

// ============================================================================
// Allocator-specific logging functions
// ============================================================================

/// Log an object coming into existence
#[inline]
pub fn log_allocation(class: &str, shape: &'static str) {
    trace!(
        target: "guest_heap::allocator",
        event = "allocation",
        class,
        shape,
        "object allocated"
    );
}

/// Log class initialization completing
#[inline]
pub fn log_class_initialized(class: &str) {
    debug!(
        target: "guest_heap::class",
        event = "class_initialized",
        class,
        "class initialized"
    );
}

/// Log a mirror whose module assignment waits for the core module
#[inline]
pub fn log_fixup_deferred(class: &str) {
    debug!(
        target: "guest_heap::mirror",
        event = "fixup_deferred",
        class,
        "module assignment deferred until core module is defined"
    );
}

/// Log the drain of the module fix-up list
#[inline]
pub fn log_fixups_resolved(count: usize) {
    info!(
        target: "guest_heap::mirror",
        event = "fixups_resolved",
        count,
        "core module defined, pending mirrors patched"
    );
}

/// Log a rejected allocation request (a guest exception, not a host error)
#[inline]
pub fn log_validation_failure(error: &crate::error::AllocationError) {
    debug!(
        target: "guest_heap::checks",
        event = "validation_failure",
        %error,
        exception = error.guest_exception().class_name(),
        "allocation precondition failed"
    );
}

/// Log runtime initialization
pub fn log_runtime_init() {
    info!(target: "guest_heap", event = "runtime_init", "guest heap initialized");
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
