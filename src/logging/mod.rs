//! Structured logging for anonymization and attack runs
//!
//! Every run logs through `tracing` with a correlation ID so the grouping,
//! harmonization and linkage steps of one run can be followed together.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{Level, Span, debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

pub mod correlation;

/// Install the global subscriber.
///
/// Filtering comes from `RUST_LOG`. Calling this more than once is harmless.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_line_number(true)
                .with_file(true),
        )
        .try_init();
}

/// Log levels for the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Logging context for structured logging
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    /// Correlation ID for tracing related logs
    pub correlation_id: Option<String>,
    /// Operation that generated the log
    pub operation: Option<String>,
    /// Additional context as key-value pairs
    pub additional_context: BTreeMap<String, String>,
    /// Duration of the operation (if applicable)
    pub duration: Option<Duration>,
}

impl LogContext {
    /// Create a new log context bound to the current correlation ID
    pub fn new() -> Self {
        Self {
            correlation_id: correlation::get_correlation_id(),
            ..Default::default()
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.additional_context.insert(key.into(), value.to_string());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Create a tracing span from a log context
pub fn create_span(context: &LogContext) -> Span {
    let details = context
        .additional_context
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ");

    tracing::span!(
        Level::INFO,
        "kanon",
        correlation_id = %context.correlation_id.as_deref().unwrap_or("none"),
        operation = %context.operation.as_deref().unwrap_or("unknown"),
        duration_ms = context.duration.map(|d| d.as_millis() as u64).unwrap_or(0),
        details = %details,
    )
}

/// Log a message with the given level and context
pub fn log_with_context(level: LogLevel, message: &str, context: &LogContext) {
    let span = create_span(context);
    let _guard = span.enter();

    match level {
        LogLevel::Trace => trace!("{}", message),
        LogLevel::Debug => debug!("{}", message),
        LogLevel::Info => info!("{}", message),
        LogLevel::Warn => warn!("{}", message),
        LogLevel::Error => error!("{}", message),
    }
}

/// Times an operation and logs its start and end.
///
/// The end is logged when the logger is dropped.
pub struct OperationLogger {
    pub name: String,
    pub start_time: Instant,
    pub context: LogContext,
}

impl OperationLogger {
    /// Create a logger and log the start of the operation
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut context = LogContext::new().with_operation(name.clone());
        if context.correlation_id.is_none() {
            context.correlation_id = Some(correlation::get_or_generate_correlation_id());
        }

        let logger = Self {
            name,
            start_time: Instant::now(),
            context,
        };
        log_with_context(
            LogLevel::Info,
            &format!("Starting operation: {}", logger.name),
            &logger.context,
        );
        logger
    }

    /// Attach a key-value pair that is reported with every later message
    pub fn record(&mut self, key: impl Into<String>, value: impl ToString) {
        self.context.additional_context.insert(key.into(), value.to_string());
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        let context = self.context.clone().with_duration(self.start_time.elapsed());
        log_with_context(level, message, &context);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
}

impl Drop for OperationLogger {
    fn drop(&mut self) {
        let duration = self.start_time.elapsed();
        let context = self.context.clone().with_duration(duration);
        log_with_context(
            LogLevel::Info,
            &format!("Completed operation: {} in {:?}", self.name, duration),
            &context,
        );
    }
}

/// Macro to time and log an operation under a fresh correlation ID
#[macro_export]
macro_rules! log_operation_with_correlation {
    ($name:expr, $logger:ident, $body:block) => {{
        $crate::logging::correlation::with_new_correlation_id(|| {
            #[allow(unused_mut)]
            let mut $logger = $crate::logging::OperationLogger::start($name);
            $body
        })
    }};
}
