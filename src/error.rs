use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

macro_rules! from_err {
    ($err:ty, $variant:ident) => {
        impl From<$err> for AppError {
            fn from(e: $err) -> Self {
                AppError::$variant(e.to_string())
            }
        }
    };
}

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// The run cannot start
    Fatal,
    /// Errors that should be fixed before the next run
    #[default]
    Error,
    /// Warnings that don't prevent the run from completing
    Warning,
}

/// Error category for classification in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad input handed to an operation
    Validation,
    /// Bad run configuration
    Configuration,
    /// Malformed serialized input
    Serialization,
    /// Errors that don't fit into other categories
    #[default]
    Other,
}

/// Error context for enriching errors with additional information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique identifier for the error
    pub error_id: Uuid,
    /// Correlation ID of the run that failed
    pub correlation_id: Option<String>,
    /// Error severity
    pub severity: ErrorSeverity,
    /// Error category
    pub category: ErrorCategory,
    /// Source of the error (file:line)
    pub source_location: Option<String>,
    /// Operation that caused the error
    pub operation: Option<String>,
    /// Additional context as key-value pairs
    pub additional_context: HashMap<String, String>,
    /// Timestamp when the error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    /// Create a new error context, picking up the current correlation ID
    pub fn new() -> Self {
        Self {
            error_id: Uuid::new_v4(),
            correlation_id: crate::logging::correlation::get_correlation_id(),
            timestamp: chrono::Utc::now(),
            ..Default::default()
        }
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_source_location(mut self, file: &str, line: u32) -> Self {
        self.source_location = Some(format!("{}:{}", file, line));
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add additional context
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_context.insert(key.into(), value.into());
        self
    }
}

/// Crate error type
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AppError {
    #[error("Invalid k: {0} (k must be a positive integer)")]
    InvalidK(usize),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Invalid JSON payload: {0}")]
    JsonError(String),

    // Contextual error with additional information
    #[error("{message}")]
    ContextualError {
        message: String,
        context: ErrorContext,
    },
}

from_err!(serde_json::Error, JsonError);

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidK(_) | Self::ValidationError(_) => ErrorCategory::Validation,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::ContextualError { context, .. } => context.category,
        }
    }

    /// Get the error severity for this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidK(_) | Self::ConfigurationError(_) => ErrorSeverity::Fatal,
            Self::ValidationError(_) => ErrorSeverity::Warning,
            Self::ContextualError { context, .. } => context.severity,
            _ => ErrorSeverity::Error,
        }
    }

    /// Enrich this error with context
    pub fn enrich(&self, context_builder: impl FnOnce(ErrorContext) -> ErrorContext) -> Self {
        match self {
            Self::ContextualError { message, context } => Self::ContextualError {
                message: message.clone(),
                context: context_builder(context.clone()),
            },
            _ => {
                let context = context_builder(
                    ErrorContext::new()
                        .with_category(self.category())
                        .with_severity(self.severity()),
                );
                Self::ContextualError {
                    message: self.to_string(),
                    context,
                }
            }
        }
    }

    /// Log this error with structured logging
    pub fn log(&self) {
        match self {
            Self::ContextualError { message, context } => {
                let span = tracing::error_span!(
                    "error",
                    error_id = %context.error_id,
                    severity = ?context.severity,
                    category = ?context.category,
                    correlation_id = %context.correlation_id.as_deref().unwrap_or("none"),
                    source_location = %context.source_location.as_deref().unwrap_or("unknown"),
                    operation = %context.operation.as_deref().unwrap_or("unknown"),
                    timestamp = %context.timestamp,
                );
                let _guard = span.enter();
                for (key, value) in &context.additional_context {
                    tracing::error!(key = %key, value = %value, "error context");
                }
                tracing::error!("{}", message);
            }
            _ => {
                tracing::error!(
                    severity = ?self.severity(),
                    category = ?self.category(),
                    "{}", self
                );
            }
        }
    }
}

/// Macro to enrich an error with source location
#[macro_export]
macro_rules! enrich_error {
    ($err:expr, $($context:tt)*) => {{
        $err.enrich(|ctx| {
            ctx.with_source_location(file!(), line!())
            $($context)*
        })
    }};
}

/// Macro to log an error with source location
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {{
        let err = $crate::enrich_error!($err, );
        err.log();
        err
    }};
    ($err:expr, $($context:tt)*) => {{
        let err = $crate::enrich_error!($err, $($context)*);
        err.log();
        err
    }};
}

pub type Result<T, E = AppError> = core::result::Result<T, E>;
