//! Error types shared by every sessionscope crate
//!
//! Every failure the pipeline can surface is one of four request outcomes
//! (access denied, not found, retrieval failure, invariant violation) plus the
//! infrastructure errors of the ambient stack. Each carries an [`ErrorContext`]
//! so a logged error can be correlated with the response the caller saw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type ScopeResult<T> = Result<T, ScopeError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Correlates a logged error with what the caller saw
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    /// Pipeline stage or subsystem that raised the error
    pub component: String,
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// How an error is presented to whoever made the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSurface {
    AccessDenied,
    NotFound,
    ServerError,
}

impl std::fmt::Display for ErrorSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSurface::AccessDenied => write!(f, "access denied"),
            ErrorSurface::NotFound => write!(f, "not found"),
            ErrorSurface::ServerError => write!(f, "server error"),
        }
    }
}

/// Main error type for sessionscope
#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Retrieval failed: {message}")]
    RetrievalFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Invariant violated: {message}")]
    InvariantViolation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScopeError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ScopeError::Unauthorized { context, .. } => Some(context),
            ScopeError::NotFound { context, .. } => Some(context),
            ScopeError::RetrievalFailure { context, .. } => Some(context),
            ScopeError::InvariantViolation { context, .. } => Some(context),
            ScopeError::Config { context, .. } => Some(context),
            ScopeError::Io(_) | ScopeError::Serialization(_) => None,
        }
    }

    /// Map the error onto the response class the caller receives
    pub fn surface(&self) -> ErrorSurface {
        match self {
            ScopeError::Unauthorized { .. } => ErrorSurface::AccessDenied,
            ScopeError::NotFound { .. } => ErrorSurface::NotFound,
            _ => ErrorSurface::ServerError,
        }
    }

    /// Only backend failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScopeError::RetrievalFailure { .. })
    }

    /// Log at error level for server faults, warn for rejected requests
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            ScopeError::InvariantViolation { .. } => {
                error!(error_id = ?error_id, error = %self, "Invariant violation detected");
            }
            ScopeError::RetrievalFailure { .. } => {
                error!(error_id = ?error_id, error = %self, "Backend retrieval failed");
            }
            ScopeError::Unauthorized { .. } | ScopeError::NotFound { .. } => {
                warn!(error_id = ?error_id, error = %self, "Request rejected");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Constructors that attach an `ErrorContext` for the given component
#[macro_export]
macro_rules! unauthorized_error {
    ($msg:expr, $component:expr) => {
        $crate::ScopeError::Unauthorized {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::ScopeError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the course identifier is correct"),
        }
    };
}

#[macro_export]
macro_rules! retrieval_error {
    ($msg:expr, $component:expr) => {
        $crate::ScopeError::RetrievalFailure {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ScopeError::RetrievalFailure {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! invariant_error {
    ($msg:expr, $component:expr) => {
        $crate::ScopeError::InvariantViolation {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::ScopeError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'sessionscope config --init <path>' to write a default config"),
        }
    };
}
