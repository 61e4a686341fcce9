//! Unified error handling system
//!
//! Structured error types with context and recovery suggestions. The two
//! classes the client tells apart are `Network` (transport failures and 5xx)
//! and `Authentication` (server-reported credential or registration problems).
//! Form constraints never reach this type; the client checks them first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

pub type DeskResult<T> = Result<T, DeskError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
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

/// Main error type for the agentdesk client
#[derive(Error, Debug)]
pub enum DeskError {
    /// Transport failure, unreachable server or a 5xx answer
    #[error("Network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// The server rejected the request (bad credentials, duplicate account, 4xx)
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeskError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DeskError::Network { context, .. } => Some(context),
            DeskError::Authentication { context, .. } => Some(context),
            DeskError::Config { context, .. } => Some(context),
            DeskError::Storage { context, .. } => Some(context),
            DeskError::NotFound { context, .. } => Some(context),
            DeskError::Io(_) | DeskError::Serialization(_) => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, DeskError::Network { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, DeskError::Authentication { .. })
    }

    /// HTTP status attached to the failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            DeskError::Network { status, .. } | DeskError::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    /// Message reported by the server for an authentication failure.
    ///
    /// This is what a login or register form shows verbatim; every other
    /// class of error returns `None` so callers fall back to a generic text.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            DeskError::Authentication { message, .. } if !message.is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            DeskError::Network { .. } => true,
            DeskError::Authentication { .. } => false,
            DeskError::Config { .. } => false,
            DeskError::NotFound { .. } => false,
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            DeskError::Storage { .. } => {
                error!(error_id = ?error_id, error = %self, "Storage error occurred");
            }
            DeskError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            DeskError::Network { .. } => {
                warn!(error_id = ?error_id, error = %self, "Network error (may be recoverable)");
            }
            DeskError::Authentication { .. } => {
                debug!(error_id = ?error_id, error = %self, "Request rejected");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! network_error {
    ($msg:expr, $component:expr) => {
        $crate::DeskError::Network {
            message: $msg.to_string(),
            status: None,
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check network connectivity and API status"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::DeskError::Network {
            message: $msg.to_string(),
            status: None,
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check network connectivity and API status"),
        }
    };
}

#[macro_export]
macro_rules! auth_error {
    ($msg:expr, $status:expr, $component:expr) => {
        $crate::DeskError::Authentication {
            message: $msg.to_string(),
            status: $status,
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::DeskError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'agentdesk config --init' to create default config"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_only_for_auth_errors() {
        let rejected = auth_error!("Invalid credentials", Some(401), "test");
        assert_eq!(rejected.server_message(), Some("Invalid credentials"));
        assert_eq!(rejected.status(), Some(401));
        assert!(rejected.is_auth());

        let offline = network_error!("connection refused", "test");
        assert_eq!(offline.server_message(), None);
        assert!(offline.is_network());
        assert!(offline.is_recoverable());

        let blank = auth_error!("", Some(409), "test");
        assert_eq!(blank.server_message(), None);
    }

    #[test]
    fn io_errors_carry_no_context() {
        let err = DeskError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.context().is_none());
        assert!(!err.is_recoverable());
    }
}
