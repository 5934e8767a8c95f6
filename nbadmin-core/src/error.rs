//! Error types for console operations
//!
//! Every failure a route can observe maps onto one variant of
//! [`ConsoleError`]. Each variant carries:
//! - A human-readable message, shown to the operator as a flash message
//! - A stable error code for logging
//! - A category that decides how the server propagates it
//! - An HTTP status code for responses that abort the request cycle
//!
//! # Propagation
//!
//! | Category | Server behavior |
//! |---|---|
//! | `Validation`, `Rejected` | flash message on the next rendered page |
//! | `Authentication` | abort the cycle, answer with a re-authentication prompt |
//! | `Unavailable` | flash message, resource shown as "unknown" |
//! | `Internal` | `500` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for console operations
pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Form input missing or malformed (400)
    Validation,
    /// Credentials rejected by the token provider (401)
    Authentication,
    /// Resource Service refused the call (502)
    Rejected,
    /// Resource Service unreachable or timed out (503)
    Unavailable,
    /// Resource Service answered with an unexpected body (502)
    Format,
    /// Local failure (500)
    Internal,
}

/// Errors that can occur while proxying a request to the Resource Service
#[derive(Error, Debug)]
pub enum ConsoleError {
    // ═══════════════════════════════════════════════════════════════════════
    // Input errors (raised before any network call)
    // ═══════════════════════════════════════════════════════════════════════
    /// A required form field is absent or blank
    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    /// A form field is present but cannot be used
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Upstream errors (Token Provider and Resource Service)
    // ═══════════════════════════════════════════════════════════════════════
    /// Token provider rejected the credentials
    #[error("Authorization expired: {reason}. Re-authenticate with the CRM to continue.")]
    AuthExpired { reason: String },

    /// Resource Service returned a non-success status
    #[error("{operation} rejected by the CRM (HTTP {status}): {detail}")]
    UpstreamRejected {
        operation: String,
        status: u16,
        detail: String,
    },

    /// Network failure or timeout
    #[error("CRM unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// Response body did not match the expected shape
    #[error("Unexpected CRM response for {operation}: {reason}")]
    UpstreamFormat { operation: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════
    /// Session backend failed to load or store a value
    #[error("Session store error: {reason}")]
    Session { reason: String },

    /// Configuration is incomplete or malformed
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl ConsoleError {
    pub fn missing(field: &str) -> Self {
        ConsoleError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConsoleError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn format(operation: &str, reason: impl Into<String>) -> Self {
        ConsoleError::UpstreamFormat {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the error category used for propagation decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsoleError::MissingField { .. } | ConsoleError::InvalidField { .. } => {
                ErrorCategory::Validation
            }
            ConsoleError::AuthExpired { .. } => ErrorCategory::Authentication,
            ConsoleError::UpstreamRejected { .. } => ErrorCategory::Rejected,
            ConsoleError::UpstreamUnavailable { .. } => ErrorCategory::Unavailable,
            ConsoleError::UpstreamFormat { .. } => ErrorCategory::Format,
            ConsoleError::Session { .. } | ConsoleError::Config { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns true if this error came from form input
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Returns true if the request cycle must stop and ask for re-authentication
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ConsoleError::AuthExpired { .. })
    }

    /// Returns true if the error should be shown to the operator and the
    /// request allowed to finish with a redirect
    pub fn is_reportable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Validation
                | ErrorCategory::Rejected
                | ErrorCategory::Unavailable
                | ErrorCategory::Format
        )
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::MissingField { .. } => "MISSING_FIELD",
            ConsoleError::InvalidField { .. } => "INVALID_FIELD",
            ConsoleError::AuthExpired { .. } => "AUTH_EXPIRED",
            ConsoleError::UpstreamRejected { .. } => "UPSTREAM_REJECTED",
            ConsoleError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            ConsoleError::UpstreamFormat { .. } => "UPSTREAM_FORMAT_ERROR",
            ConsoleError::Session { .. } => "SESSION_ERROR",
            ConsoleError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::Authentication => 401,
            ErrorCategory::Rejected | ErrorCategory::Format => 502,
            ErrorCategory::Unavailable => 503,
            ErrorCategory::Internal => 500,
        }
    }

    /// Convert to a JSON error body
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "category": self.category(),
            }
        })
    }
}
