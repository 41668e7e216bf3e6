// src/error/types.rs
use crate::domain::{BuildId, DomainError};
use serde::Serialize;
use thiserror::Error;

/// Fallback shown when the catalog gives no detail
pub const UNKNOWN_ERROR_DETAIL: &str = "An unknown error occurred.";

/// Failure reported by the catalog gateway
///
/// Carries the catalog's human-readable detail when it sent one. The core
/// never branches on the status code; it is kept for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct GatewayError {
    pub detail: Option<String>,
    pub status: Option<u16>,
}

impl GatewayError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            status: None,
        }
    }

    pub fn with_status(status: u16, detail: Option<String>) -> Self {
        Self {
            detail,
            status: Some(status),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::new(format!("Catalog request failed: {}", err))
    }

    pub fn detail_or_default(&self) -> &str {
        self.detail.as_deref().unwrap_or(UNKNOWN_ERROR_DETAIL)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail_or_default())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Why a save did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("Please enter a name for your build.")]
    EmptyName,

    /// Displays the evaluator's message verbatim
    #[error("{message}")]
    Blocked { rule: String, message: String },

    #[error("{0}")]
    Persistence(GatewayError),

    /// The build was stored but the server estimate failed
    #[error("{detail}")]
    PowerEstimate { build_id: BuildId, detail: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Save(#[from] SaveError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Gateway(GatewayError::transport(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_shows_detail_verbatim() {
        let err = GatewayError::with_status(400, Some("PSU wattage too low for GPU".to_string()));
        assert_eq!(err.to_string(), "PSU wattage too low for GPU");
    }

    #[test]
    fn test_gateway_error_without_detail() {
        let err = GatewayError::with_status(500, None);
        assert_eq!(err.to_string(), UNKNOWN_ERROR_DETAIL);
    }

    #[test]
    fn test_blocked_save_displays_message_only() {
        let err = SaveError::Blocked {
            rule: "cpu×motherboard".to_string(),
            message: "Incompatible socket".to_string(),
        };
        assert_eq!(err.to_string(), "Incompatible socket");
        assert_eq!(AppError::from(err).to_string(), "Incompatible socket");
    }
}
