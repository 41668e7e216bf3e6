// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-facing responses
// - Catalog and save messages pass through verbatim
// - Logs errors for debugging

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, SaveError};

/// Standard error response for the command surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Resource not found (404)
    NotFound,

    /// Rejected before reaching the catalog (400)
    Validation,

    /// Domain invariant violation (422)
    DomainError,

    /// Catalog service error (502)
    ExternalService,

    /// Bad or unreadable configuration
    Configuration,

    /// Other/unknown error (500)
    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: String, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message,
            details,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::Domain(domain_error) => Self::new(
                ErrorType::DomainError,
                "Domain validation failed".to_string(),
                Some(domain_error.to_string()),
            ),

            AppError::Gateway(gateway_error) => {
                let error_type = match gateway_error.status {
                    Some(404) => ErrorType::NotFound,
                    _ => ErrorType::ExternalService,
                };
                let details = gateway_error.status.map(|s| format!("HTTP {}", s));
                Self::new(error_type, gateway_error.to_string(), details)
            }

            AppError::Save(save_error) => Self::from_save_error(save_error),

            AppError::Serialization(serde_error) => {
                error!("Serialization error: {:?}", serde_error);
                Self::new(
                    ErrorType::Internal,
                    "Data serialization failed".to_string(),
                    None,
                )
            }

            AppError::Io(io_error) => {
                error!("IO error: {:?}", io_error);
                Self::new(
                    ErrorType::Internal,
                    "File system operation failed".to_string(),
                    Some(io_error.to_string()),
                )
            }

            AppError::Config(message) => Self::new(
                ErrorType::Configuration,
                "Invalid configuration".to_string(),
                Some(message),
            ),
        }
    }

    /// The message is always the text shown to the user, verbatim
    pub fn from_save_error(error: SaveError) -> Self {
        let message = error.to_string();
        match error {
            SaveError::EmptyName => Self::new(ErrorType::Validation, message, None),
            SaveError::Blocked { rule, .. } => {
                Self::new(ErrorType::Validation, message, Some(rule))
            }
            SaveError::Persistence(_) => Self::new(ErrorType::ExternalService, message, None),
            SaveError::PowerEstimate { build_id, .. } => Self::new(
                ErrorType::ExternalService,
                message,
                Some(format!("Build {} was saved", build_id)),
            ),
        }
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, ErrorResponse>;
}

impl<T, E> ToErrorResponse<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn to_error_response(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| ErrorResponse::from_app_error(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    #[test]
    fn test_missing_catalog_row_is_not_found() {
        let error = ErrorResponse::from_app_error(AppError::Gateway(GatewayError::with_status(
            404,
            Some("Build not found".to_string()),
        )));
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "Build not found");
        assert_eq!(error.details.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn test_gateway_detail_is_verbatim() {
        let error = ErrorResponse::from_app_error(AppError::Gateway(GatewayError::with_status(
            409,
            Some("Build name already exists".to_string()),
        )));
        assert_eq!(error.error_type, ErrorType::ExternalService);
        assert_eq!(error.message, "Build name already exists");
        assert_eq!(error.details.as_deref(), Some("HTTP 409"));
    }

    #[test]
    fn test_blocked_save_is_validation() {
        let error = ErrorResponse::from_save_error(SaveError::Blocked {
            rule: "cpu×motherboard".to_string(),
            message: "Incompatible socket".to_string(),
        });
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.message, "Incompatible socket");
    }

    #[test]
    fn test_serialization() {
        let error = ErrorResponse::from_save_error(SaveError::EmptyName);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"error_type\":\"validation\""));
        assert!(json.contains("Please enter a name for your build."));
    }
}
