//! # API Error Type
//!
//! Unified error type for bridge commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Cambio                                 │
//! │                                                                         │
//! │  Rendering layer              Bridge                                    │
//! │  ───────────────              ──────                                    │
//! │                                                                         │
//! │  {"id":7,"command":"add_item",...}                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad input? ────── CoreError::Validation ──────┐                 │  │
//! │  │         │                                       │                │  │
//! │  │         ▼                                       ▼                │  │
//! │  │  Stale id? ─────── CoreError::*NotFound ───── ApiError ─────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  {"id":7,"ok":false,"error":{"code":"VALIDATION_ERROR",                 │
//! │                              "message":"name is required"}}             │
//! │  → shown to the user in a blocking dialog                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cambio_core::{CoreError, ValidationError};
use serde::Serialize;

/// API error returned from bridge commands.
///
/// ## Serialization
/// This is what the rendering layer receives when a command fails:
/// ```json
/// {
///   "code": "EMPTY_BUDGET",
///   "message": "There are no items in the current budget to create a partial total"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Partial total requested with no current items
    EmptyBudget,

    /// Item or partial total id does not exist
    NotFound,

    /// The request line could not be understood
    InvalidRequest,

    /// Unexpected failure inside the bridge
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidRequest, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            e if e.is_not_found() => ErrorCode::NotFound,
            CoreError::EmptyBudget => ErrorCode::EmptyBudget,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            _ => ErrorCode::Internal,
        };

        match err {
            CoreError::Validation(e) => ApiError::from(e),
            other => ApiError::new(code, other.to_string()),
        }
    }
}

/// Converts form validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Response serialization failed: {}", err);
        ApiError::internal("Failed to serialize response")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use cambio_core::{ItemId, ItemScope, PartialTotalId, ValidationError};

    #[test]
    fn test_core_error_codes() {
        assert_eq!(ApiError::from(CoreError::EmptyBudget).code, ErrorCode::EmptyBudget);
        assert_eq!(
            ApiError::from(CoreError::PartialTotalNotFound(PartialTotalId(3))).code,
            ErrorCode::NotFound
        );
        assert_eq!(
            ApiError::from(CoreError::ItemNotFound {
                item_id: ItemId(1),
                scope: ItemScope::Uncommitted,
            })
            .code,
            ErrorCode::NotFound
        );
    }

    #[test]
    fn test_exhausted_ids_are_internal() {
        assert_eq!(ApiError::from(CoreError::IdsExhausted).code, ErrorCode::Internal);
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let err = ApiError::from(CoreError::Validation(ValidationError::NoValidPrice));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Enter a valid price in USD or VES");
    }

    #[test]
    fn test_form_validation_error() {
        let err = ApiError::from(ValidationError::Required {
            field: "quantity".into(),
        });
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("quantity"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::invalid_request("bad line")).unwrap();
        assert_eq!(json["code"], "INVALID_REQUEST");
        assert_eq!(json["message"], "bad line");
    }
}
