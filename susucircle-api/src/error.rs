/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the
/// appropriate status code. The domain taxonomy maps as:
///
/// - validation errors → 400 / 422, rejected before any state change
/// - state conflicts (full group, illegal transition, lapsed invitation) → 409
/// - authorization failures (not admin, not inviter) → 403
/// - missing entities → 404
/// - store integrity violations and unexpected failures → 500
/// - identity-provider outage → 503
///
/// Raw unique-constraint violations from the store are translated into the
/// equivalent conflict rather than leaking as storage failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use susucircle_shared::auth::identity::IdentityError;
use susucircle_shared::groups::GroupError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - business-rule violation
    Conflict(String),

    /// Unprocessable entity (422) - field-level validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "conflict", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique-constraint names are sniffed so a duplicate email/phone/username
/// or invitation code surfaces as the conflict it is.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already registered".to_string());
                    }
                    if constraint.contains("phone") {
                        return ApiError::Conflict("Phone number already registered".to_string());
                    }
                    if constraint.contains("username") {
                        return ApiError::Conflict("Username already taken".to_string());
                    }
                    if constraint.contains("code") {
                        return ApiError::Conflict("Invitation code already exists".to_string());
                    }
                    if constraint.contains("group_id_user_id") {
                        return ApiError::Conflict("Already a member of this group".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert domain errors to API errors
impl From<GroupError> for ApiError {
    fn from(err: GroupError) -> Self {
        use GroupError::*;

        match err {
            // not found
            GroupNotFound(_) | UserNotFound(_) | MembershipNotFound(_) | InvitationNotFound(_)
            | InvalidCode => ApiError::NotFound(err.to_string()),

            // authorization
            NotAdmin | NotAuthorized | CreatorCannotLeave | CannotRemoveCreator => {
                ApiError::Forbidden(err.to_string())
            }

            // state conflicts
            InvalidTransition { .. }
            | GroupNotJoinable(_)
            | GroupFull { .. }
            | AlreadyMember
            | NotMember
            | GroupAlreadyActive(_)
            | InvitationExpired
            | InvitationNotPending
            | GroupNotCollecting(_)
            | AlreadyContributed => ApiError::Conflict(err.to_string()),

            // validation
            InvalidCycleSize(_) | InvalidAmount(_) | WrongContributionAmount { .. }
            | MissingContact | InvalidTtl(_) => ApiError::BadRequest(err.to_string()),

            // integrity
            MissingRecipient { .. } => ApiError::InternalError(err.to_string()),

            // store passthrough, with constraint translation
            Database(db_err) => ApiError::from(db_err),
        }
    }
}

/// Convert identity-provider errors to API errors
impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredential(msg) => {
                ApiError::Unauthorized(format!("Invalid credential: {}", msg))
            }
            IdentityError::Unavailable(msg) => {
                ApiError::ServiceUnavailable(format!("Authentication unavailable: {}", msg))
            }
        }
    }
}

/// Convert request-validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| ValidationErrorDetail {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use susucircle_shared::models::group::GroupStatus;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Group not found".to_string());
        assert_eq!(err.to_string(), "Not found: Group not found");
    }

    #[test]
    fn test_group_error_mapping() {
        assert!(matches!(
            ApiError::from(GroupError::GroupFull { capacity: 5 }),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(GroupError::NotAdmin),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(GroupError::InvalidCode),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(GroupError::InvalidCycleSize(1)),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(GroupError::GroupAlreadyActive(GroupStatus::Collecting)),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_identity_error_mapping() {
        assert!(matches!(
            ApiError::from(IdentityError::Unavailable("down".to_string())),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(IdentityError::InvalidCredential("bad".to_string())),
            ApiError::Unauthorized(_)
        ));
    }
}
