/// Authentication middleware support
///
/// Authentication is an explicit stage in front of the handlers: the API
/// layer extracts the bearer credential, this module resolves it through
/// the injected Identity Provider and looks up the local account, and the
/// resulting [`AuthContext`] is inserted as a request extension. Handlers
/// consume the resolved value; nothing re-authenticates downstream.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use susucircle_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::identity::{IdentityError, IdentityProvider};
use crate::models::user::User;

/// Authentication context added to request extensions
///
/// Present on every request that passed the authentication middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// The authenticated local user
    pub user_id: Uuid,

    /// The provider handle the credential resolved to
    pub external_id: String,
}

/// Error type for the authentication stage
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header was supplied
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer credential
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// The Identity Provider rejected the credential
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// The Identity Provider could not be reached
    #[error("Authentication unavailable: {0}")]
    AuthenticationUnavailable(String),

    /// The credential resolved but no local account is registered for it
    #[error("No account registered for this identity")]
    UnknownUser,

    /// Database error during account lookup
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "missing_credentials"),
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "invalid_authorization"),
            AuthError::InvalidCredential(_) => (StatusCode::UNAUTHORIZED, "invalid_credential"),
            AuthError::AuthenticationUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "authentication_unavailable")
            }
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "unknown_user"),
            AuthError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(serde_json::json!({
            "error": error_code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredential(msg) => AuthError::InvalidCredential(msg),
            IdentityError::Unavailable(msg) => AuthError::AuthenticationUnavailable(msg),
        }
    }
}

/// Extracts the bearer credential from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("header is not valid UTF-8".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("expected 'Bearer <credential>'".to_string()))
}

/// Resolves a bearer credential to an authenticated local account
///
/// The credential goes to the Identity Provider; the resulting external
/// handle is looked up in the users table. A resolvable credential with no
/// registered account yields [`AuthError::UnknownUser`]; the caller should
/// register first.
pub async fn authenticate(
    pool: &PgPool,
    provider: &dyn IdentityProvider,
    credential: &str,
) -> Result<AuthContext, AuthError> {
    let identity = provider.resolve(credential).await?;

    let user = User::find_by_external_id(pool, &identity.external_id)
        .await
        .map_err(|err| AuthError::DatabaseError(err.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext {
        user_id: user.id,
        external_id: identity.external_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_non_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_empty_bearer_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::InvalidFormat(_))
        ));
    }
}
