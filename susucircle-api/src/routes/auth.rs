/// Authentication and profile endpoints
///
/// Credentials never reach this service in raw form: the client
/// authenticates with the Identity Provider and presents the resulting
/// bearer credential. Registration exchanges a credential plus the fields
/// the provider does not own (username, optionally phone) for a local
/// account; login just resolves and stamps the visit.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create the local account for a credential
/// - `POST /v1/auth/login` - Resolve a credential to its account
/// - `GET /v1/me` - Current profile
/// - `PATCH /v1/me` - Update mutable profile fields

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use susucircle_shared::auth::identity::IdentityProvider as _;
use susucircle_shared::auth::middleware::AuthContext;
use susucircle_shared::models::user::{CreateUser, UpdateProfile, User};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Bearer credential issued by the Identity Provider
    #[validate(length(min = 1, message = "Credential is required"))]
    pub credential: String,

    /// Username to register
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    /// Phone number; falls back to the provider's phone claim
    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: Option<String>,

    /// Display name; falls back to the provider's name claim
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Bearer credential issued by the Identity Provider
    #[validate(length(min = 1, message = "Credential is required"))]
    pub credential: String,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub full_name: Option<String>,

    /// New phone number
    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: Option<String>,
}

/// Public view of a user account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Display name
    pub full_name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,

    /// Account creation time
    pub created_at: DateTime<Utc>,

    /// Last login time
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// `POST /v1/auth/register`
///
/// Resolves the credential, then creates the local account with the
/// provider's email and the caller-supplied username. The provider's
/// profile claims fill any field the caller left out.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    payload.validate()?;

    let identity = state.identity.resolve(&payload.credential).await?;

    if User::find_by_external_id(&state.db, &identity.external_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "An account is already registered for this identity".to_string(),
        ));
    }
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }
    if User::find_by_email(&state.db, &identity.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let phone = payload
        .phone
        .or(identity.phone)
        .ok_or_else(|| ApiError::BadRequest("A phone number is required".to_string()))?;
    let full_name = payload
        .full_name
        .or(identity.full_name)
        .unwrap_or_else(|| payload.username.clone());

    let user = User::create(
        &state.db,
        CreateUser {
            external_id: Some(identity.external_id),
            username: payload.username,
            full_name,
            email: identity.email,
            phone,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /v1/auth/login`
///
/// Resolves the credential to its local account and stamps the visit.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    payload.validate()?;

    let identity = state.identity.resolve(&payload.credential).await?;

    let user = User::find_by_external_id(&state.db, &identity.external_id)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("No account registered for this identity".to_string())
        })?;

    User::update_last_login(&state.db, user.id).await?;

    Ok(Json(user.into()))
}

/// `GET /v1/me`
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account no longer exists".to_string()))?;

    Ok(Json(user.into()))
}

/// `PATCH /v1/me`
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    payload.validate()?;

    let user = User::update_profile(
        &state.db,
        auth.user_id,
        UpdateProfile {
            full_name: payload.full_name,
            phone: payload.phone,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Account no longer exists".to_string()))?;

    Ok(Json(user.into()))
}
