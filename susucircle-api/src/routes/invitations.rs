/// Invitation endpoints
///
/// # Endpoints
///
/// - `POST /v1/groups/:group_id/invitations` - Issue an invitation
/// - `GET /v1/groups/:group_id/invitations` - List a group's invitations
/// - `POST /v1/invitations/redeem` - Join a group with a code
/// - `POST /v1/invitations/:invitation_id/cancel` - Withdraw an invitation

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use susucircle_shared::auth::middleware::AuthContext;
use susucircle_shared::groups::InviteContact;
use susucircle_shared::models::invitation::{GroupInvitation, InvitationStatus};
use uuid::Uuid;
use validator::Validate;

use super::groups::MembershipResponse;

/// Create-invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Invitee email (email or phone is required)
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Invitee phone (email or phone is required)
    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: Option<String>,

    /// Invitee display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Lifetime in hours (default 48)
    #[validate(range(min = 1, max = 720, message = "Lifetime must be 1-720 hours"))]
    pub ttl_hours: Option<i64>,
}

/// Redeem request
#[derive(Debug, Deserialize, Validate)]
pub struct RedeemRequest {
    /// The invitation code
    #[validate(length(min = 8, max = 8, message = "Codes are 8 characters"))]
    pub code: String,
}

/// Public view of an invitation
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    /// Invitation ID
    pub id: Uuid,

    /// Group the invitation grants access to
    pub group_id: Uuid,

    /// Issuer
    pub invited_by: Uuid,

    /// The code to share with the invitee
    pub code: String,

    /// Invitee email
    pub invited_email: Option<String>,

    /// Invitee phone
    pub invited_phone: Option<String>,

    /// Invitee name
    pub invited_name: Option<String>,

    /// Stored status
    pub status: InvitationStatus,

    /// Whether the invitation can still be redeemed right now
    pub is_valid: bool,

    /// Expiry instant
    pub expires_at: DateTime<Utc>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<GroupInvitation> for InvitationResponse {
    fn from(invitation: GroupInvitation) -> Self {
        let is_valid = invitation.is_valid(Utc::now());
        Self {
            id: invitation.id,
            group_id: invitation.group_id,
            invited_by: invitation.invited_by,
            code: invitation.code,
            invited_email: invitation.invited_email,
            invited_phone: invitation.invited_phone,
            invited_name: invitation.invited_name,
            status: invitation.status,
            is_valid,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
        }
    }
}

/// `POST /v1/groups/:group_id/invitations`
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    payload.validate()?;

    let invitation = state
        .invitations()
        .create_invitation(
            group_id,
            auth.user_id,
            InviteContact {
                email: payload.email,
                phone: payload.phone,
                name: payload.name,
            },
            payload.ttl_hours,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(invitation.into())))
}

/// `GET /v1/groups/:group_id/invitations`
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<Vec<InvitationResponse>>> {
    let invitations = state
        .invitations()
        .list_for_group(group_id, auth.user_id)
        .await?;

    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

/// `POST /v1/invitations/redeem`
pub async fn redeem_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RedeemRequest>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    payload.validate()?;

    let membership = state
        .invitations()
        .redeem(&payload.code, auth.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(membership.into())))
}

/// `POST /v1/invitations/:invitation_id/cancel`
pub async fn cancel_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .invitations()
        .cancel(invitation_id, auth.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
