/// Group lifecycle and membership endpoints
///
/// Handlers are thin: every mutation goes through the lifecycle engine or
/// the membership manager, which serialize on the group's row lock and
/// commit atomically.
///
/// # Endpoints
///
/// - `POST /v1/groups` - Create a group (creator auto-joined first)
/// - `GET /v1/groups` - Groups the caller belongs to
/// - `GET /v1/groups/:group_id` - Group detail with the rotation roster
/// - `DELETE /v1/groups/:group_id` - Delete a forming group (admin)
/// - `POST /v1/groups/:group_id/join` - Take the next rotation slot
/// - `POST /v1/groups/:group_id/leave` - Give up a seat while forming
/// - `DELETE /v1/groups/:group_id/members/:user_id` - Admin removal

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use susucircle_shared::auth::middleware::AuthContext;
use susucircle_shared::models::group::{CreateGroup, Group, GroupStatus};
use susucircle_shared::models::membership::Membership;
use uuid::Uuid;
use validator::Validate;

/// Create-group request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    /// Group name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// Number of rotation slots
    #[validate(range(min = 2, message = "Cycle size must be at least 2"))]
    pub cycle_size: i32,

    /// Per-member contribution per cycle, minor currency units
    #[validate(range(min = 1, message = "Weekly amount must be positive"))]
    pub weekly_amount: i64,
}

/// Public view of a group
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    /// Group ID
    pub id: Uuid,

    /// Group name
    pub name: String,

    /// Description
    pub description: Option<String>,

    /// Admin (creator) user ID
    pub created_by: Uuid,

    /// Number of rotation slots
    pub cycle_size: i32,

    /// Per-member contribution per cycle
    pub weekly_amount: i64,

    /// Pool disbursed each cycle
    pub total_pool_amount: i64,

    /// Lifecycle status
    pub status: GroupStatus,

    /// Completed cycles
    pub current_cycle: i32,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        let total_pool_amount = group.total_pool_amount();
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            created_by: group.created_by,
            cycle_size: group.cycle_size,
            weekly_amount: group.weekly_amount,
            total_pool_amount,
            status: group.status,
            current_cycle: group.current_cycle,
            created_at: group.created_at,
        }
    }
}

/// One seat in the rotation roster
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    /// Membership ID
    pub membership_id: Uuid,

    /// Member's user ID
    pub user_id: Uuid,

    /// Position in the rotation
    pub payout_order: i32,

    /// Whether the member has contributed for the active cycle
    pub has_paid_this_cycle: bool,

    /// Whether this seat receives the next payout
    pub is_next_recipient: bool,
}

impl MemberResponse {
    fn new(membership: Membership, next_slot: i32) -> Self {
        let is_next_recipient = membership.is_recipient_of(next_slot);
        Self {
            membership_id: membership.id,
            user_id: membership.user_id,
            payout_order: membership.payout_order,
            has_paid_this_cycle: membership.has_paid_this_cycle,
            is_next_recipient,
        }
    }
}

/// Group detail: the group plus its rotation roster
#[derive(Debug, Serialize)]
pub struct GroupDetailResponse {
    /// The group
    #[serde(flatten)]
    pub group: GroupResponse,

    /// Current member count
    pub member_count: i64,

    /// Open rotation slots
    pub available_slots: i64,

    /// Members in rotation order
    pub members: Vec<MemberResponse>,
}

/// Membership view returned by join operations
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    /// Membership ID
    pub id: Uuid,

    /// Group ID
    pub group_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Position in the rotation
    pub payout_order: i32,

    /// Whether the member has contributed for the active cycle
    pub has_paid_this_cycle: bool,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        Self {
            id: membership.id,
            group_id: membership.group_id,
            user_id: membership.user_id,
            payout_order: membership.payout_order,
            has_paid_this_cycle: membership.has_paid_this_cycle,
            created_at: membership.created_at,
        }
    }
}

/// `POST /v1/groups`
pub async fn create_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    payload.validate()?;

    let group = state
        .lifecycle()
        .create_group(
            auth.user_id,
            CreateGroup {
                name: payload.name,
                description: payload.description,
                cycle_size: payload.cycle_size,
                weekly_amount: payload.weekly_amount,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

/// `GET /v1/groups`
pub async fn my_groups(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let groups = Group::list_by_member(&state.db, auth.user_id).await?;

    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

/// `GET /v1/groups/:group_id`
///
/// Visible to members and the admin only.
pub async fn view_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<GroupDetailResponse>> {
    let group = Group::find_by_id(&state.db, group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    let is_member = Membership::find(&state.db, group_id, auth.user_id)
        .await?
        .is_some();
    if !is_member && !group.is_admin(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You are not a member of this group".to_string(),
        ));
    }

    let members = Membership::list_by_group(&state.db, group_id).await?;
    let member_count = members.len() as i64;
    let available_slots = group.available_slots(member_count);
    let next_slot = group.current_cycle + 1;

    Ok(Json(GroupDetailResponse {
        group: group.into(),
        member_count,
        available_slots,
        members: members
            .into_iter()
            .map(|m| MemberResponse::new(m, next_slot))
            .collect(),
    }))
}

/// `POST /v1/groups/:group_id/join`
pub async fn join_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    let membership = state.memberships().join(group_id, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(membership.into())))
}

/// `POST /v1/groups/:group_id/leave`
pub async fn leave_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.memberships().leave(group_id, auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /v1/groups/:group_id/members/:user_id`
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .memberships()
        .remove(group_id, auth.user_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /v1/groups/:group_id`
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .memberships()
        .delete_group(group_id, auth.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
