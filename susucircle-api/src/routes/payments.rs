/// Contribution, settlement, and ledger endpoints
///
/// # Endpoints
///
/// - `POST /v1/groups/:group_id/contributions` - Pay in for the active cycle
/// - `POST /v1/groups/:group_id/settle` - Run the settlement check
/// - `GET /v1/groups/:group_id/ledger` - The group's transaction history

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
use susucircle_shared::groups::GroupError;
use susucircle_shared::models::group::Group;
use susucircle_shared::models::membership::Membership;
use susucircle_shared::models::transaction::{Transaction, TxType};
use uuid::Uuid;
use validator::Validate;

use super::groups::GroupResponse;

/// Contribution request
#[derive(Debug, Deserialize, Validate)]
pub struct ContributionRequest {
    /// Amount in minor currency units; must equal the group's weekly amount
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,

    /// Optional payment reference
    #[validate(length(max = 100, message = "Reference must be at most 100 characters"))]
    pub reference: Option<String>,
}

/// Public view of a ledger entry
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID
    pub id: Uuid,

    /// Membership the entry belongs to
    pub membership_id: Uuid,

    /// Amount in minor currency units
    pub amount: i64,

    /// Contribution or payout
    pub tx_type: TxType,

    /// Payment reference
    pub reference: Option<String>,

    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            membership_id: transaction.membership_id,
            amount: transaction.amount,
            tx_type: transaction.tx_type,
            reference: transaction.reference,
            created_at: transaction.created_at,
        }
    }
}

/// `POST /v1/groups/:group_id/contributions`
///
/// Records the caller's contribution for the active cycle. When it is the
/// last one outstanding, the cycle settles in the same transaction.
pub async fn record_contribution(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<ContributionRequest>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    payload.validate()?;

    let membership = Membership::find(&state.db, group_id, auth.user_id)
        .await?
        .ok_or(GroupError::NotMember)
        .map_err(ApiError::from)?;

    let entry = state
        .lifecycle()
        .record_contribution(membership.id, payload.amount, payload.reference)
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// `POST /v1/groups/:group_id/settle`
///
/// Idempotent: a group that is not ready to settle comes back unchanged.
pub async fn settle_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<GroupResponse>> {
    let is_member = Membership::find(&state.db, group_id, auth.user_id)
        .await?
        .is_some();
    if !is_member {
        return Err(ApiError::Forbidden(
            "You are not a member of this group".to_string(),
        ));
    }

    let group = state.lifecycle().settle(group_id).await?;

    Ok(Json(group.into()))
}

/// `GET /v1/groups/:group_id/ledger`
///
/// Visible to members and the admin only.
pub async fn group_ledger(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
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

    let entries = Transaction::list_by_group(&state.db, group_id).await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
