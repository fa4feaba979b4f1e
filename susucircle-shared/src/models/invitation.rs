/// Group invitation model and database operations
///
/// This module provides the GroupInvitation model: a single-use,
/// time-bounded code granting join rights to a specific group. Expiry is
/// evaluated lazily against the clock at read/redeem time: a lapsed
/// invitation keeps its stored `pending` status and simply stops
/// validating.
///
/// # Lifecycle
///
/// ```text
/// pending → accepted   (exactly once, records acceptor + timestamp)
/// pending → cancelled  (by the inviter or the group admin)
/// pending → (lapsed)   (implicit, once past expires_at; never written)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'expired', 'cancelled');
///
/// CREATE TABLE group_invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
///     invited_by UUID NOT NULL REFERENCES users(id),
///     code VARCHAR(8) NOT NULL UNIQUE,
///     invited_email VARCHAR(120),
///     invited_phone VARCHAR(20),
///     invited_name VARCHAR(100),
///     status invitation_status NOT NULL DEFAULT 'pending',
///     expires_at TIMESTAMPTZ NOT NULL,
///     accepted_at TIMESTAMPTZ,
///     accepted_by UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Characters an invitation code is drawn from
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of an invitation code
pub const CODE_LENGTH: usize = 8;

/// Invitation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Issued and redeemable until it expires
    Pending,

    /// Redeemed; the acceptor holds a membership
    Accepted,

    /// Explicitly marked expired
    Expired,

    /// Withdrawn by the inviter or the group admin
    Cancelled,
}

impl InvitationStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Cancelled => "cancelled",
        }
    }
}

/// Invitation model for inviting users to join a group
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupInvitation {
    /// Unique invitation ID
    pub id: Uuid,

    /// Group the invitation grants access to
    pub group_id: Uuid,

    /// Member or admin who issued the invitation
    pub invited_by: Uuid,

    /// Unique 8-character uppercase-alphanumeric code
    pub code: String,

    /// Optional target email
    pub invited_email: Option<String>,

    /// Optional target phone
    pub invited_phone: Option<String>,

    /// Optional target display name
    pub invited_name: Option<String>,

    /// Current status
    pub status: InvitationStatus,

    /// Instant after which the invitation stops validating
    pub expires_at: DateTime<Utc>,

    /// When the invitation was redeemed
    pub accepted_at: Option<DateTime<Utc>>,

    /// Who redeemed the invitation
    pub accepted_by: Option<Uuid>,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    /// Group ID
    pub group_id: Uuid,

    /// Issuing user
    pub invited_by: Uuid,

    /// Pre-generated unique code
    pub code: String,

    /// Optional target email
    pub invited_email: Option<String>,

    /// Optional target phone
    pub invited_phone: Option<String>,

    /// Optional target display name
    pub invited_name: Option<String>,

    /// Expiry instant
    pub expires_at: DateTime<Utc>,
}

impl GroupInvitation {
    /// Checks if the invitation has lapsed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks if the invitation can still be redeemed
    ///
    /// Valid iff the stored status is pending and the expiry instant has
    /// not passed.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }

    /// Draws a random candidate code
    ///
    /// Uniqueness is NOT guaranteed here; the invitation manager retries
    /// against the store until the candidate is genuinely absent.
    pub fn random_code() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }

    /// Checks whether a code is already taken
    pub async fn code_exists(
        executor: impl PgExecutor<'_>,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM group_invitations WHERE code = $1)")
                .bind(code)
                .fetch_one(executor)
                .await?;

        Ok(exists)
    }

    /// Creates a new pending invitation
    ///
    /// # Errors
    ///
    /// Returns an error if the code collides (unique constraint) or the
    /// group/inviter doesn't exist.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateInvitation,
    ) -> Result<Self, sqlx::Error> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            INSERT INTO group_invitations
                (group_id, invited_by, code, invited_email, invited_phone, invited_name, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, group_id, invited_by, code, invited_email, invited_phone, invited_name,
                      status, expires_at, accepted_at, accepted_by, created_at
            "#,
        )
        .bind(data.group_id)
        .bind(data.invited_by)
        .bind(data.code)
        .bind(data.invited_email)
        .bind(data.invited_phone)
        .bind(data.invited_name)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            SELECT id, group_id, invited_by, code, invited_email, invited_phone, invited_name,
                   status, expires_at, accepted_at, accepted_by, created_at
            FROM group_invitations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by code and locks its row
    ///
    /// Redemption holds this lock (plus the group lock) until commit, so a
    /// code cannot be redeemed twice.
    pub async fn find_by_code_for_update(
        executor: impl PgExecutor<'_>,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            SELECT id, group_id, invited_by, code, invited_email, invited_phone, invited_name,
                   status, expires_at, accepted_at, accepted_by, created_at
            FROM group_invitations
            WHERE code = $1
            FOR UPDATE
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Lists a group's invitations, newest first
    pub async fn list_by_group(pool: &PgPool, group_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let invitations = sqlx::query_as::<_, GroupInvitation>(
            r#"
            SELECT id, group_id, invited_by, code, invited_email, invited_phone, invited_name,
                   status, expires_at, accepted_at, accepted_by, created_at
            FROM group_invitations
            WHERE group_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(invitations)
    }

    /// Marks an invitation accepted, recording acceptor and timestamp
    ///
    /// Compare-and-set on `pending`; returns None if the invitation was
    /// already terminal.
    pub async fn mark_accepted(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        accepted_by: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            UPDATE group_invitations
            SET status = 'accepted', accepted_by = $2, accepted_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, group_id, invited_by, code, invited_email, invited_phone, invited_name,
                      status, expires_at, accepted_at, accepted_by, created_at
            "#,
        )
        .bind(id)
        .bind(accepted_by)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }

    /// Marks an invitation cancelled
    ///
    /// Compare-and-set on `pending`; returns None if the invitation was
    /// already terminal.
    pub async fn mark_cancelled(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            UPDATE group_invitations
            SET status = 'cancelled'
            WHERE id = $1 AND status = 'pending'
            RETURNING id, group_id, invited_by, code, invited_email, invited_phone, invited_name,
                      status, expires_at, accepted_at, accepted_by, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> GroupInvitation {
        GroupInvitation {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            invited_by: Uuid::new_v4(),
            code: "AB12CD34".to_string(),
            invited_email: Some("efua@example.com".to_string()),
            invited_phone: None,
            invited_name: None,
            status,
            expires_at,
            accepted_at: None,
            accepted_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(InvitationStatus::Pending.as_str(), "pending");
        assert_eq!(InvitationStatus::Accepted.as_str(), "accepted");
        assert_eq!(InvitationStatus::Expired.as_str(), "expired");
        assert_eq!(InvitationStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_pending_before_expiry_is_valid() {
        let now = Utc::now();
        let invitation = sample_invitation(InvitationStatus::Pending, now + Duration::hours(48));
        assert!(!invitation.is_expired(now));
        assert!(invitation.is_valid(now));
    }

    #[test]
    fn test_pending_past_expiry_is_invalid_but_stays_pending() {
        let now = Utc::now();
        let invitation = sample_invitation(InvitationStatus::Pending, now - Duration::hours(1));
        assert!(invitation.is_expired(now));
        assert!(!invitation.is_valid(now));
        // the stored status is untouched by lazy expiry
        assert_eq!(invitation.status, InvitationStatus::Pending);
    }

    #[test]
    fn test_terminal_statuses_never_valid() {
        let now = Utc::now();
        let future = now + Duration::hours(48);
        for status in [
            InvitationStatus::Accepted,
            InvitationStatus::Expired,
            InvitationStatus::Cancelled,
        ] {
            assert!(!sample_invitation(status, future).is_valid(now));
        }
    }

    #[test]
    fn test_random_code_shape() {
        for _ in 0..100 {
            let code = GroupInvitation::random_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code
                .bytes()
                .all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
