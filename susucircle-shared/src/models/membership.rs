/// Membership model and database operations
///
/// This module provides the Membership model linking a user to a savings
/// group. A membership carries the member's fixed position in the payout
/// rotation and the per-cycle payment flag the settlement check reads.
///
/// Memberships are created when a user joins (directly or via invitation)
/// and may only be deleted while the group is `forming`; once a group
/// starts collecting, its roster is immutable for the life of the group.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     payout_order INTEGER NOT NULL CHECK (payout_order >= 1),
///     has_paid_this_cycle BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (group_id, user_id),
///     UNIQUE (group_id, payout_order) DEFERRABLE INITIALLY DEFERRED
/// );
/// ```
///
/// The payout-order uniqueness is deferred to commit so the renumbering
/// performed when a member leaves a forming group can shift a contiguous
/// range in a single UPDATE.
///
/// # Example
///
/// ```no_run
/// use susucircle_shared::models::membership::{CreateMembership, Membership};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, group_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let membership = Membership::create(&pool, CreateMembership {
///     group_id,
///     user_id,
///     payout_order: 2,
/// }).await?;
///
/// assert!(!membership.has_paid_this_cycle);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Membership model representing a user's seat in a group's rotation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// Group this membership belongs to
    pub group_id: Uuid,

    /// Member's user ID
    pub user_id: Uuid,

    /// Fixed position in the disbursement rotation (1-based, dense)
    pub payout_order: i32,

    /// Whether this member has contributed for the active cycle
    ///
    /// Reset to false on every cycle advance
    pub has_paid_this_cycle: bool,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Group ID
    pub group_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Rotation position, assigned by the caller as member count + 1
    pub payout_order: i32,
}

impl Membership {
    /// Checks if this member receives the payout for the given slot
    pub fn is_recipient_of(&self, slot: i32) -> bool {
        self.payout_order == slot
    }

    /// Creates a new membership
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user already has a membership in the group (unique constraint)
    /// - The payout order is already taken (unique constraint, at commit)
    /// - Group or user doesn't exist (foreign key violation)
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateMembership,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (group_id, user_id, payout_order)
            VALUES ($1, $2, $3)
            RETURNING id, group_id, user_id, payout_order, has_paid_this_cycle,
                      created_at, updated_at
            "#,
        )
        .bind(data.group_id)
        .bind(data.user_id)
        .bind(data.payout_order)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    /// Finds a membership by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, group_id, user_id, payout_order, has_paid_this_cycle,
                   created_at, updated_at
            FROM memberships
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership by group and user
    pub async fn find(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, group_id, user_id, payout_order, has_paid_this_cycle,
                   created_at, updated_at
            FROM memberships
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Finds the membership holding a rotation slot
    ///
    /// Used by the settlement algorithm to address the payout.
    pub async fn find_by_payout_order(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
        payout_order: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, group_id, user_id, payout_order, has_paid_this_cycle,
                   created_at, updated_at
            FROM memberships
            WHERE group_id = $1 AND payout_order = $2
            "#,
        )
        .bind(group_id)
        .bind(payout_order)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Counts members in a group
    pub async fn count_by_group(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    /// Lists a group's members in rotation order
    pub async fn list_by_group(pool: &PgPool, group_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, group_id, user_id, payout_order, has_paid_this_cycle,
                   created_at, updated_at
            FROM memberships
            WHERE group_id = $1
            ORDER BY payout_order ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists all memberships a user holds across groups
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, group_id, user_id, payout_order, has_paid_this_cycle,
                   created_at, updated_at
            FROM memberships
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Checks if every member of a group has paid for the active cycle
    ///
    /// This is the `can_disburse` input; callers must hold the group's
    /// mutation lock so the answer cannot go stale before the write.
    pub async fn all_paid(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let (unpaid,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM memberships WHERE group_id = $1 AND NOT has_paid_this_cycle",
        )
        .bind(group_id)
        .fetch_one(executor)
        .await?;

        Ok(unpaid == 0)
    }

    /// Marks a member as paid for the active cycle
    ///
    /// The `WHERE NOT has_paid_this_cycle` guard makes a duplicate
    /// contribution visible to the caller as a None return.
    pub async fn mark_paid(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET has_paid_this_cycle = TRUE, updated_at = NOW()
            WHERE id = $1 AND NOT has_paid_this_cycle
            RETURNING id, group_id, user_id, payout_order, has_paid_this_cycle,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Clears every member's payment flag at the start of a new cycle
    pub async fn reset_paid_flags(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET has_paid_this_cycle = FALSE, updated_at = NOW()
            WHERE group_id = $1 AND has_paid_this_cycle
            "#,
        )
        .bind(group_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a membership
    ///
    /// Eligibility (forming-only, creator-protected) is enforced by the
    /// membership manager, not here.
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Closes the rotation gap left by a departed member
    ///
    /// Every payout order above the departed position shifts down by one,
    /// keeping the sequence dense 1..N. Only legal while the group is
    /// forming; the uniqueness constraint is checked at commit.
    pub async fn renumber_after_departure(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
        departed_order: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET payout_order = payout_order - 1, updated_at = NOW()
            WHERE group_id = $1 AND payout_order > $2
            "#,
        )
        .bind(group_id)
        .bind(departed_order)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_recipient_of() {
        let membership = Membership {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            payout_order: 3,
            has_paid_this_cycle: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(membership.is_recipient_of(3));
        assert!(!membership.is_recipient_of(1));
    }

    #[test]
    fn test_create_membership_struct() {
        let data = CreateMembership {
            group_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            payout_order: 1,
        };
        assert_eq!(data.payout_order, 1);
    }

    // Integration tests for database operations are in tests/engine_tests.rs
}
