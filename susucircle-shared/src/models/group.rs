/// Group model and database operations
///
/// This module provides the Group model for Susu savings groups together
/// with the status state machine that governs a group's life. A group is
/// created in `forming`, starts `collecting` once its rotation is fully
/// staffed, passes through `disbursing` on every settlement, and ends in
/// `complete` after each member has received the pool exactly once.
///
/// # State Machine
///
/// ```text
/// forming → collecting → disbursing → collecting
///                                   → complete
/// ```
///
/// `complete` is terminal. Any other source/destination pair is rejected
/// without mutating state.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE group_status AS ENUM ('forming', 'collecting', 'disbursing', 'complete');
///
/// CREATE TABLE groups (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description TEXT,
///     created_by UUID NOT NULL REFERENCES users(id),
///     cycle_size INTEGER NOT NULL CHECK (cycle_size >= 2),
///     weekly_amount BIGINT NOT NULL CHECK (weekly_amount > 0),
///     status group_status NOT NULL DEFAULT 'forming',
///     current_cycle INTEGER NOT NULL DEFAULT 0
///         CHECK (current_cycle >= 0 AND current_cycle <= cycle_size),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Amounts are stored in minor currency units (pesewas), so `weekly_amount`
/// of 20000 is GH₵200.00.
///
/// # Example
///
/// ```no_run
/// use susucircle_shared::models::group::{CreateGroup, Group, GroupStatus};
/// use susucircle_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(creator_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let group = Group::create(&pool, creator_id, CreateGroup {
///     name: "Akwaaba Savings".to_string(),
///     description: Some("Friday circle".to_string()),
///     cycle_size: 5,
///     weekly_amount: 20_000,
/// }).await?;
///
/// assert_eq!(group.status, GroupStatus::Forming);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Group lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "group_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    /// Group is being formed, accepting new members
    Forming,

    /// Group is active and collecting contributions for the current cycle
    Collecting,

    /// All contributions are in; the pool is being paid out
    Disbursing,

    /// Every rotation slot has received its payout
    Complete,
}

impl GroupStatus {
    /// Converts status to string for display and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Forming => "forming",
            GroupStatus::Collecting => "collecting",
            GroupStatus::Disbursing => "disbursing",
            GroupStatus::Complete => "complete",
        }
    }

    /// Checks if status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, GroupStatus::Complete)
    }

    /// Checks if users can join a group in this status
    pub fn can_join(&self) -> bool {
        matches!(self, GroupStatus::Forming)
    }

    /// Checks if a transition to the target status is legal
    pub fn can_transition_to(&self, target: GroupStatus) -> bool {
        match (self, target) {
            // Forming can only start collecting
            (GroupStatus::Forming, GroupStatus::Collecting) => true,

            // Collecting can only move into disbursement
            (GroupStatus::Collecting, GroupStatus::Disbursing) => true,

            // Disbursing begins the next cycle or finishes the rotation
            (GroupStatus::Disbursing, GroupStatus::Collecting) => true,
            (GroupStatus::Disbursing, GroupStatus::Complete) => true,

            // Complete is terminal; everything else is illegal
            _ => false,
        }
    }
}

/// Group model representing a Susu savings group
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    /// Unique group ID (UUID v4)
    pub id: Uuid,

    /// Group name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// The creator, who administers the group; immutable
    pub created_by: Uuid,

    /// Target member count = number of rotation slots
    pub cycle_size: i32,

    /// Per-member contribution per cycle, in minor currency units
    pub weekly_amount: i64,

    /// Current lifecycle status
    pub status: GroupStatus,

    /// Completed payment cycles; 0 until the first settlement
    pub current_cycle: i32,

    /// When the group was created
    pub created_at: DateTime<Utc>,

    /// When the group was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    /// Group name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Number of rotation slots (minimum 2)
    pub cycle_size: i32,

    /// Per-member contribution per cycle, in minor currency units
    pub weekly_amount: i64,
}

impl Group {
    /// Checks if the group has reached its member limit
    pub fn is_full(&self, member_count: i64) -> bool {
        member_count >= i64::from(self.cycle_size)
    }

    /// Number of open rotation slots
    pub fn available_slots(&self, member_count: i64) -> i64 {
        (i64::from(self.cycle_size) - member_count).max(0)
    }

    /// Total amount collected (and paid out) in each cycle
    pub fn total_pool_amount(&self) -> i64 {
        self.weekly_amount * i64::from(self.cycle_size)
    }

    /// Checks if a user is the admin (creator) of this group
    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    /// Guard for the `forming → collecting` transition: the rotation must
    /// be fully staffed
    pub fn can_start(&self, member_count: i64) -> bool {
        self.status == GroupStatus::Forming && member_count >= i64::from(self.cycle_size)
    }

    /// Checks if every rotation slot has been paid out
    ///
    /// Evaluated after a disbursement; decides `disbursing → complete`
    /// versus `disbursing → collecting`.
    pub fn all_cycles_disbursed(&self) -> bool {
        self.current_cycle >= self.cycle_size
    }

    /// Creates a new group in `forming` status
    ///
    /// The creator becomes the admin but is NOT enrolled here; callers that
    /// need the creator auto-joined at payout order 1 go through the
    /// lifecycle engine, which performs both writes in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the creator doesn't exist (foreign key) or the
    /// check constraints reject the inputs.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        created_by: Uuid,
        data: CreateGroup,
    ) -> Result<Self, sqlx::Error> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, description, created_by, cycle_size, weekly_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, created_by, cycle_size, weekly_amount,
                      status, current_cycle, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(created_by)
        .bind(data.cycle_size)
        .bind(data.weekly_amount)
        .fetch_one(executor)
        .await?;

        Ok(group)
    }

    /// Finds a group by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, description, created_by, cycle_size, weekly_amount,
                   status, current_cycle, created_at, updated_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(group)
    }

    /// Finds a group by ID and takes the per-group mutation lock
    ///
    /// Every operation that reads membership counts or payment flags and
    /// then writes derived state must call this first, inside its
    /// transaction. The row lock is held until commit, serializing group
    /// mutation (concurrent joins cannot both win the last slot, and
    /// concurrent settlements cannot double-disburse).
    pub async fn find_by_id_for_update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, description, created_by, cycle_size, weekly_amount,
                   status, current_cycle, created_at, updated_at
            FROM groups
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(group)
    }

    /// Lists all groups a user belongs to, forming groups first
    pub async fn list_by_member(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name, g.description, g.created_by, g.cycle_size, g.weekly_amount,
                   g.status, g.current_cycle, g.created_at, g.updated_at
            FROM groups g
            JOIN memberships m ON m.group_id = g.id
            WHERE m.user_id = $1
            ORDER BY (g.status != 'forming'), g.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(groups)
    }

    /// Applies a status transition with a compare-and-set guard
    ///
    /// The `WHERE status = $2` predicate makes the write a no-op when the
    /// row is no longer in the expected source status, so a stale caller
    /// can never clobber a concurrent transition.
    ///
    /// # Returns
    ///
    /// The updated group, or None if the group was not in `from`.
    pub async fn update_status(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        from: GroupStatus,
        to: GroupStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, name, description, created_by, cycle_size, weekly_amount,
                      status, current_cycle, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(executor)
        .await?;

        Ok(group)
    }

    /// Finishes a disbursement: bumps the cycle counter and leaves
    /// `disbursing` for the next status in one write
    ///
    /// # Returns
    ///
    /// The updated group, or None if the group was not in `disbursing`.
    pub async fn complete_cycle(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        next: GroupStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET current_cycle = current_cycle + 1, status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'disbursing'
            RETURNING id, name, description, created_by, cycle_size, weekly_amount,
                      status, current_cycle, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(next)
        .fetch_optional(executor)
        .await?;

        Ok(group)
    }

    /// Deletes a group
    ///
    /// Memberships and invitations are removed by `ON DELETE CASCADE`.
    /// Eligibility (admin-only, forming-only) is enforced by the
    /// membership manager, not here.
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group(status: GroupStatus, cycle_size: i32, current_cycle: i32) -> Group {
        Group {
            id: Uuid::new_v4(),
            name: "Test Circle".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            cycle_size,
            weekly_amount: 20_000,
            status,
            current_cycle,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(GroupStatus::Forming.as_str(), "forming");
        assert_eq!(GroupStatus::Collecting.as_str(), "collecting");
        assert_eq!(GroupStatus::Disbursing.as_str(), "disbursing");
        assert_eq!(GroupStatus::Complete.as_str(), "complete");
    }

    #[test]
    fn test_legal_transitions() {
        assert!(GroupStatus::Forming.can_transition_to(GroupStatus::Collecting));
        assert!(GroupStatus::Collecting.can_transition_to(GroupStatus::Disbursing));
        assert!(GroupStatus::Disbursing.can_transition_to(GroupStatus::Collecting));
        assert!(GroupStatus::Disbursing.can_transition_to(GroupStatus::Complete));
    }

    #[test]
    fn test_illegal_transitions() {
        let all = [
            GroupStatus::Forming,
            GroupStatus::Collecting,
            GroupStatus::Disbursing,
            GroupStatus::Complete,
        ];

        // Complete is terminal
        for target in all {
            assert!(!GroupStatus::Complete.can_transition_to(target));
        }

        // Nothing may re-enter forming, and collecting cannot be skipped
        for source in all {
            assert!(!source.can_transition_to(GroupStatus::Forming));
        }
        assert!(!GroupStatus::Forming.can_transition_to(GroupStatus::Disbursing));
        assert!(!GroupStatus::Forming.can_transition_to(GroupStatus::Complete));
        assert!(!GroupStatus::Collecting.can_transition_to(GroupStatus::Collecting));
        assert!(!GroupStatus::Collecting.can_transition_to(GroupStatus::Complete));
    }

    #[test]
    fn test_can_join_only_while_forming() {
        assert!(GroupStatus::Forming.can_join());
        assert!(!GroupStatus::Collecting.can_join());
        assert!(!GroupStatus::Disbursing.can_join());
        assert!(!GroupStatus::Complete.can_join());
    }

    #[test]
    fn test_is_terminal() {
        assert!(GroupStatus::Complete.is_terminal());
        assert!(!GroupStatus::Forming.is_terminal());
        assert!(!GroupStatus::Collecting.is_terminal());
        assert!(!GroupStatus::Disbursing.is_terminal());
    }

    #[test]
    fn test_capacity_helpers() {
        let group = sample_group(GroupStatus::Forming, 5, 0);
        assert!(!group.is_full(4));
        assert!(group.is_full(5));
        assert_eq!(group.available_slots(3), 2);
        assert_eq!(group.available_slots(5), 0);
        // never negative even if the count is somehow over capacity
        assert_eq!(group.available_slots(7), 0);
    }

    #[test]
    fn test_total_pool_amount() {
        let group = sample_group(GroupStatus::Collecting, 5, 0);
        assert_eq!(group.total_pool_amount(), 100_000);
    }

    #[test]
    fn test_can_start_guard() {
        let group = sample_group(GroupStatus::Forming, 3, 0);
        assert!(!group.can_start(2));
        assert!(group.can_start(3));

        let started = sample_group(GroupStatus::Collecting, 3, 0);
        assert!(!started.can_start(3));
    }

    #[test]
    fn test_all_cycles_disbursed() {
        assert!(!sample_group(GroupStatus::Disbursing, 3, 2).all_cycles_disbursed());
        assert!(sample_group(GroupStatus::Disbursing, 3, 3).all_cycles_disbursed());
    }
}
