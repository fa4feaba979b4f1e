/// Group lifecycle engine
///
/// The engine owns every status change a group goes through and the
/// settlement algorithm that advances the rotation. All other components
/// route their mutations through here (the membership manager triggers the
/// `forming → collecting` start via [`apply_transition`]); nothing else in
/// the system writes a group's status or cycle counter.
///
/// # Settlement
///
/// When the last outstanding contribution for a cycle arrives, the engine,
/// inside one transaction holding the group's row lock,
///
/// 1. moves the group `collecting → disbursing`,
/// 2. appends a payout of `weekly_amount × cycle_size` to the member whose
///    payout order equals `current_cycle + 1`,
/// 3. increments the cycle counter and clears every payment flag,
/// 4. moves on to `complete` when every slot has been paid, otherwise back
///    to `collecting` for the next round.
///
/// The rotation is never skipped and never revisits a slot: over a full
/// group life, each payout order receives exactly once.
///
/// # Atomicity
///
/// A transition either fully applies (status change plus any associated
/// ledger entry) or the transaction rolls back in full. A cycle counter
/// without its payout, or a payout without the flag reset, cannot be
/// observed.
///
/// # Example
///
/// ```no_run
/// use susucircle_shared::groups::lifecycle::LifecycleEngine;
/// use susucircle_shared::models::group::CreateGroup;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, creator: Uuid) -> anyhow::Result<()> {
/// let engine = LifecycleEngine::new(pool);
///
/// let group = engine.create_group(creator, CreateGroup {
///     name: "Akwaaba Savings".to_string(),
///     description: None,
///     cycle_size: 3,
///     weekly_amount: 20_000,
/// }).await?;
///
/// // ... members join, contribute ...
/// let group = engine.settle(group.id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{PgExecutor, PgPool, Postgres, Transaction as PgTransaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::GroupError;
use crate::models::group::{CreateGroup, Group, GroupStatus};
use crate::models::membership::{CreateMembership, Membership};
use crate::models::transaction::{CreateTransaction, Transaction, TxType};
use crate::models::user::User;

/// Applies a validated status transition
///
/// Checks the transition table first, then performs the compare-and-set
/// write. Callers hold the group's row lock, so a None from the CAS means
/// the in-memory snapshot went stale, reported as the same
/// `InvalidTransition` the table check would give.
pub(crate) async fn apply_transition(
    executor: impl PgExecutor<'_>,
    group: &Group,
    to: GroupStatus,
) -> Result<Group, GroupError> {
    if !group.status.can_transition_to(to) {
        return Err(GroupError::InvalidTransition {
            from: group.status,
            to,
        });
    }

    Group::update_status(executor, group.id, group.status, to)
        .await?
        .ok_or(GroupError::InvalidTransition {
            from: group.status,
            to,
        })
}

/// The group lifecycle engine
///
/// Stateless over the pool; every operation is one atomic unit.
pub struct LifecycleEngine {
    pool: PgPool,
}

impl LifecycleEngine {
    /// Creates an engine over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a group in `forming` with the creator enrolled at payout
    /// order 1
    ///
    /// # Errors
    ///
    /// - `InvalidCycleSize` if fewer than 2 rotation slots are requested
    /// - `InvalidAmount` if the weekly amount is not positive
    /// - `UserNotFound` if the creator does not exist
    pub async fn create_group(
        &self,
        creator_id: Uuid,
        data: CreateGroup,
    ) -> Result<Group, GroupError> {
        if data.cycle_size < 2 {
            return Err(GroupError::InvalidCycleSize(data.cycle_size));
        }
        if data.weekly_amount <= 0 {
            return Err(GroupError::InvalidAmount(data.weekly_amount));
        }

        User::find_by_id(&self.pool, creator_id)
            .await?
            .ok_or(GroupError::UserNotFound(creator_id))?;

        let mut tx = self.pool.begin().await?;

        let group = Group::create(&mut *tx, creator_id, data).await?;
        Membership::create(
            &mut *tx,
            CreateMembership {
                group_id: group.id,
                user_id: creator_id,
                payout_order: 1,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            group_id = %group.id,
            cycle_size = group.cycle_size,
            "Group created; creator enrolled at payout order 1"
        );

        Ok(group)
    }

    /// Records a member's contribution for the active cycle
    ///
    /// Valid only while the group is `collecting`; the amount must equal
    /// the group's weekly amount, and each member contributes at most once
    /// per cycle. When the contribution is the last one outstanding, the
    /// settlement runs inline in the same transaction.
    ///
    /// # Errors
    ///
    /// - `MembershipNotFound` / `GroupNotFound`
    /// - `GroupNotCollecting` outside the collecting status
    /// - `WrongContributionAmount` if the amount is off
    /// - `AlreadyContributed` on a second contribution in one cycle
    pub async fn record_contribution(
        &self,
        membership_id: Uuid,
        amount: i64,
        reference: Option<String>,
    ) -> Result<Transaction, GroupError> {
        let mut tx = self.pool.begin().await?;

        let membership = Membership::find_by_id(&mut *tx, membership_id)
            .await?
            .ok_or(GroupError::MembershipNotFound(membership_id))?;

        let group = Group::find_by_id_for_update(&mut *tx, membership.group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(membership.group_id))?;

        if group.status != GroupStatus::Collecting {
            return Err(GroupError::GroupNotCollecting(group.status));
        }
        if amount != group.weekly_amount {
            return Err(GroupError::WrongContributionAmount {
                expected: group.weekly_amount,
                got: amount,
            });
        }

        // The paid-flag CAS rejects a double contribution even if two
        // requests raced to the group lock.
        Membership::mark_paid(&mut *tx, membership.id)
            .await?
            .ok_or(GroupError::AlreadyContributed)?;

        let entry = Transaction::create(
            &mut *tx,
            CreateTransaction {
                membership_id: membership.id,
                amount,
                tx_type: TxType::Contribution,
                reference,
            },
        )
        .await?;

        if Membership::all_paid(&mut *tx, group.id).await? {
            Self::advance_cycle(&mut tx, &group).await?;
        }

        tx.commit().await?;

        debug!(
            membership_id = %membership.id,
            group_id = %group.id,
            amount,
            "Contribution recorded"
        );

        Ok(entry)
    }

    /// Runs the settlement check for a group
    ///
    /// Idempotent: when the group is not collecting, or any member still
    /// owes a contribution, nothing changes and the current group is
    /// returned.
    pub async fn settle(&self, group_id: Uuid) -> Result<Group, GroupError> {
        let mut tx = self.pool.begin().await?;

        let group = Group::find_by_id_for_update(&mut *tx, group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(group_id))?;

        if group.status != GroupStatus::Collecting || !Membership::all_paid(&mut *tx, group_id).await?
        {
            tx.commit().await?;
            debug!(group_id = %group_id, "Nothing to settle");
            return Ok(group);
        }

        let updated = Self::advance_cycle(&mut tx, &group).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Disburses the pool and advances the rotation
    ///
    /// Caller holds the group's row lock and has verified the group is
    /// collecting with all members paid.
    async fn advance_cycle(
        tx: &mut PgTransaction<'_, Postgres>,
        group: &Group,
    ) -> Result<Group, GroupError> {
        let group = apply_transition(&mut **tx, group, GroupStatus::Disbursing).await?;

        // Rotation is by ascending payout order: cycle N pays slot N + 1.
        let slot = group.current_cycle + 1;
        let recipient = Membership::find_by_payout_order(&mut **tx, group.id, slot)
            .await?
            .ok_or(GroupError::MissingRecipient { slot })?;

        Transaction::create(
            &mut **tx,
            CreateTransaction {
                membership_id: recipient.id,
                amount: group.total_pool_amount(),
                tx_type: TxType::Payout,
                reference: Some(format!("cycle-{slot}")),
            },
        )
        .await?;

        Membership::reset_paid_flags(&mut **tx, group.id).await?;

        let next = if group.current_cycle + 1 >= group.cycle_size {
            GroupStatus::Complete
        } else {
            GroupStatus::Collecting
        };
        if !GroupStatus::Disbursing.can_transition_to(next) {
            return Err(GroupError::InvalidTransition {
                from: GroupStatus::Disbursing,
                to: next,
            });
        }

        let updated = Group::complete_cycle(&mut **tx, group.id, next)
            .await?
            .ok_or(GroupError::InvalidTransition {
                from: GroupStatus::Disbursing,
                to: next,
            })?;

        info!(
            group_id = %updated.id,
            cycle = updated.current_cycle,
            recipient_order = slot,
            amount = updated.total_pool_amount(),
            status = updated.status.as_str(),
            "Cycle settled and pool disbursed"
        );

        Ok(updated)
    }
}
