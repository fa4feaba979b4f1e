/// Rotation & membership manager
///
/// Governs who sits in a group's rotation: joining (directly or on behalf
/// of the invitation manager), leaving, removal by the admin, and deleting
/// a group that never started. Composition changes are only legal while a
/// group is `forming`; once collecting begins the roster is frozen for the
/// life of the group.
///
/// Joining is the sole normal-flow trigger for `forming → collecting`:
/// the join that fills the last rotation slot starts the group
/// automatically.
///
/// # Payout orders
///
/// A joiner takes payout order `member count + 1`. When a member leaves or
/// is removed (forming only), every higher order shifts down by one, so
/// the sequence stays dense 1..N and the next joiner's order never
/// collides.

use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use tracing::info;
use uuid::Uuid;

use super::error::GroupError;
use super::lifecycle::apply_transition;
use crate::models::group::{Group, GroupStatus};
use crate::models::membership::{CreateMembership, Membership};

/// Enrolls a user into a group inside an open transaction
///
/// Takes the group's row lock, so the capacity check and the insert are
/// serialized against every other mutation of the group: two joins racing
/// for the last slot cannot both win. The join that staffs the final slot
/// also starts the group.
///
/// Shared by [`MembershipManager::join`] and invitation redemption, which
/// must commit the join and the acceptance atomically.
pub(crate) async fn join_in_tx(
    tx: &mut PgTransaction<'_, Postgres>,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, GroupError> {
    let group = Group::find_by_id_for_update(&mut **tx, group_id)
        .await?
        .ok_or(GroupError::GroupNotFound(group_id))?;

    // Capacity before joinability: a fully staffed group has already left
    // forming, and a join against it reads as "full", not "wrong status".
    let count = Membership::count_by_group(&mut **tx, group_id).await?;
    if group.is_full(count) {
        return Err(GroupError::GroupFull {
            capacity: group.cycle_size,
        });
    }

    if !group.status.can_join() {
        return Err(GroupError::GroupNotJoinable(group.status));
    }

    if Membership::find(&mut **tx, group_id, user_id).await?.is_some() {
        return Err(GroupError::AlreadyMember);
    }

    let membership = Membership::create(
        &mut **tx,
        CreateMembership {
            group_id,
            user_id,
            payout_order: (count + 1) as i32,
        },
    )
    .await?;

    if group.can_start(count + 1) {
        apply_transition(&mut **tx, &group, GroupStatus::Collecting).await?;
        info!(
            group_id = %group_id,
            members = count + 1,
            "Rotation fully staffed; group is now collecting"
        );
    }

    Ok(membership)
}

/// The rotation & membership manager
pub struct MembershipManager {
    pool: PgPool,
}

impl MembershipManager {
    /// Creates a manager over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds a user to a group
    ///
    /// # Errors
    ///
    /// - `GroupNotFound` if the group doesn't exist
    /// - `GroupNotJoinable` outside the forming status
    /// - `GroupFull` when no rotation slot is open
    /// - `AlreadyMember` if the user already holds a seat
    pub async fn join(&self, group_id: Uuid, user_id: Uuid) -> Result<Membership, GroupError> {
        let mut tx = self.pool.begin().await?;
        let membership = join_in_tx(&mut tx, group_id, user_id).await?;
        tx.commit().await?;

        info!(
            group_id = %group_id,
            user_id = %user_id,
            payout_order = membership.payout_order,
            "Member joined"
        );

        Ok(membership)
    }

    /// Removes the caller's own membership
    ///
    /// # Errors
    ///
    /// - `NotMember` if the user holds no seat
    /// - `CreatorCannotLeave` for the admin (delete the group instead)
    /// - `GroupAlreadyActive` once the group has started
    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<(), GroupError> {
        let mut tx = self.pool.begin().await?;

        let group = Group::find_by_id_for_update(&mut *tx, group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(group_id))?;

        let membership = Membership::find(&mut *tx, group_id, user_id)
            .await?
            .ok_or(GroupError::NotMember)?;

        if group.is_admin(user_id) {
            return Err(GroupError::CreatorCannotLeave);
        }
        if group.status != GroupStatus::Forming {
            return Err(GroupError::GroupAlreadyActive(group.status));
        }

        Membership::delete(&mut *tx, membership.id).await?;
        Membership::renumber_after_departure(&mut *tx, group_id, membership.payout_order).await?;

        tx.commit().await?;

        info!(group_id = %group_id, user_id = %user_id, "Member left");
        Ok(())
    }

    /// Removes another member on the admin's behalf
    ///
    /// # Errors
    ///
    /// - `NotAdmin` if the actor is not the creator
    /// - `CannotRemoveCreator` if the target is the creator
    /// - `GroupAlreadyActive` once the group has started
    /// - `NotMember` if the target holds no seat
    pub async fn remove(
        &self,
        group_id: Uuid,
        admin_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<(), GroupError> {
        let mut tx = self.pool.begin().await?;

        let group = Group::find_by_id_for_update(&mut *tx, group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(group_id))?;

        if !group.is_admin(admin_id) {
            return Err(GroupError::NotAdmin);
        }
        if target_user_id == group.created_by {
            return Err(GroupError::CannotRemoveCreator);
        }
        if group.status != GroupStatus::Forming {
            return Err(GroupError::GroupAlreadyActive(group.status));
        }

        let membership = Membership::find(&mut *tx, group_id, target_user_id)
            .await?
            .ok_or(GroupError::NotMember)?;

        Membership::delete(&mut *tx, membership.id).await?;
        Membership::renumber_after_departure(&mut *tx, group_id, membership.payout_order).await?;

        tx.commit().await?;

        info!(
            group_id = %group_id,
            removed_user = %target_user_id,
            "Member removed by admin"
        );
        Ok(())
    }

    /// Deletes a group that never started
    ///
    /// Memberships and invitations go with it (cascade). Groups that have
    /// collected anything are permanent record and cannot be deleted.
    ///
    /// # Errors
    ///
    /// - `NotAdmin` if the actor is not the creator
    /// - `GroupAlreadyActive` once the group has started
    pub async fn delete_group(&self, group_id: Uuid, admin_id: Uuid) -> Result<(), GroupError> {
        let mut tx = self.pool.begin().await?;

        let group = Group::find_by_id_for_update(&mut *tx, group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(group_id))?;

        if !group.is_admin(admin_id) {
            return Err(GroupError::NotAdmin);
        }
        if group.status != GroupStatus::Forming {
            return Err(GroupError::GroupAlreadyActive(group.status));
        }

        Group::delete(&mut *tx, group_id).await?;
        tx.commit().await?;

        info!(group_id = %group_id, "Group deleted while forming");
        Ok(())
    }
}
