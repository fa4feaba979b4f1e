/// Invitation manager
///
/// Issues, redeems, and cancels the single-use codes that grant join
/// rights to a group. Codes are 8 uppercase-alphanumeric characters drawn
/// by rejection sampling: a candidate is checked against the store inside
/// the same transaction as the insert, and the loop only terminates on a
/// genuine non-collision (the unique constraint backstops the last-instant
/// race).
///
/// Redemption reuses the membership manager's join logic and marks the
/// invitation accepted in the same transaction, so an accepted invitation
/// implies a committed membership and vice versa.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::GroupError;
use super::rotation::join_in_tx;
use crate::models::group::Group;
use crate::models::invitation::{CreateInvitation, GroupInvitation, InvitationStatus};
use crate::models::membership::Membership;

/// Default invitation lifetime
pub const DEFAULT_TTL_HOURS: i64 = 48;

/// Who the invitation is addressed to
///
/// At least one of email or phone is required; the name is cosmetic.
#[derive(Debug, Clone, Default)]
pub struct InviteContact {
    /// Invitee email
    pub email: Option<String>,

    /// Invitee phone
    pub phone: Option<String>,

    /// Invitee display name
    pub name: Option<String>,
}

/// The invitation manager
pub struct InvitationManager {
    pool: PgPool,
}

impl InvitationManager {
    /// Creates a manager over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issues an invitation to a group
    ///
    /// The inviter must be the admin or an existing member. The code is
    /// generated fresh and guaranteed absent from the store at insert
    /// time.
    ///
    /// # Errors
    ///
    /// - `MissingContact` if neither email nor phone is given
    /// - `InvalidTtl` for a non-positive lifetime
    /// - `GroupNotFound` / `NotAuthorized`
    pub async fn create_invitation(
        &self,
        group_id: Uuid,
        inviter_id: Uuid,
        contact: InviteContact,
        ttl_hours: Option<i64>,
    ) -> Result<GroupInvitation, GroupError> {
        if contact.email.is_none() && contact.phone.is_none() {
            return Err(GroupError::MissingContact);
        }
        let ttl = ttl_hours.unwrap_or(DEFAULT_TTL_HOURS);
        if ttl <= 0 {
            return Err(GroupError::InvalidTtl(ttl));
        }

        let mut tx = self.pool.begin().await?;

        let group = Group::find_by_id(&mut *tx, group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(group_id))?;

        if !group.is_admin(inviter_id)
            && Membership::find(&mut *tx, group_id, inviter_id).await?.is_none()
        {
            return Err(GroupError::NotAuthorized);
        }

        // Rejection sampling: retry until the candidate is absent. The
        // check and the insert share the transaction.
        let code = loop {
            let candidate = GroupInvitation::random_code();
            if !GroupInvitation::code_exists(&mut *tx, &candidate).await? {
                break candidate;
            }
            debug!("Invitation code collision; resampling");
        };

        let invitation = GroupInvitation::create(
            &mut *tx,
            CreateInvitation {
                group_id,
                invited_by: inviter_id,
                code,
                invited_email: contact.email,
                invited_phone: contact.phone,
                invited_name: contact.name,
                expires_at: Utc::now() + Duration::hours(ttl),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            group_id = %group_id,
            invitation_id = %invitation.id,
            expires_at = %invitation.expires_at,
            "Invitation issued"
        );

        Ok(invitation)
    }

    /// Redeems an invitation code, joining the bearer to the group
    ///
    /// The membership insert and the acceptance write commit together. An
    /// expired invitation fails redemption but its stored status stays
    /// `pending`; lapse is a property of the clock, not a row write.
    ///
    /// # Errors
    ///
    /// - `InvalidCode` if the code is unknown
    /// - `InvitationNotPending` / `InvitationExpired` if it cannot be used
    /// - the join errors (`GroupFull`, `AlreadyMember`, `GroupNotJoinable`)
    pub async fn redeem(&self, code: &str, user_id: Uuid) -> Result<Membership, GroupError> {
        let mut tx = self.pool.begin().await?;

        let invitation = GroupInvitation::find_by_code_for_update(&mut *tx, code)
            .await?
            .ok_or(GroupError::InvalidCode)?;

        if invitation.status != InvitationStatus::Pending {
            return Err(GroupError::InvitationNotPending);
        }
        if invitation.is_expired(Utc::now()) {
            return Err(GroupError::InvitationExpired);
        }

        let membership = join_in_tx(&mut tx, invitation.group_id, user_id).await?;

        GroupInvitation::mark_accepted(&mut *tx, invitation.id, user_id)
            .await?
            .ok_or(GroupError::InvitationNotPending)?;

        tx.commit().await?;

        info!(
            invitation_id = %invitation.id,
            group_id = %invitation.group_id,
            user_id = %user_id,
            "Invitation redeemed"
        );

        Ok(membership)
    }

    /// Cancels a pending invitation
    ///
    /// Only the original inviter or the group admin may cancel. An
    /// invitation that is already accepted or cancelled cannot be
    /// cancelled again.
    ///
    /// # Errors
    ///
    /// - `InvitationNotFound` / `NotAuthorized`
    /// - `InvitationNotPending` if the invitation is already terminal
    pub async fn cancel(&self, invitation_id: Uuid, actor_id: Uuid) -> Result<(), GroupError> {
        let mut tx = self.pool.begin().await?;

        let invitation = GroupInvitation::find_by_id(&mut *tx, invitation_id)
            .await?
            .ok_or(GroupError::InvitationNotFound(invitation_id))?;

        let group = Group::find_by_id(&mut *tx, invitation.group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(invitation.group_id))?;

        if invitation.invited_by != actor_id && !group.is_admin(actor_id) {
            return Err(GroupError::NotAuthorized);
        }

        GroupInvitation::mark_cancelled(&mut *tx, invitation.id)
            .await?
            .ok_or(GroupError::InvitationNotPending)?;

        tx.commit().await?;

        info!(invitation_id = %invitation_id, "Invitation cancelled");
        Ok(())
    }

    /// Lists a group's invitations for a member or the admin
    pub async fn list_for_group(
        &self,
        group_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<GroupInvitation>, GroupError> {
        let group = Group::find_by_id(&self.pool, group_id)
            .await?
            .ok_or(GroupError::GroupNotFound(group_id))?;

        if !group.is_admin(viewer_id)
            && Membership::find(&self.pool, group_id, viewer_id).await?.is_none()
        {
            return Err(GroupError::NotAuthorized);
        }

        Ok(GroupInvitation::list_by_group(&self.pool, group_id).await?)
    }
}
