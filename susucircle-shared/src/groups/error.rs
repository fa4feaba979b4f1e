/// Error taxonomy for group operations
///
/// One enum covers the lifecycle engine, the membership manager, and the
/// invitation manager, split along the lines the API layer cares about:
///
/// - **Validation**: bad input shape, rejected before any read or write
/// - **State conflict**: a business rule blocked the operation; always
///   checked before any write, never partially applied
/// - **Not found**: the referenced entity does not exist (distinct from a
///   conflict)
/// - **Integrity**: the store reports a state the invariants forbid
/// - **Database**: passthrough from the entity store; unique-constraint
///   violations are translated to the matching conflict at the API layer

use uuid::Uuid;

use crate::models::group::GroupStatus;

/// Error type for lifecycle, membership, and invitation operations
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    // -- not found ---------------------------------------------------------
    /// Group does not exist
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// User does not exist
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Membership does not exist
    #[error("Membership not found: {0}")]
    MembershipNotFound(Uuid),

    /// Invitation does not exist
    #[error("Invitation not found: {0}")]
    InvitationNotFound(Uuid),

    /// No invitation carries this code
    #[error("Invalid invitation code")]
    InvalidCode,

    // -- state conflicts ---------------------------------------------------
    /// The requested status change is not in the transition table
    #[error("Invalid transition: {from:?} → {to:?}")]
    InvalidTransition { from: GroupStatus, to: GroupStatus },

    /// Group is no longer accepting members
    #[error("Group is not accepting members (status: {0:?})")]
    GroupNotJoinable(GroupStatus),

    /// Every rotation slot is taken
    #[error("Group is full ({capacity} members)")]
    GroupFull { capacity: i32 },

    /// The user already holds a membership in this group
    #[error("Already a member of this group")]
    AlreadyMember,

    /// The user holds no membership in this group
    #[error("Not a member of this group")]
    NotMember,

    /// The creator cannot leave their own group
    #[error("Group creators cannot leave their own group")]
    CreatorCannotLeave,

    /// The creator cannot be removed from their own group
    #[error("The group creator cannot be removed")]
    CannotRemoveCreator,

    /// The operation is only legal while the group is forming
    #[error("Group has already started (status: {0:?})")]
    GroupAlreadyActive(GroupStatus),

    /// Only the group admin may perform this operation
    #[error("Only the group admin may do this")]
    NotAdmin,

    /// The actor is neither the inviter nor the group admin
    #[error("Not authorized for this invitation")]
    NotAuthorized,

    /// The invitation lapsed before redemption
    #[error("Invitation has expired")]
    InvitationExpired,

    /// The invitation was already accepted or cancelled
    #[error("Invitation is no longer pending")]
    InvitationNotPending,

    /// Contributions are only accepted while collecting
    #[error("Group is not collecting contributions (status: {0:?})")]
    GroupNotCollecting(GroupStatus),

    /// The member already contributed for the active cycle
    #[error("Contribution already recorded for this cycle")]
    AlreadyContributed,

    // -- validation --------------------------------------------------------
    /// A rotation needs at least two slots
    #[error("Cycle size must be at least 2 (got {0})")]
    InvalidCycleSize(i32),

    /// The contribution amount must be positive
    #[error("Amount must be positive (got {0})")]
    InvalidAmount(i64),

    /// Contributions are fixed at the group's weekly amount
    #[error("Contribution must equal the weekly amount (expected {expected}, got {got})")]
    WrongContributionAmount { expected: i64, got: i64 },

    /// An invitation needs an email or a phone number to address
    #[error("Provide an email or a phone number for the invitee")]
    MissingContact,

    /// The invitation lifetime must be positive
    #[error("Invitation lifetime must be positive (got {0} hours)")]
    InvalidTtl(i64),

    // -- integrity ---------------------------------------------------------
    /// No membership holds the rotation slot due a payout
    #[error("No member holds rotation slot {slot}")]
    MissingRecipient { slot: i32 },

    // -- store -------------------------------------------------------------
    /// Entity store failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GroupError::GroupFull { capacity: 5 };
        assert_eq!(err.to_string(), "Group is full (5 members)");

        let err = GroupError::InvalidTransition {
            from: GroupStatus::Forming,
            to: GroupStatus::Complete,
        };
        assert_eq!(err.to_string(), "Invalid transition: Forming → Complete");

        let err = GroupError::WrongContributionAmount {
            expected: 20_000,
            got: 15_000,
        };
        assert_eq!(
            err.to_string(),
            "Contribution must equal the weekly amount (expected 20000, got 15000)"
        );
    }
}
