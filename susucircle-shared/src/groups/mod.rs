/// Group coordination components
///
/// The three components every caller routes group mutations through:
///
/// - [`lifecycle`]: the status state machine and the cycle-advance /
///   settlement algorithm, the unit that ultimately mutates group state
/// - [`rotation`]: membership composition (join, leave, remove, delete)
///   and payout-order assignment
/// - [`invites`]: time-bounded single-use invitation codes
///
/// All three are stateless over the connection pool; every operation runs
/// in its own transaction and serializes on the group's row lock. The
/// shared [`error::GroupError`] taxonomy covers the lot.

pub mod error;
pub mod invites;
pub mod lifecycle;
pub mod rotation;

pub use error::GroupError;
pub use invites::{InvitationManager, InviteContact, DEFAULT_TTL_HOURS};
pub use lifecycle::LifecycleEngine;
pub use rotation::MembershipManager;
