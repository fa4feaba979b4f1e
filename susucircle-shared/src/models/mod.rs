/// Database models for SusuCircle
///
/// Each model owns its table's repository operations as inherent async
/// methods. Methods the lifecycle engine calls inside its transactions are
/// generic over `sqlx::PgExecutor`, so they accept both a pool and an open
/// transaction.
///
/// # Entity ownership
///
/// ```text
/// User ─┬─ creates ──> Group ─┬─ owns ──> Membership ── owns ──> Transaction
///       └─ holds ─────────────┴─ owns ──> GroupInvitation
/// ```
///
/// A group cascade-owns its memberships and invitations; a membership owns
/// its transactions (append-only).

pub mod group;
pub mod invitation;
pub mod membership;
pub mod transaction;
pub mod user;
