/// Transaction model: the append-only money ledger
///
/// Every contribution and every payout is recorded as a Transaction owned
/// by a Membership. Rows are never updated or deleted; settlement and
/// history both read from this ledger of record, so this module
/// deliberately exposes no mutation beyond insert.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE transaction_type AS ENUM ('contribution', 'payout');
///
/// CREATE TABLE transactions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     membership_id UUID NOT NULL REFERENCES memberships(id) ON DELETE CASCADE,
///     amount BIGINT NOT NULL CHECK (amount > 0),
///     tx_type transaction_type NOT NULL,
///     reference VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Amounts are minor currency units, matching `groups.weekly_amount`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    /// Member paid into the pool
    Contribution,

    /// Pool paid out to the cycle's recipient
    Payout,
}

impl TxType {
    /// Converts type to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Contribution => "contribution",
            TxType::Payout => "payout",
        }
    }
}

/// A single ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: Uuid,

    /// Membership the entry belongs to
    pub membership_id: Uuid,

    /// Amount in minor currency units
    pub amount: i64,

    /// Contribution or payout
    pub tx_type: TxType,

    /// Optional payment reference
    pub reference: Option<String>,

    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for appending a ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransaction {
    /// Membership the entry belongs to
    pub membership_id: Uuid,

    /// Amount in minor currency units
    pub amount: i64,

    /// Contribution or payout
    pub tx_type: TxType,

    /// Optional payment reference
    pub reference: Option<String>,
}

impl Transaction {
    /// Appends a ledger entry
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateTransaction,
    ) -> Result<Self, sqlx::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (membership_id, amount, tx_type, reference)
            VALUES ($1, $2, $3, $4)
            RETURNING id, membership_id, amount, tx_type, reference, created_at
            "#,
        )
        .bind(data.membership_id)
        .bind(data.amount)
        .bind(data.tx_type)
        .bind(data.reference)
        .fetch_one(executor)
        .await?;

        Ok(transaction)
    }

    /// Lists a membership's ledger entries, oldest first
    pub async fn list_by_membership(
        pool: &PgPool,
        membership_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, membership_id, amount, tx_type, reference, created_at
            FROM transactions
            WHERE membership_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(membership_id)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    /// Lists every ledger entry for a group, oldest first
    pub async fn list_by_group(pool: &PgPool, group_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT t.id, t.membership_id, t.amount, t.tx_type, t.reference, t.created_at
            FROM transactions t
            JOIN memberships m ON m.id = t.membership_id
            WHERE m.group_id = $1
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    /// Counts payout entries for a group
    ///
    /// Used by tests and invariant checks: over a full rotation this must
    /// equal the group's cycle size, one payout per cycle.
    pub async fn count_payouts_by_group(
        executor: impl PgExecutor<'_>,
        group_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM transactions t
            JOIN memberships m ON m.id = t.membership_id
            WHERE m.group_id = $1 AND t.tx_type = 'payout'
            "#,
        )
        .bind(group_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_type_as_str() {
        assert_eq!(TxType::Contribution.as_str(), "contribution");
        assert_eq!(TxType::Payout.as_str(), "payout");
    }
}
