//! Append-only transaction records.
//!
//! Transactions are created once per state-changing action and never mutated
//! afterwards, with one exception: redemption requests start `Pending` and are
//! transitioned to `Completed` or `Rejected` by the external review process.

use crate::currency::Currency;
use crate::ids::{OperatorId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    SpinWager,
    SpinWin,
    BonusBuy,
    DailyBonus,
    PrizePurchase,
    RedemptionRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Rejected,
}

/// One immutable ledger record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub user_id: PlayerId,
    pub operator_id: OperatorId,
    /// Signed net amount in the transaction's currency. Negative for wagers
    /// and debits, positive for wins and grants.
    pub amount: i64,
    pub currency: Currency,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub description: String,
    /// Unix seconds at creation.
    pub created_at: u64,
}
