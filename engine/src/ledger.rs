//! Wallet settlement and the bounded transaction log.
//!
//! `prepare_settlement` computes the complete effect of one spin (wallet
//! after, transaction record, operator accrual) without touching any shared
//! state. The orchestrator stages the result into a single write batch and
//! commits it atomically through the persistence port, so a settlement either
//! applies in full or not at all, and a persistence retry replays the exact
//! same precomputed values.

use crate::error::EngineError;
use std::collections::VecDeque;
use std::sync::Mutex;
use sweepstack_types::constants::TRANSACTION_LOG_RETENTION;
use sweepstack_types::{
    Currency, Operator, OperatorId, PlayerId, Transaction, TransactionKind, TransactionStatus,
    Wallet,
};

/// Fully computed effect of one settled spin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub spin_id: u64,
    pub player: PlayerId,
    pub operator: OperatorId,
    pub currency: Currency,
    pub cost: u64,
    pub payout: u64,
    /// Signed net applied to the targeted balance.
    pub net: i64,
    pub wallet_after: Wallet,
    pub operator_after: Operator,
    pub transaction: Transaction,
}

/// Inputs that identify one settlement; ids come from the persistence port so
/// a retried settlement keeps its identity.
pub struct SettlementIds {
    pub spin_id: u64,
    pub transaction_id: u64,
}

#[allow(clippy::too_many_arguments)]
pub fn prepare_settlement(
    ids: SettlementIds,
    player: &PlayerId,
    wallet: &Wallet,
    operator: &Operator,
    currency: Currency,
    cost: u64,
    payout: u64,
    kind: Option<TransactionKind>,
    description: impl Into<String>,
    now: u64,
) -> Result<Settlement, EngineError> {
    let balance = wallet.balance(currency);
    if balance < cost {
        return Err(EngineError::InsufficientFunds {
            currency,
            balance,
            required: cost,
        });
    }

    let net = payout as i64 - cost as i64;
    let mut wallet_after = wallet.clone();
    wallet_after
        .apply_net(currency, net)
        .map_err(|_| EngineError::InsufficientFunds {
            currency,
            balance,
            required: cost,
        })?;

    let mut operator_after = operator.clone();
    operator_after.accrue_wager(cost);

    let kind = kind.unwrap_or(if net >= 0 {
        TransactionKind::SpinWin
    } else {
        TransactionKind::SpinWager
    });
    let transaction = Transaction {
        id: ids.transaction_id,
        user_id: player.clone(),
        operator_id: operator.id.clone(),
        amount: net,
        currency,
        kind,
        status: TransactionStatus::Completed,
        description: description.into(),
        created_at: now,
    };

    Ok(Settlement {
        spin_id: ids.spin_id,
        player: player.clone(),
        operator: operator.id.clone(),
        currency,
        cost,
        payout,
        net,
        wallet_after,
        operator_after,
        transaction,
    })
}

/// Append-only transaction history, ring-bounded and newest-first like the
/// audit log.
pub struct TransactionLog {
    entries: Mutex<VecDeque<Transaction>>,
    retention: usize,
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::with_retention(TRANSACTION_LOG_RETENTION)
    }
}

impl TransactionLog {
    pub fn with_retention(retention: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            retention,
        }
    }

    pub fn append(&self, transaction: Transaction) {
        let mut entries = self.entries.lock().expect("transaction log lock poisoned");
        entries.push_front(transaction);
        entries.truncate(self.retention);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("transaction log lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot, newest first.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.entries
            .lock()
            .expect("transaction log lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}
