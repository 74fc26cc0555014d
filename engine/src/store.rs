//! Persistence port.
//!
//! The engine reads and writes durable state through this trait only, per
//! entity id, with last-writer-wins semantics at the granularity of one
//! settlement. A settlement travels as a single [`WriteBatch`]; `commit`
//! applies the whole batch or none of it, and batches carrying a spin id are
//! idempotent: replaying an applied spin id is a no-op, which makes
//! persistence retries safe without recomputation.

use crate::audit::AuditLog;
use crate::ledger::TransactionLog;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use sweepstack_types::{
    AuditEntry, Game, GameId, Operator, OperatorId, PlayerId, Transaction, Wallet,
};

#[cfg(any(test, feature = "mocks"))]
use std::sync::atomic::AtomicUsize;

/// Everything one settlement (or bonus claim, or rejection record) writes.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    /// Idempotency key; batches without one (pure audit records) always apply.
    pub spin_id: Option<u64>,
    pub wallet: Option<(PlayerId, Wallet)>,
    pub operator: Option<Operator>,
    pub transactions: Vec<Transaction>,
    pub audit: Vec<AuditEntry>,
    /// UTC day marker for a daily bonus claim.
    pub daily_claim: Option<(PlayerId, u64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// The batch's spin id was already committed; nothing was re-applied.
    AlreadyApplied,
}

/// Durable-store operations the engine requires. Implementations supply
/// their own storage technology; [`MemoryStore`] defines the reference
/// semantics.
pub trait Store: Send + Sync {
    fn load_game(&self, id: &GameId) -> Result<Option<Game>>;
    fn load_wallet(&self, id: &PlayerId) -> Result<Option<Wallet>>;
    fn load_operator(&self, id: &OperatorId) -> Result<Option<Operator>>;
    /// UTC day of the player's last daily bonus claim, if any.
    fn last_daily_claim_day(&self, id: &PlayerId) -> Result<Option<u64>>;

    fn next_spin_id(&self) -> u64;
    fn next_transaction_id(&self) -> u64;
    fn next_audit_id(&self) -> u64;

    /// Apply a batch atomically. Rejection must leave no partial mutation
    /// visible.
    fn commit(&self, batch: &WriteBatch) -> Result<CommitOutcome>;

    /// Transaction history snapshot, newest first.
    fn transactions(&self) -> Vec<Transaction>;
    /// Audit log snapshot, newest first.
    fn audit_log(&self) -> Vec<AuditEntry>;
}

#[derive(Default)]
struct Entities {
    games: HashMap<GameId, Game>,
    wallets: HashMap<PlayerId, Wallet>,
    operators: HashMap<OperatorId, Operator>,
    daily_claims: HashMap<PlayerId, u64>,
    applied_spins: HashSet<u64>,
}

/// In-process store used by tests and as the reference implementation of the
/// port semantics.
pub struct MemoryStore {
    entities: Mutex<Entities>,
    transactions: TransactionLog,
    audit: AuditLog,
    next_spin_id: AtomicU64,
    next_transaction_id: AtomicU64,
    #[cfg(any(test, feature = "mocks"))]
    fail_commits: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entities: Mutex::new(Entities::default()),
            transactions: TransactionLog::default(),
            audit: AuditLog::default(),
            next_spin_id: AtomicU64::new(1),
            next_transaction_id: AtomicU64::new(1),
            #[cfg(any(test, feature = "mocks"))]
            fail_commits: AtomicUsize::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(self, game: Game) -> Self {
        self.entities
            .lock()
            .expect("store lock poisoned")
            .games
            .insert(game.id.clone(), game);
        self
    }

    pub fn with_wallet(self, player: PlayerId, wallet: Wallet) -> Self {
        self.entities
            .lock()
            .expect("store lock poisoned")
            .wallets
            .insert(player, wallet);
        self
    }

    pub fn with_operator(self, operator: Operator) -> Self {
        self.entities
            .lock()
            .expect("store lock poisoned")
            .operators
            .insert(operator.id.clone(), operator);
        self
    }

    /// Make the next `count` commits fail, for persistence-retry tests.
    #[cfg(any(test, feature = "mocks"))]
    pub fn inject_commit_failures(&self, count: usize) {
        self.fail_commits.store(count, Ordering::SeqCst);
    }
}

impl Store for MemoryStore {
    fn load_game(&self, id: &GameId) -> Result<Option<Game>> {
        Ok(self
            .entities
            .lock()
            .expect("store lock poisoned")
            .games
            .get(id)
            .cloned())
    }

    fn load_wallet(&self, id: &PlayerId) -> Result<Option<Wallet>> {
        Ok(self
            .entities
            .lock()
            .expect("store lock poisoned")
            .wallets
            .get(id)
            .cloned())
    }

    fn load_operator(&self, id: &OperatorId) -> Result<Option<Operator>> {
        Ok(self
            .entities
            .lock()
            .expect("store lock poisoned")
            .operators
            .get(id)
            .cloned())
    }

    fn last_daily_claim_day(&self, id: &PlayerId) -> Result<Option<u64>> {
        Ok(self
            .entities
            .lock()
            .expect("store lock poisoned")
            .daily_claims
            .get(id)
            .copied())
    }

    fn next_spin_id(&self) -> u64 {
        self.next_spin_id.fetch_add(1, Ordering::Relaxed)
    }

    fn next_transaction_id(&self) -> u64 {
        self.next_transaction_id.fetch_add(1, Ordering::Relaxed)
    }

    fn next_audit_id(&self) -> u64 {
        self.audit.next_id()
    }

    fn commit(&self, batch: &WriteBatch) -> Result<CommitOutcome> {
        #[cfg(any(test, feature = "mocks"))]
        {
            let remaining = self.fail_commits.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_commits.store(remaining - 1, Ordering::SeqCst);
                anyhow::bail!("injected commit failure");
            }
        }

        let mut entities = self.entities.lock().expect("store lock poisoned");
        if let Some(spin_id) = batch.spin_id {
            if !entities.applied_spins.insert(spin_id) {
                return Ok(CommitOutcome::AlreadyApplied);
            }
        }
        if let Some((player, wallet)) = &batch.wallet {
            entities.wallets.insert(player.clone(), wallet.clone());
        }
        if let Some(operator) = &batch.operator {
            entities
                .operators
                .insert(operator.id.clone(), operator.clone());
        }
        if let Some((player, day)) = &batch.daily_claim {
            entities.daily_claims.insert(player.clone(), *day);
        }
        for transaction in &batch.transactions {
            self.transactions.append(transaction.clone());
        }
        for entry in &batch.audit {
            self.audit.append(entry.clone());
        }
        Ok(CommitOutcome::Applied)
    }

    fn transactions(&self) -> Vec<Transaction> {
        self.transactions.snapshot()
    }

    fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.snapshot()
    }
}
