//! Engine error kinds and their propagation classes.

use sweepstack_types::{Currency, GameId, OperatorId, PlayerId};
use thiserror::Error;

/// Everything a spin (or bonus claim) can fail with.
///
/// Validation errors are recoverable and produce no side effects beyond a
/// rejection audit record. Integrity violations abort the spin entirely and
/// are additionally audited as security-relevant anomalies. A persistence
/// failure is retried with the identical precomputed settlement (keyed by
/// spin id), never recomputed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid bet {bet} (minimum {min_bet})")]
    InvalidBet { bet: u64, min_bet: u64 },

    #[error("insufficient {currency} balance: have {balance}, need {required}")]
    InsufficientFunds {
        currency: Currency,
        balance: u64,
        required: u64,
    },

    /// The fairness session is corrupted (nonce reuse, regression, or an
    /// abandoned in-flight commitment). Fatal to the session.
    #[error("fairness session corrupted for nonce {nonce}")]
    NonceConflict { nonce: u64 },

    /// The revealed seed did not reproduce the published commitment. The spin
    /// is discarded with no settlement.
    #[error("fairness verification failed at nonce {nonce}: commitment mismatch")]
    FairnessVerificationFailed { nonce: u64 },

    /// The durable store rejected the settlement. No partial wallet mutation
    /// is visible; the caller should retry the same spin id.
    #[error("persistence rejected settlement for spin {spin_id}: {reason}")]
    PersistenceWriteFailed { spin_id: u64, reason: String },

    #[error("game not found: {0}")]
    GameNotFound(GameId),

    #[error("game {0} is not published")]
    GameNotPlayable(GameId),

    #[error("wallet not found for player {0}")]
    WalletNotFound(PlayerId),

    #[error("operator not found: {0}")]
    OperatorNotFound(OperatorId),

    #[error("daily bonus already claimed today")]
    DailyBonusAlreadyClaimed,

    #[error("no pending settlement for spin {0}")]
    NoPendingSettlement(u64),

    /// A prior settlement for this player still awaits replay. No new
    /// balance-affecting operation may interleave with it.
    #[error("settlement for spin {spin_id} is awaiting replay")]
    SettlementPending { spin_id: u64 },

    #[error("redemption amount must be greater than zero")]
    InvalidRedemption,

    /// The durable store failed while loading engine inputs.
    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Integrity violations are audited as security anomalies and terminate
    /// the fairness session.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            EngineError::NonceConflict { .. } | EngineError::FairnessVerificationFailed { .. }
        )
    }

    /// Recoverable request validation failures: reported to the caller, no
    /// state mutated.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidBet { .. }
                | EngineError::InsufficientFunds { .. }
                | EngineError::GameNotFound(_)
                | EngineError::GameNotPlayable(_)
                | EngineError::WalletNotFound(_)
                | EngineError::OperatorNotFound(_)
                | EngineError::DailyBonusAlreadyClaimed
                | EngineError::InvalidRedemption
        )
    }
}
