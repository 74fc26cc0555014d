//! Per-player spin session and its explicit lifecycle state machine.
//!
//! The lifecycle is enforced server-side so the atomicity and cancellation
//! guarantees hold independent of any client: a spin moves
//! `Idle → AwaitingFairnessReveal → Settling → Complete`, or lands in
//! `Rejected` from anywhere. An out-of-order transition means the session is
//! corrupted and is treated as a fairness conflict.

use crate::error::EngineError;
use crate::fairness::FairnessSession;
use sweepstack_types::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinPhase {
    Idle,
    /// Commitment published, outcome not yet revealed.
    AwaitingFairnessReveal,
    /// Outcome revealed; the settlement batch is being committed.
    Settling,
    Complete,
    Rejected,
}

impl SpinPhase {
    fn can_transition_to(self, next: SpinPhase) -> bool {
        use SpinPhase::*;
        match (self, next) {
            (Idle | Complete | Rejected, AwaitingFairnessReveal) => true,
            (AwaitingFairnessReveal, Settling) => true,
            (Settling, Complete) => true,
            (_, Rejected) => true,
            _ => false,
        }
    }
}

/// One player's engine-side session: lifecycle phase plus fairness state.
pub struct PlayerSession {
    player: PlayerId,
    phase: SpinPhase,
    pub fairness: FairnessSession,
}

impl PlayerSession {
    pub fn new(player: PlayerId, client_seed: impl Into<String>) -> Self {
        Self {
            player,
            phase: SpinPhase::Idle,
            fairness: FairnessSession::new(client_seed),
        }
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    /// Advance the lifecycle. An illegal transition is session corruption.
    pub fn transition(&mut self, next: SpinPhase) -> Result<(), EngineError> {
        if !self.phase.can_transition_to(next) {
            self.phase = SpinPhase::Rejected;
            return Err(EngineError::NonceConflict {
                nonce: self.fairness.nonce(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Abort the in-flight spin: drop any unrevealed commitment and mark the
    /// session rejected. The consumed nonce is never reused.
    pub fn reject(&mut self) {
        self.fairness.abandon();
        self.phase = SpinPhase::Rejected;
    }
}
