//! Spin orchestration.
//!
//! Composes fairness generation, reel selection, paytable evaluation, and
//! wallet settlement into one synchronous request/response cycle per spin.
//! Spins for one player are serialized through a per-player session lock;
//! different players proceed fully in parallel. Nothing yields between the
//! reel draw and the settlement commit; that span is the atomicity boundary.

use crate::error::EngineError;
use crate::fairness;
use crate::ledger::{prepare_settlement, SettlementIds};
use crate::paytable::evaluate;
use crate::reels::{draw_paying_reels, draw_reels};
use crate::session::{PlayerSession, SpinPhase};
use crate::store::{Store, WriteBatch};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use sweepstack_types::constants::SECONDS_PER_DAY;
use sweepstack_types::{
    AuditEntry, Currency, Game, Operator, OperatorId, PlayerId, SpinOutcome, SpinRequest,
    Transaction, TransactionKind, TransactionStatus, VerifyRequest, Wallet,
};
use tracing::{debug, info, warn};

/// Trusted identity context supplied by the identity boundary.
#[derive(Clone, Debug)]
pub struct SpinContext {
    pub player: PlayerId,
    pub operator: OperatorId,
}

struct PendingSettlement {
    player: PlayerId,
    batch: WriteBatch,
    outcome: SpinOutcome,
}

/// The engine facade: one instance serves all players of all tenants.
pub struct SpinEngine<S: Store> {
    store: Arc<S>,
    sessions: Mutex<HashMap<PlayerId, Arc<Mutex<PlayerSession>>>>,
    /// Settlements the store rejected, kept verbatim for idempotent retry.
    pending: Mutex<HashMap<u64, PendingSettlement>>,
}

impl<S: Store> SpinEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Public verification contract: recompute the commitment independently
    /// of the engine.
    pub fn verify(request: &VerifyRequest) -> bool {
        fairness::verify(
            &request.server_seed,
            &request.client_seed,
            request.nonce,
            &request.claimed_hash,
        )
    }

    /// One spin, including the bonus-buy variant.
    pub fn spin(
        &self,
        ctx: &SpinContext,
        request: &SpinRequest,
        now: u64,
    ) -> Result<SpinOutcome, EngineError> {
        let handle = self.session_handle(&ctx.player, &request.client_seed);
        let mut session = handle.lock().expect("player session lock poisoned");
        session.fairness.adopt_client_seed(&request.client_seed);
        if let Some(pending_id) = self.pending_spin_for(&ctx.player) {
            // An unreplayed settlement exists; a newer one would overwrite
            // its wallet state (or be overwritten by the replay).
            return Err(EngineError::SettlementPending {
                spin_id: pending_id,
            });
        }

        // Validation happens before any fairness material is consumed.
        let game = self.load_game(request)?;
        if request.bet == 0 || request.bet < game.min_bet {
            let err = EngineError::InvalidBet {
                bet: request.bet,
                min_bet: game.min_bet,
            };
            self.record_rejection(ctx, &err, now);
            return Err(err);
        }
        let cost = if request.bonus_buy {
            request
                .bet
                .checked_mul(game.math.bonus_multiplier())
                .ok_or(EngineError::InvalidBet {
                    bet: request.bet,
                    min_bet: game.min_bet,
                })?
        } else {
            request.bet
        };

        let wallet = self.load_wallet(&ctx.player)?;
        let operator = self.load_operator(&ctx.operator)?;
        let balance = wallet.balance(request.currency);
        if balance < cost {
            let err = EngineError::InsufficientFunds {
                currency: request.currency,
                balance,
                required: cost,
            };
            self.record_rejection(ctx, &err, now);
            return Err(err);
        }

        // Commit phase: fresh seed, next nonce, published commitment.
        if let Err(err) = session.transition(SpinPhase::AwaitingFairnessReveal) {
            return Err(self.abort_corrupted(ctx, &mut session, err, now));
        }
        if let Some(err) = session.fairness.begin_spin().err() {
            return Err(self.abort_corrupted(ctx, &mut session, err, now));
        }

        // Draw and evaluate, all inside the synchronous atomicity span.
        let mut stream = match session.fairness.stream() {
            Ok(stream) => stream,
            Err(err) => return Err(self.abort_corrupted(ctx, &mut session, err, now)),
        };
        let result_reels = if request.bonus_buy {
            draw_paying_reels(&game.math, &mut stream)
        } else {
            draw_reels(&game.math, &mut stream)
        };
        let payout = evaluate(&result_reels, &game.math.paytable, request.bet);

        if let Err(err) = session.transition(SpinPhase::Settling) {
            return Err(self.abort_corrupted(ctx, &mut session, err, now));
        }
        let record = match session.fairness.reveal(result_reels.clone()) {
            Ok(record) => record,
            Err(err) => return Err(self.abort_corrupted(ctx, &mut session, err, now)),
        };
        debug!(
            player = %ctx.player,
            nonce = record.nonce,
            commitment = %record.commitment,
            "fairness record revealed"
        );

        // Settlement is precomputed in full, then committed as one batch.
        let ids = SettlementIds {
            spin_id: self.store.next_spin_id(),
            transaction_id: self.store.next_transaction_id(),
        };
        let kind = request.bonus_buy.then_some(TransactionKind::BonusBuy);
        let description = if request.bonus_buy {
            format!("Bonus buy on {}", game.name)
        } else {
            format!("Spin on {}", game.name)
        };
        let settlement = prepare_settlement(
            ids,
            &ctx.player,
            &wallet,
            &operator,
            request.currency,
            cost,
            payout,
            kind,
            description,
            now,
        )?;

        let audit_entry = AuditEntry {
            id: self.store.next_audit_id(),
            action: "GAME_SPIN".to_string(),
            actor_id: ctx.player.clone(),
            details: format!(
                "game: {}, delta: {} {}",
                game.name, settlement.net, request.currency
            ),
            created_at: now,
        };
        let batch = WriteBatch {
            spin_id: Some(settlement.spin_id),
            wallet: Some((ctx.player.clone(), settlement.wallet_after.clone())),
            operator: Some(settlement.operator_after.clone()),
            transactions: vec![settlement.transaction.clone()],
            audit: vec![audit_entry],
            daily_claim: None,
        };
        let outcome = SpinOutcome {
            spin_id: settlement.spin_id,
            result_reels,
            cost,
            payout,
            fairness: record,
            wallet: settlement.wallet_after.clone(),
        };

        if let Err(reason) = self.store.commit(&batch) {
            // The session stays in Settling; the identical batch is kept for
            // replay so a retry cannot double-charge.
            warn!(
                player = %ctx.player,
                spin_id = settlement.spin_id,
                %reason,
                "settlement commit rejected, queued for retry"
            );
            let spin_id = settlement.spin_id;
            self.pending.lock().expect("pending lock poisoned").insert(
                spin_id,
                PendingSettlement {
                    player: ctx.player.clone(),
                    batch,
                    outcome,
                },
            );
            return Err(EngineError::PersistenceWriteFailed {
                spin_id,
                reason: reason.to_string(),
            });
        }

        if let Err(err) = session.transition(SpinPhase::Complete) {
            return Err(self.abort_corrupted(ctx, &mut session, err, now));
        }
        info!(
            player = %ctx.player,
            game = %game.id,
            spin_id = outcome.spin_id,
            cost,
            payout,
            currency = %request.currency,
            "spin settled"
        );
        Ok(outcome)
    }

    /// Replay a settlement the store previously rejected. The exact computed
    /// batch is committed again; nothing is recomputed.
    pub fn retry_settlement(&self, spin_id: u64) -> Result<SpinOutcome, EngineError> {
        let player = {
            let pending = self.pending.lock().expect("pending lock poisoned");
            pending
                .get(&spin_id)
                .map(|entry| entry.player.clone())
                .ok_or(EngineError::NoPendingSettlement(spin_id))?
        };

        // The player's session lock is held across the replay commit so no
        // spin can interleave with it.
        let handle = self.session_handle(&player, "");
        let mut session = handle.lock().expect("player session lock poisoned");

        let (batch, outcome) = {
            let pending = self.pending.lock().expect("pending lock poisoned");
            let entry = pending
                .get(&spin_id)
                .ok_or(EngineError::NoPendingSettlement(spin_id))?;
            (entry.batch.clone(), entry.outcome.clone())
        };
        self.store
            .commit(&batch)
            .map_err(|reason| EngineError::PersistenceWriteFailed {
                spin_id,
                reason: reason.to_string(),
            })?;
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .remove(&spin_id);

        // Release the session for the next spin.
        if session.phase() == SpinPhase::Settling {
            session.transition(SpinPhase::Complete)?;
        }
        info!(player = %player, spin_id, "settlement replayed");
        Ok(outcome)
    }

    /// Credit the operator-configured daily bonus, once per UTC day.
    pub fn claim_daily_bonus(&self, ctx: &SpinContext, now: u64) -> Result<Wallet, EngineError> {
        let handle = self.session_handle(&ctx.player, "");
        let _session = handle.lock().expect("player session lock poisoned");
        if let Some(pending_id) = self.pending_spin_for(&ctx.player) {
            return Err(EngineError::SettlementPending {
                spin_id: pending_id,
            });
        }

        let day = now / SECONDS_PER_DAY;
        let last = self
            .store
            .last_daily_claim_day(&ctx.player)
            .map_err(store_err)?;
        if last == Some(day) {
            return Err(EngineError::DailyBonusAlreadyClaimed);
        }

        let mut wallet = self.load_wallet(&ctx.player)?;
        let operator = self.load_operator(&ctx.operator)?;
        let claim_id = self.store.next_spin_id();
        let mut transactions = Vec::new();
        for (currency, amount) in [
            (Currency::GoldCoins, operator.bonus.daily_gc),
            (Currency::SweepsCoins, operator.bonus.daily_sc),
        ] {
            if amount == 0 {
                continue;
            }
            wallet.credit(currency, amount);
            transactions.push(Transaction {
                id: self.store.next_transaction_id(),
                user_id: ctx.player.clone(),
                operator_id: ctx.operator.clone(),
                amount: amount as i64,
                currency,
                kind: TransactionKind::DailyBonus,
                status: TransactionStatus::Completed,
                description: "Daily bonus claim".to_string(),
                created_at: now,
            });
        }

        let audit_entry = AuditEntry {
            id: self.store.next_audit_id(),
            action: "DAILY_BONUS".to_string(),
            actor_id: ctx.player.clone(),
            details: format!(
                "granted {} GC, {} SC",
                operator.bonus.daily_gc, operator.bonus.daily_sc
            ),
            created_at: now,
        };
        let batch = WriteBatch {
            spin_id: Some(claim_id),
            wallet: Some((ctx.player.clone(), wallet.clone())),
            operator: None,
            transactions,
            audit: vec![audit_entry],
            daily_claim: Some((ctx.player.clone(), day)),
        };
        self.store
            .commit(&batch)
            .map_err(|reason| EngineError::PersistenceWriteFailed {
                spin_id: claim_id,
                reason: reason.to_string(),
            })?;
        info!(player = %ctx.player, day, "daily bonus claimed");
        Ok(wallet)
    }

    /// Debit sweeps coins and open a pending redemption request; approval or
    /// rejection is the external review process's concern.
    pub fn request_redemption(
        &self,
        ctx: &SpinContext,
        amount: u64,
        now: u64,
    ) -> Result<Transaction, EngineError> {
        let handle = self.session_handle(&ctx.player, "");
        let _session = handle.lock().expect("player session lock poisoned");
        if let Some(pending_id) = self.pending_spin_for(&ctx.player) {
            return Err(EngineError::SettlementPending {
                spin_id: pending_id,
            });
        }
        if amount == 0 {
            let err = EngineError::InvalidRedemption;
            self.record_rejection(ctx, &err, now);
            return Err(err);
        }

        let mut wallet = self.load_wallet(&ctx.player)?;
        let balance = wallet.balance(Currency::SweepsCoins);
        if balance < amount {
            let err = EngineError::InsufficientFunds {
                currency: Currency::SweepsCoins,
                balance,
                required: amount,
            };
            self.record_rejection(ctx, &err, now);
            return Err(err);
        }
        wallet
            .apply_net(Currency::SweepsCoins, -(amount as i64))
            .map_err(|_| EngineError::InsufficientFunds {
                currency: Currency::SweepsCoins,
                balance,
                required: amount,
            })?;

        let request_id = self.store.next_spin_id();
        let transaction = Transaction {
            id: self.store.next_transaction_id(),
            user_id: ctx.player.clone(),
            operator_id: ctx.operator.clone(),
            amount: -(amount as i64),
            currency: Currency::SweepsCoins,
            kind: TransactionKind::RedemptionRequest,
            status: TransactionStatus::Pending,
            description: format!("Redemption request for {amount} SC"),
            created_at: now,
        };
        let audit_entry = AuditEntry {
            id: self.store.next_audit_id(),
            action: "REDEMPTION_REQUEST".to_string(),
            actor_id: ctx.player.clone(),
            details: format!("{amount} SC held pending review"),
            created_at: now,
        };
        let batch = WriteBatch {
            spin_id: Some(request_id),
            wallet: Some((ctx.player.clone(), wallet)),
            operator: None,
            transactions: vec![transaction.clone()],
            audit: vec![audit_entry],
            daily_claim: None,
        };
        self.store
            .commit(&batch)
            .map_err(|reason| EngineError::PersistenceWriteFailed {
                spin_id: request_id,
                reason: reason.to_string(),
            })?;
        Ok(transaction)
    }

    // === internals ===

    fn session_handle(&self, player: &PlayerId, client_seed: &str) -> Arc<Mutex<PlayerSession>> {
        let mut sessions = self.sessions.lock().expect("session table lock poisoned");
        Arc::clone(sessions.entry(player.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(PlayerSession::new(player.clone(), client_seed)))
        }))
    }

    /// Spin id of this player's unreplayed settlement, if one exists.
    fn pending_spin_for(&self, player: &PlayerId) -> Option<u64> {
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .iter()
            .find(|(_, entry)| &entry.player == player)
            .map(|(spin_id, _)| *spin_id)
    }

    /// Integrity violations terminate the session: audit the anomaly, drop
    /// the session so it must be re-established, and surface the error.
    fn abort_corrupted(
        &self,
        ctx: &SpinContext,
        session: &mut MutexGuard<'_, PlayerSession>,
        err: EngineError,
        now: u64,
    ) -> EngineError {
        warn!(player = %ctx.player, %err, "fairness integrity violation, spin discarded");
        session.reject();
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .remove(&ctx.player);
        let entry = AuditEntry {
            id: self.store.next_audit_id(),
            action: "FAIRNESS_ANOMALY".to_string(),
            actor_id: ctx.player.clone(),
            details: err.to_string(),
            created_at: now,
        };
        let batch = WriteBatch {
            audit: vec![entry],
            ..Default::default()
        };
        if let Err(reason) = self.store.commit(&batch) {
            warn!(%reason, "failed to persist anomaly audit record");
        }
        err
    }

    /// Validation rejections leave exactly one audit record and no other
    /// state change.
    fn record_rejection(&self, ctx: &SpinContext, err: &EngineError, now: u64) {
        debug!(player = %ctx.player, %err, "request rejected");
        let entry = AuditEntry {
            id: self.store.next_audit_id(),
            action: "SPIN_REJECTED".to_string(),
            actor_id: ctx.player.clone(),
            details: err.to_string(),
            created_at: now,
        };
        let batch = WriteBatch {
            audit: vec![entry],
            ..Default::default()
        };
        if let Err(reason) = self.store.commit(&batch) {
            warn!(%reason, "failed to persist rejection audit record");
        }
    }

    fn load_game(&self, request: &SpinRequest) -> Result<Game, EngineError> {
        let game = self
            .store
            .load_game(&request.game_id)
            .map_err(store_err)?
            .ok_or_else(|| EngineError::GameNotFound(request.game_id.clone()))?;
        if !game.is_playable() {
            return Err(EngineError::GameNotPlayable(game.id));
        }
        Ok(game)
    }

    fn load_wallet(&self, player: &PlayerId) -> Result<Wallet, EngineError> {
        self.store
            .load_wallet(player)
            .map_err(store_err)?
            .ok_or_else(|| EngineError::WalletNotFound(player.clone()))
    }

    fn load_operator(&self, operator: &OperatorId) -> Result<Operator, EngineError> {
        self.store
            .load_operator(operator)
            .map_err(store_err)?
            .ok_or_else(|| EngineError::OperatorNotFound(operator.clone()))
    }
}

fn store_err(err: anyhow::Error) -> EngineError {
    EngineError::Store(err.to_string())
}
