//! End-to-end engine tests: full spins through [`SpinEngine`] against the
//! in-memory store, covering settlement conservation, fairness verification,
//! rejection paths, persistence retry, and per-player serialization.

use crate::error::EngineError;
use crate::fairness;
use crate::orchestrator::{SpinContext, SpinEngine};
use crate::store::{MemoryStore, Store};
use std::sync::Arc;
use std::thread;
use sweepstack_types::constants::{
    DEFAULT_DAILY_BONUS_GC, DEFAULT_DAILY_BONUS_SC, SECONDS_PER_DAY,
};
use sweepstack_types::{
    Currency, Game, GameId, GameStatus, MathModel, Operator, OperatorId, PlayerId, SpinRequest,
    TransactionKind, TransactionStatus, Wallet,
};

const NOW: u64 = 1_700_000_000;

fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}

fn classic_game(min_bet: u64) -> Game {
    Game {
        id: GameId::from("g-classic"),
        name: "Classic Emoji".to_string(),
        math: MathModel::classic_default(),
        min_bet,
        status: GameStatus::Published,
    }
}

fn engine_for(
    wallet: Wallet,
) -> (Arc<MemoryStore>, Arc<SpinEngine<MemoryStore>>, SpinContext) {
    let store = Arc::new(
        MemoryStore::new()
            .with_game(classic_game(1))
            .with_wallet(PlayerId::from("p-1"), wallet)
            .with_operator(Operator::new(OperatorId::from("op-1"), "Vegas Shard")),
    );
    let engine = Arc::new(SpinEngine::new(Arc::clone(&store)));
    let ctx = SpinContext {
        player: PlayerId::from("p-1"),
        operator: OperatorId::from("op-1"),
    };
    (store, engine, ctx)
}

fn request(bet: u64) -> SpinRequest {
    SpinRequest {
        game_id: GameId::from("g-classic"),
        bet,
        currency: Currency::GoldCoins,
        client_seed: "client_abc".to_string(),
        bonus_buy: false,
    }
}

#[test]
fn settlement_conserves_value_over_many_spins() {
    init_tracing();
    let initial = 1_000_000u64;
    let (store, engine, ctx) = engine_for(Wallet::new(initial, 0));

    let mut expected = initial as i128;
    let mut wagered = 0u64;
    for _ in 0..10_000 {
        let outcome = engine.spin(&ctx, &request(10), NOW).unwrap();
        expected += outcome.payout as i128 - outcome.cost as i128;
        wagered += outcome.cost;
        assert_eq!(outcome.result_reels.len(), 3);
        assert_eq!(outcome.wallet.gold_coins as i128, expected);
    }

    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.gold_coins as i128, expected);
    assert_eq!(wallet.sweeps_coins, 0);

    let operator = store.load_operator(&ctx.operator).unwrap().unwrap();
    assert_eq!(operator.revenue, wagered);
    assert_eq!(operator.platform_fees_paid, wagered / 10);
}

#[test]
fn every_outcome_verifies_against_its_commitment() {
    let (_, engine, ctx) = engine_for(Wallet::new(100_000, 0));

    let mut last_nonce = 0;
    for _ in 0..100 {
        let outcome = engine.spin(&ctx, &request(10), NOW).unwrap();
        let record = &outcome.fairness;
        assert!(fairness::verify(
            &record.server_seed,
            &record.client_seed,
            record.nonce,
            &record.commitment,
        ));
        assert_eq!(record.client_seed, "client_abc");
        assert!(record.nonce > last_nonce, "nonce must strictly increase");
        last_nonce = record.nonce;
    }
}

#[test]
fn insufficient_funds_leaves_only_a_rejection_record() {
    let (store, engine, ctx) = engine_for(Wallet::new(5, 0));

    let err = engine.spin(&ctx, &request(10), NOW).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds {
            currency: Currency::GoldCoins,
            balance: 5,
            required: 10,
        }
    );

    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.gold_coins, 5);
    assert!(store.transactions().is_empty());
    let audit = store.audit_log();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "SPIN_REJECTED");
}

#[test]
fn zero_and_below_minimum_bets_are_rejected() {
    let store = Arc::new(
        MemoryStore::new()
            .with_game(classic_game(10))
            .with_wallet(PlayerId::from("p-1"), Wallet::new(1_000, 0))
            .with_operator(Operator::new(OperatorId::from("op-1"), "Vegas Shard")),
    );
    let engine = SpinEngine::new(Arc::clone(&store));
    let ctx = SpinContext {
        player: PlayerId::from("p-1"),
        operator: OperatorId::from("op-1"),
    };

    let err = engine.spin(&ctx, &request(0), NOW).unwrap_err();
    assert_eq!(err, EngineError::InvalidBet { bet: 0, min_bet: 10 });
    let err = engine.spin(&ctx, &request(5), NOW).unwrap_err();
    assert_eq!(err, EngineError::InvalidBet { bet: 5, min_bet: 10 });
    assert!(store.transactions().is_empty());
}

#[test]
fn unknown_and_unpublished_games_cannot_spin() {
    let mut draft = classic_game(1);
    draft.id = GameId::from("g-draft");
    draft.status = GameStatus::Draft;
    let store = Arc::new(
        MemoryStore::new()
            .with_game(draft)
            .with_wallet(PlayerId::from("p-1"), Wallet::new(1_000, 0))
            .with_operator(Operator::new(OperatorId::from("op-1"), "Vegas Shard")),
    );
    let engine = SpinEngine::new(store);
    let ctx = SpinContext {
        player: PlayerId::from("p-1"),
        operator: OperatorId::from("op-1"),
    };

    let err = engine.spin(&ctx, &request(10), NOW).unwrap_err();
    assert_eq!(err, EngineError::GameNotFound(GameId::from("g-classic")));

    let mut for_draft = request(10);
    for_draft.game_id = GameId::from("g-draft");
    let err = engine.spin(&ctx, &for_draft, NOW).unwrap_err();
    assert_eq!(err, EngineError::GameNotPlayable(GameId::from("g-draft")));
}

#[test]
fn bonus_buy_charges_the_multiplier_and_draws_paying_symbols() {
    let (store, engine, ctx) = engine_for(Wallet::new(100_000, 0));

    let mut bonus = request(10);
    bonus.bonus_buy = true;
    let outcome = engine.spin(&ctx, &bonus, NOW).unwrap();

    // classic_default carries buy_bonus_multiplier 80.
    assert_eq!(outcome.cost, 800);
    for symbol in &outcome.result_reels {
        assert!(
            matches!(symbol.as_str(), "💎" | "7️⃣" | "🍒"),
            "bonus draw produced non-paying symbol {symbol}"
        );
    }

    let transactions = store.transactions();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionKind::BonusBuy);
    assert_eq!(
        transactions[0].amount,
        outcome.payout as i64 - outcome.cost as i64
    );
}

#[test]
fn failed_commit_is_replayed_without_recomputation() {
    init_tracing();
    let (store, engine, ctx) = engine_for(Wallet::new(1_000, 0));

    store.inject_commit_failures(1);
    let err = engine.spin(&ctx, &request(10), NOW).unwrap_err();
    let EngineError::PersistenceWriteFailed { spin_id, .. } = err else {
        panic!("expected persistence failure, got {err:?}");
    };

    // Nothing was applied.
    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.gold_coins, 1_000);
    assert!(store.transactions().is_empty());

    // The retry commits the identical precomputed settlement.
    let outcome = engine.retry_settlement(spin_id).unwrap();
    assert_eq!(outcome.spin_id, spin_id);
    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet, outcome.wallet);
    assert_eq!(store.transactions().len(), 1);

    // The pending entry is consumed and the session accepts the next spin.
    assert_eq!(
        engine.retry_settlement(spin_id).unwrap_err(),
        EngineError::NoPendingSettlement(spin_id)
    );
    engine.spin(&ctx, &request(10), NOW).unwrap();
}

#[test]
fn pending_settlement_blocks_new_settlements_until_replayed() {
    init_tracing();
    let (store, engine, ctx) = engine_for(Wallet::new(1_000, 0));

    store.inject_commit_failures(1);
    let err = engine.spin(&ctx, &request(10), NOW).unwrap_err();
    let EngineError::PersistenceWriteFailed { spin_id, .. } = err else {
        panic!("expected persistence failure, got {err:?}");
    };

    // No balance-affecting operation may interleave with the unreplayed
    // settlement; a newer one would be overwritten by the replay.
    assert_eq!(
        engine.spin(&ctx, &request(10), NOW).unwrap_err(),
        EngineError::SettlementPending { spin_id }
    );
    assert_eq!(
        engine.spin(&ctx, &request(10), NOW).unwrap_err(),
        EngineError::SettlementPending { spin_id }
    );
    assert_eq!(
        engine.claim_daily_bonus(&ctx, NOW).unwrap_err(),
        EngineError::SettlementPending { spin_id }
    );
    assert!(store.transactions().is_empty());

    let replayed = engine.retry_settlement(spin_id).unwrap();
    let mut expected = 1_000i64 + replayed.payout as i64 - replayed.cost as i64;
    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.gold_coins as i64, expected);

    // Later settlements land on top of the replayed wallet, and every
    // applied delta survives.
    let outcome = engine.spin(&ctx, &request(10), NOW).unwrap();
    expected += outcome.payout as i64 - outcome.cost as i64;
    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.gold_coins as i64, expected);
    assert_eq!(store.transactions().len(), 2);
}

#[test]
fn players_settle_independently_under_concurrency() {
    let mut store = MemoryStore::new()
        .with_game(classic_game(1))
        .with_operator(Operator::new(OperatorId::from("op-1"), "Vegas Shard"));
    let players: Vec<PlayerId> = (0..8).map(|n| PlayerId::from(format!("p-{n}").as_str())).collect();
    for player in &players {
        store = store.with_wallet(player.clone(), Wallet::new(10_000, 0));
    }
    let store = Arc::new(store);
    let engine = Arc::new(SpinEngine::new(Arc::clone(&store)));

    let handles: Vec<_> = players
        .iter()
        .map(|player| {
            let engine = Arc::clone(&engine);
            let ctx = SpinContext {
                player: player.clone(),
                operator: OperatorId::from("op-1"),
            };
            thread::spawn(move || {
                let mut expected = 10_000i64;
                for _ in 0..50 {
                    let outcome = engine.spin(&ctx, &request(10), NOW).unwrap();
                    expected += outcome.payout as i64 - outcome.cost as i64;
                    assert_eq!(outcome.wallet.gold_coins as i64, expected);
                }
                (ctx.player, expected)
            })
        })
        .collect();

    for handle in handles {
        let (player, expected) = handle.join().unwrap();
        let wallet = store.load_wallet(&player).unwrap().unwrap();
        assert_eq!(wallet.gold_coins as i64, expected);
    }

    // 8 players × 50 spins, all wagered through the single operator.
    let operator = store.load_operator(&OperatorId::from("op-1")).unwrap().unwrap();
    assert_eq!(operator.revenue, 8 * 50 * 10);
}

#[test]
fn daily_bonus_claims_once_per_utc_day() {
    let (store, engine, ctx) = engine_for(Wallet::new(0, 0));

    let wallet = engine.claim_daily_bonus(&ctx, NOW).unwrap();
    assert_eq!(wallet.gold_coins, DEFAULT_DAILY_BONUS_GC);
    assert_eq!(wallet.sweeps_coins, DEFAULT_DAILY_BONUS_SC);

    assert_eq!(
        engine.claim_daily_bonus(&ctx, NOW + 3_600).unwrap_err(),
        EngineError::DailyBonusAlreadyClaimed
    );

    let wallet = engine.claim_daily_bonus(&ctx, NOW + SECONDS_PER_DAY).unwrap();
    assert_eq!(wallet.gold_coins, 2 * DEFAULT_DAILY_BONUS_GC);

    let kinds: Vec<_> = store
        .transactions()
        .iter()
        .map(|t| t.kind)
        .collect();
    assert!(kinds.iter().all(|k| *k == TransactionKind::DailyBonus));
    assert_eq!(kinds.len(), 4); // GC + SC per successful claim
}

#[test]
fn redemption_holds_sweeps_pending_review() {
    let (store, engine, ctx) = engine_for(Wallet::new(0, 100));

    let transaction = engine.request_redemption(&ctx, 40, NOW).unwrap();
    assert_eq!(transaction.kind, TransactionKind::RedemptionRequest);
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.amount, -40);
    assert_eq!(transaction.currency, Currency::SweepsCoins);

    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.sweeps_coins, 60);
    assert_eq!(wallet.gold_coins, 0);

    let err = engine.request_redemption(&ctx, 100, NOW).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds {
            currency: Currency::SweepsCoins,
            balance: 60,
            required: 100,
        }
    );

    // A zero amount is an invalid request, not an overdraw.
    let err = engine.request_redemption(&ctx, 0, NOW).unwrap_err();
    assert_eq!(err, EngineError::InvalidRedemption);
    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.sweeps_coins, 60);
}

#[test]
fn sweeps_spins_never_touch_gold() {
    let (store, engine, ctx) = engine_for(Wallet::new(777, 5_000));

    let mut sweeps = request(10);
    sweeps.currency = Currency::SweepsCoins;
    for _ in 0..20 {
        engine.spin(&ctx, &sweeps, NOW).unwrap();
    }

    let wallet = store.load_wallet(&ctx.player).unwrap().unwrap();
    assert_eq!(wallet.gold_coins, 777);
}

#[test]
fn each_successful_spin_is_audited() {
    let (store, engine, ctx) = engine_for(Wallet::new(1_000, 0));

    for _ in 0..5 {
        engine.spin(&ctx, &request(10), NOW).unwrap();
    }
    let audit = store.audit_log();
    assert_eq!(audit.len(), 5);
    // Newest first.
    assert!(audit.iter().all(|entry| entry.action == "GAME_SPIN"));
    assert!(audit.windows(2).all(|pair| pair[0].id > pair[1].id));
}
