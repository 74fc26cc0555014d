//! Game math models: reel strips, paytables, and symbol weights.
//!
//! A math model is created when a game is published and is read-only for the
//! engine thereafter. The stock model mirrors the platform's classic 3-reel
//! emoji game and is used throughout the test suite.

use crate::constants::DEFAULT_BONUS_BUY_MULTIPLIER;
use crate::ids::GameId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Symbol identifier appearing on reel strips and in paytables.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Qualitative variance classification of payout outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    Low,
    Medium,
    High,
    Extreme,
}

/// Structural archetype of a slot game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotArchetype {
    Classic3Reel,
    Paylines5x3,
    Megaways,
    ClusterPays,
    HoldAndSpin,
    CrashHybrid,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("math model has no reel strips")]
    NoReels,
    #[error("reel strip {index} is empty")]
    EmptyStrip { index: usize },
    #[error("paytable entry for {symbol} has no tiers")]
    EmptyPaytableEntry { symbol: Symbol },
}

/// Immutable per-game math definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MathModel {
    /// Target return-to-player percentage. Informational only; settlement
    /// never reads it.
    pub rtp: f64,
    pub volatility: Volatility,
    pub archetype: SlotArchetype,
    /// One ordered symbol sequence per reel.
    pub reel_strips: Vec<Vec<Symbol>>,
    /// Payout multipliers per symbol, indexed by match-count tier
    /// (index 0 = one matching symbol).
    pub paytable: BTreeMap<Symbol, Vec<u64>>,
    /// Relative selection weight per symbol. Symbols absent here weigh 1.
    pub symbol_weights: BTreeMap<Symbol, u64>,
    /// Average spins between feature triggers. Informational.
    pub feature_frequency: u32,
    /// Bonus-buy cost multiplier; `None` means the platform default.
    pub buy_bonus_multiplier: Option<u64>,
}

impl MathModel {
    pub fn reel_count(&self) -> usize {
        self.reel_strips.len()
    }

    pub fn bonus_multiplier(&self) -> u64 {
        self.buy_bonus_multiplier
            .unwrap_or(DEFAULT_BONUS_BUY_MULTIPLIER)
    }

    /// Structural validation performed at publish time. The engine assumes a
    /// validated model and does not re-check per spin.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.reel_strips.is_empty() {
            return Err(ModelError::NoReels);
        }
        for (index, strip) in self.reel_strips.iter().enumerate() {
            if strip.is_empty() {
                return Err(ModelError::EmptyStrip { index });
            }
        }
        for (symbol, tiers) in &self.paytable {
            if tiers.is_empty() {
                return Err(ModelError::EmptyPaytableEntry {
                    symbol: symbol.clone(),
                });
            }
        }
        Ok(())
    }

    /// The stock classic 3-reel emoji model.
    pub fn classic_default() -> Self {
        let strip = |symbols: &[&str]| symbols.iter().map(|s| Symbol::from(*s)).collect();
        Self {
            rtp: 96.5,
            volatility: Volatility::Medium,
            archetype: SlotArchetype::Classic3Reel,
            reel_strips: vec![
                strip(&["💎", "🍒", "🍋", "🔔", "7️⃣"]),
                strip(&["7️⃣", "💎", "🍒", "🍋", "🔔"]),
                strip(&["🔔", "7️⃣", "💎", "🍒", "🍋"]),
            ],
            paytable: BTreeMap::from([
                (Symbol::from("💎"), vec![5, 20, 100]),
                (Symbol::from("7️⃣"), vec![10, 50, 500]),
                (Symbol::from("🍒"), vec![2, 5, 15]),
            ]),
            symbol_weights: BTreeMap::from([
                (Symbol::from("💎"), 10),
                (Symbol::from("7️⃣"), 5),
            ]),
            feature_frequency: 120,
            buy_bonus_multiplier: Some(80),
        }
    }
}

/// Publication state of a game; only published games accept spins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameStatus {
    Draft,
    Published,
    Killed,
}

/// A playable game as the engine sees it: identity, math, and bet floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub math: MathModel,
    pub min_bet: u64,
    pub status: GameStatus,
}

impl Game {
    pub fn is_playable(&self) -> bool {
        self.status == GameStatus::Published
    }
}
