//! Dual-currency wallets.
//!
//! A wallet holds two independent non-negative balances: play-money gold
//! coins and redeemable sweeps coins. A single settlement mutates exactly one
//! of the two; the engine never combines them in one arithmetic operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The two non-convertible platform currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Play-money credit, never redeemable.
    #[serde(rename = "GC")]
    GoldCoins,
    /// Sweepstakes-entry credit, redeemable for prizes.
    #[serde(rename = "SC")]
    SweepsCoins,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::GoldCoins => f.write_str("GC"),
            Currency::SweepsCoins => f.write_str("SC"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("{currency} balance overdrawn: have {balance}, debit {debit}")]
    Overdrawn {
        currency: Currency,
        balance: u64,
        debit: u64,
    },
    #[error("{currency} balance overflow applying credit {credit}")]
    Overflow { currency: Currency, credit: u64 },
}

/// Per-player dual-currency balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub gold_coins: u64,
    pub sweeps_coins: u64,
}

impl Wallet {
    pub fn new(gold_coins: u64, sweeps_coins: u64) -> Self {
        Self {
            gold_coins,
            sweeps_coins,
        }
    }

    pub fn balance(&self, currency: Currency) -> u64 {
        match currency {
            Currency::GoldCoins => self.gold_coins,
            Currency::SweepsCoins => self.sweeps_coins,
        }
    }

    pub fn can_afford(&self, currency: Currency, cost: u64) -> bool {
        self.balance(currency) >= cost
    }

    /// Apply a signed net change to a single currency balance.
    ///
    /// The other balance is untouched. Fails without mutation if the debit
    /// would overdraw the balance or the credit would overflow it.
    pub fn apply_net(&mut self, currency: Currency, net: i64) -> Result<(), WalletError> {
        let balance = self.balance(currency);
        let updated = if net >= 0 {
            let credit = net as u64;
            balance
                .checked_add(credit)
                .ok_or(WalletError::Overflow { currency, credit })?
        } else {
            let debit = net.unsigned_abs();
            balance.checked_sub(debit).ok_or(WalletError::Overdrawn {
                currency,
                balance,
                debit,
            })?
        };
        match currency {
            Currency::GoldCoins => self.gold_coins = updated,
            Currency::SweepsCoins => self.sweeps_coins = updated,
        }
        Ok(())
    }

    /// Credit a single currency, saturating at the representable maximum.
    pub fn credit(&mut self, currency: Currency, amount: u64) {
        match currency {
            Currency::GoldCoins => self.gold_coins = self.gold_coins.saturating_add(amount),
            Currency::SweepsCoins => self.sweeps_coins = self.sweeps_coins.saturating_add(amount),
        }
    }
}
