//! Tenant (operator) records as the settlement engine sees them.
//!
//! Branding, subdomains, and game assignment live with the tenant management
//! collaborator; the engine only touches revenue accrual and bonus amounts.

use crate::constants::{
    DEFAULT_DAILY_BONUS_GC, DEFAULT_DAILY_BONUS_SC, DEFAULT_WELCOME_GC, DEFAULT_WELCOME_SC,
    PLATFORM_FEE_BPS,
};
use crate::ids::OperatorId;
use serde::{Deserialize, Serialize};

/// Operator-configured player grants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusConfig {
    pub welcome_gc: u64,
    pub welcome_sc: u64,
    pub daily_gc: u64,
    pub daily_sc: u64,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            welcome_gc: DEFAULT_WELCOME_GC,
            welcome_sc: DEFAULT_WELCOME_SC,
            daily_gc: DEFAULT_DAILY_BONUS_GC,
            daily_sc: DEFAULT_DAILY_BONUS_SC,
        }
    }
}

/// Per-tenant revenue and bonus state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub active: bool,
    /// Gross wagered amount accrued to this operator.
    pub revenue: u64,
    /// Platform fees accrued against this operator.
    pub platform_fees_paid: u64,
    pub bonus: BonusConfig,
}

impl Operator {
    pub fn new(id: OperatorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            revenue: 0,
            platform_fees_paid: 0,
            bonus: BonusConfig::default(),
        }
    }

    /// Accrue a settled wager: revenue grows by the full cost, platform fees
    /// by the fixed basis-point share of it.
    pub fn accrue_wager(&mut self, cost: u64) {
        self.revenue = self.revenue.saturating_add(cost);
        self.platform_fees_paid = self.platform_fees_paid.saturating_add(platform_fee(cost));
    }
}

/// Platform fee on a wagered amount, in whole coins (truncating).
pub fn platform_fee(cost: u64) -> u64 {
    ((cost as u128).saturating_mul(PLATFORM_FEE_BPS as u128) / 10_000) as u64
}
