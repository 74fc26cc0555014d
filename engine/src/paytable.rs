//! Paytable evaluation of a completed reel result.
//!
//! The symbol with the highest occurrence count pays `bet × multiplier`,
//! where the multiplier comes from that symbol's tier for the count (a full
//! match across all reels uses the last tier). Symbols absent from the
//! paytable use the platform default multipliers. When two symbols tie at the
//! highest count, the tie breaks deterministically toward the higher
//! multiplier at that tier (then toward symbol-id order), never toward map
//! iteration order.

use std::collections::BTreeMap;
use sweepstack_types::constants::{DEFAULT_PAYTABLE_MULTIPLIERS, MIN_MATCH_COUNT};
use sweepstack_types::Symbol;

/// Multiplier for `count` matching symbols out of `reel_count` reels.
fn multiplier_for(
    paytable: &BTreeMap<Symbol, Vec<u64>>,
    symbol: &Symbol,
    count: usize,
    reel_count: usize,
) -> u64 {
    let default_tiers: &[u64] = &DEFAULT_PAYTABLE_MULTIPLIERS;
    let tiers = paytable
        .get(symbol)
        .map(|tiers| tiers.as_slice())
        .unwrap_or(default_tiers);
    if count == reel_count {
        tiers.last().copied().unwrap_or(0)
    } else {
        tiers.get(count.saturating_sub(1)).copied().unwrap_or(0)
    }
}

/// Evaluate a reel result into a payout amount.
pub fn evaluate(result_reels: &[Symbol], paytable: &BTreeMap<Symbol, Vec<u64>>, bet: u64) -> u64 {
    let reel_count = result_reels.len();
    if reel_count == 0 {
        return 0;
    }

    let mut counts: BTreeMap<&Symbol, usize> = BTreeMap::new();
    for symbol in result_reels {
        *counts.entry(symbol).or_insert(0) += 1;
    }
    let max_count = counts.values().copied().max().unwrap_or(0);
    if max_count < MIN_MATCH_COUNT {
        return 0;
    }

    // Deterministic tie-break: highest multiplier at the tier, then symbol
    // order. BTreeMap iteration makes the secondary key stable.
    let best = counts
        .iter()
        .filter(|(_, count)| **count == max_count)
        .map(|(symbol, _)| multiplier_for(paytable, symbol, max_count, reel_count))
        .max()
        .unwrap_or(0);

    bet.saturating_mul(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reels(symbols: &[&str]) -> Vec<Symbol> {
        symbols.iter().map(|s| Symbol::from(*s)).collect()
    }

    fn classic_paytable() -> BTreeMap<Symbol, Vec<u64>> {
        BTreeMap::from([
            (Symbol::from("💎"), vec![5, 20, 100]),
            (Symbol::from("7️⃣"), vec![10, 50, 500]),
            (Symbol::from("🍒"), vec![2, 5, 15]),
        ])
    }

    #[test]
    fn full_match_pays_last_tier() {
        let payout = evaluate(&reels(&["💎", "💎", "💎"]), &classic_paytable(), 10);
        assert_eq!(payout, 1_000);
    }

    #[test]
    fn partial_match_pays_count_tier() {
        let payout = evaluate(&reels(&["💎", "💎", "7️⃣"]), &classic_paytable(), 10);
        assert_eq!(payout, 200);
    }

    #[test]
    fn no_match_pays_nothing() {
        let payout = evaluate(&reels(&["💎", "🍒", "7️⃣"]), &classic_paytable(), 10);
        assert_eq!(payout, 0);
    }

    #[test]
    fn tie_break_selects_highest_multiplier_deterministically() {
        let result = reels(&["💎", "💎", "7️⃣", "7️⃣"]);
        // Both symbols count 2; 7️⃣ pays 50 at that tier vs 💎's 20.
        for _ in 0..100 {
            assert_eq!(evaluate(&result, &classic_paytable(), 10), 500);
        }
        // Reel order does not influence the pick.
        let reordered = reels(&["7️⃣", "💎", "7️⃣", "💎"]);
        assert_eq!(evaluate(&reordered, &classic_paytable(), 10), 500);
    }

    #[test]
    fn unknown_symbol_uses_default_multipliers() {
        // Absent symbols pay the default tiers rather than erroring:
        // [0, 2, 5] → pair pays 2x, full match pays the last tier (5x).
        let paytable = classic_paytable();
        assert_eq!(evaluate(&reels(&["🦀", "🦀", "💎"]), &paytable, 10), 20);
        assert_eq!(evaluate(&reels(&["🦀", "🦀", "🦀"]), &paytable, 10), 50);
    }

    #[test]
    fn empty_result_pays_nothing() {
        assert_eq!(evaluate(&[], &classic_paytable(), 10), 0);
    }
}
