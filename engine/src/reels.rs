//! Weighted symbol selection over reel strips.
//!
//! Each reel draw consumes one random unit from the spin's fairness stream,
//! scales it by the strip's total weight, and walks the strip consuming
//! weight until the scaled value is exhausted. Weights apply per strip
//! position, so a symbol appearing twice on a strip carries its weight twice.

use crate::fairness::FairnessStream;
use std::collections::BTreeMap;
use sweepstack_types::{MathModel, Symbol};

/// Weight of one strip position: the configured symbol weight, defaulting
/// to 1 for symbols absent from the mapping.
fn position_weight(weights: &BTreeMap<Symbol, u64>, symbol: &Symbol) -> u64 {
    weights.get(symbol).copied().unwrap_or(1)
}

/// Draw one symbol from a strip using a random unit in `[0, 1)`.
///
/// When every position weighs zero the draw falls back to uniform selection
/// over the strip; this fallback is deliberate, not an incidental default.
/// Returns `None` only for an empty strip, which validation rejects upstream.
pub fn draw<'a>(
    strip: &'a [Symbol],
    weights: &BTreeMap<Symbol, u64>,
    unit: f64,
) -> Option<&'a Symbol> {
    if strip.is_empty() {
        return None;
    }

    let total: u64 = strip
        .iter()
        .map(|symbol| position_weight(weights, symbol))
        .sum();
    if total == 0 {
        return uniform(strip, unit);
    }

    let mut scaled = unit * total as f64;
    for symbol in strip {
        let weight = position_weight(weights, symbol) as f64;
        if scaled < weight {
            return Some(symbol);
        }
        scaled -= weight;
    }
    // Floating-point residue can walk past the end when `unit` is close to 1.
    strip.last()
}

/// Explicit uniform fallback over the strip.
fn uniform(strip: &[Symbol], unit: f64) -> Option<&Symbol> {
    let index = ((unit * strip.len() as f64) as usize).min(strip.len() - 1);
    strip.get(index)
}

/// Draw one symbol per reel, each consuming an independent slice of the
/// fairness stream.
pub fn draw_reels(model: &MathModel, stream: &mut FairnessStream) -> Vec<Symbol> {
    model
        .reel_strips
        .iter()
        .filter_map(|strip| draw(strip, &model.symbol_weights, stream.next_unit()).cloned())
        .collect()
}

/// Constrained draw for bonus-buy spins: sample only strip positions whose
/// symbol has a non-zero paytable entry, weighted as usual. Falls back to an
/// unconstrained draw if the strip carries no paying symbols at all.
pub fn draw_paying<'a>(
    strip: &'a [Symbol],
    weights: &BTreeMap<Symbol, u64>,
    paytable: &BTreeMap<Symbol, Vec<u64>>,
    unit: f64,
) -> Option<&'a Symbol> {
    let paying: Vec<&Symbol> = strip
        .iter()
        .filter(|symbol| {
            paytable
                .get(symbol)
                .is_some_and(|tiers| tiers.iter().any(|multiplier| *multiplier > 0))
        })
        .collect();
    if paying.is_empty() {
        return draw(strip, weights, unit);
    }

    let total: u64 = paying
        .iter()
        .map(|symbol| position_weight(weights, symbol))
        .sum();
    if total == 0 {
        let index = ((unit * paying.len() as f64) as usize).min(paying.len() - 1);
        return paying.get(index).copied();
    }

    let mut scaled = unit * total as f64;
    for symbol in &paying {
        let weight = position_weight(weights, symbol) as f64;
        if scaled < weight {
            return Some(symbol);
        }
        scaled -= weight;
    }
    paying.last().copied()
}

/// Bonus-buy variant of [`draw_reels`].
pub fn draw_paying_reels(model: &MathModel, stream: &mut FairnessStream) -> Vec<Symbol> {
    model
        .reel_strips
        .iter()
        .filter_map(|strip| {
            draw_paying(
                strip,
                &model.symbol_weights,
                &model.paytable,
                stream.next_unit(),
            )
            .cloned()
        })
        .collect()
}
