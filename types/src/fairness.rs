//! Commit-reveal fairness records.

use crate::math_model::Symbol;
use serde::{Deserialize, Serialize};

/// The revealed provably-fair record for one completed spin.
///
/// Invariants:
/// - the commitment is reproducible from `(server_seed, client_seed, nonce)`;
/// - the nonce never repeats or decreases within a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairnessRecord {
    /// Hex-encoded server seed, disclosed only after the outcome is fixed.
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    /// Hex-encoded commitment published before the draw.
    pub commitment: String,
    /// The drawn result, one symbol per reel.
    pub result_reels: Vec<Symbol>,
}
