//! Request/response types exchanged with the session layer.

use crate::currency::{Currency, Wallet};
use crate::fairness::FairnessRecord;
use crate::ids::GameId;
use crate::math_model::Symbol;
use serde::{Deserialize, Serialize};

/// One spin request, as consumed from the UI/session layer. Identity (player
/// and operator) arrives separately from the identity boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinRequest {
    pub game_id: GameId,
    pub bet: u64,
    pub currency: Currency,
    /// Client seed for the fairness session. Used when the player's session
    /// is first established; an existing session keeps its seed.
    pub client_seed: String,
    #[serde(default)]
    pub bonus_buy: bool,
}

/// Successful spin response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Unique settlement key; replays of the same spin id apply once.
    pub spin_id: u64,
    pub result_reels: Vec<Symbol>,
    /// Amount deducted up front (bet, or bet × multiplier for bonus buys).
    pub cost: u64,
    pub payout: u64,
    pub fairness: FairnessRecord,
    /// Wallet state after settlement.
    pub wallet: Wallet,
}

/// Public verification request: anyone holding a revealed record can check
/// the engine's published commitment independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub claimed_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_request_round_trips_as_json() {
        let request = SpinRequest {
            game_id: GameId::from("g-1"),
            bet: 10,
            currency: Currency::GoldCoins,
            client_seed: "client_abc".to_string(),
            bonus_buy: false,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"GC\""));
        let back: SpinRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn bonus_buy_defaults_to_false() {
        let json = r#"{"game_id":"g-1","bet":10,"currency":"SC","client_seed":"c"}"#;
        let request: SpinRequest = serde_json::from_str(json).unwrap();
        assert!(!request.bonus_buy);
        assert_eq!(request.currency, Currency::SweepsCoins);
    }
}
