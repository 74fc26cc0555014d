//! Shared data model for the sweepstack spin engine.
//!
//! Everything in this crate is plain data: identifiers, currencies and
//! wallets, game math models, transactions, audit entries, fairness records,
//! and the request/response types exchanged with the session layer. All
//! settlement-relevant amounts are integer coin units; floats appear only in
//! informational fields (RTP) and never in balance arithmetic.

pub mod api;
pub mod audit;
pub mod constants;
pub mod currency;
pub mod fairness;
pub mod ids;
pub mod math_model;
pub mod operator;
pub mod transaction;

pub use api::{SpinOutcome, SpinRequest, VerifyRequest};
pub use audit::AuditEntry;
pub use currency::{Currency, Wallet, WalletError};
pub use fairness::FairnessRecord;
pub use ids::{GameId, OperatorId, PlayerId};
pub use math_model::{Game, GameStatus, MathModel, ModelError, SlotArchetype, Symbol, Volatility};
pub use operator::{BonusConfig, Operator};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
