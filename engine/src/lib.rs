//! Spin outcome and settlement engine.
//!
//! The engine owns the authoritative path from a validated spin request to a
//! durably settled outcome: commit-reveal fairness generation, weighted reel
//! selection, paytable evaluation, and atomic dual-currency settlement, with
//! every balance-affecting event recorded in bounded transaction and audit
//! logs. Identity, tenant management, game configuration authoring, and
//! transport all live with other collaborators; they reach the engine through
//! [`SpinEngine`] and the [`Store`] persistence port.

pub mod audit;
pub mod error;
pub mod fairness;
pub mod ledger;
pub mod orchestrator;
pub mod paytable;
pub mod reels;
pub mod session;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use audit::AuditLog;
pub use error::EngineError;
pub use fairness::{commitment, verify, FairnessSession, FairnessStream};
pub use ledger::{prepare_settlement, Settlement, SettlementIds, TransactionLog};
pub use orchestrator::{SpinContext, SpinEngine};
pub use paytable::evaluate;
pub use session::{PlayerSession, SpinPhase};
pub use store::{CommitOutcome, MemoryStore, Store, WriteBatch};
