//! Audit trail entries for compliance review.

use crate::ids::PlayerId;
use serde::{Deserialize, Serialize};

/// One immutable audit record. Ordering within the audit log is by insertion
/// (newest first), not by `created_at` comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    /// Upper-snake action tag, e.g. `GAME_SPIN` or `SPIN_REJECTED`.
    pub action: String,
    pub actor_id: PlayerId,
    pub details: String,
    /// Unix seconds at creation.
    pub created_at: u64,
}
