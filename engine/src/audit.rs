//! Append-only, ring-bounded audit log.
//!
//! Entries are immutable once written; newest-first by insertion order
//! (insertion is authoritative, not `created_at` comparison). The log accepts
//! concurrent appends from different players without losing entries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use sweepstack_types::constants::AUDIT_LOG_RETENTION;
use sweepstack_types::{AuditEntry, PlayerId};

pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    next_id: AtomicU64,
    retention: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_retention(AUDIT_LOG_RETENTION)
    }
}

impl AuditLog {
    pub fn with_retention(retention: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            retention,
        }
    }

    /// Append a new entry at the head, dropping anything beyond retention.
    pub fn record(
        &self,
        action: impl Into<String>,
        actor_id: PlayerId,
        details: impl Into<String>,
        created_at: u64,
    ) -> AuditEntry {
        let entry = AuditEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            action: action.into(),
            actor_id,
            details: details.into(),
            created_at,
        };
        self.append(entry.clone());
        entry
    }

    /// Append an already-built entry (used when entries travel inside a
    /// settlement write batch).
    pub fn append(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock().expect("audit log lock poisoned");
        entries.push_front(entry);
        entries.truncate(self.retention);
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot, newest first.
    pub fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .expect("audit log lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}
