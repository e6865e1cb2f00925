//! Bookkeeping for when roster synchronization has to run again.
//!
//! Sync re-runs when the group, the month or the roster (active member ids
//! and names) changes. Edits to entry values never change the fingerprint,
//! so they never trigger a sync.

use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::domain::models::{MemberRecord, MonthId};

/// Hash of the part of a roster that sync depends on.
pub fn roster_fingerprint(roster: &[MemberRecord]) -> u64 {
    let mut active: Vec<(&str, &str)> = roster
        .iter()
        .filter(|m| m.active)
        .map(|m| (m.id.as_str(), m.name.as_str()))
        .collect();
    active.sort_unstable();

    let mut hasher = DefaultHasher::new();
    active.hash(&mut hasher);
    hasher.finish()
}

/// Remembers which (group, month) pairs have been opened and, for each,
/// the roster fingerprint of the last complete sync. Cloning shares the
/// same state.
#[derive(Clone, Default)]
pub struct SyncTrigger {
    synced: Arc<Mutex<HashMap<(String, MonthId), Option<u64>>>>,
}

impl SyncTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_sync(&self, group_id: &str, month: &MonthId, fingerprint: u64) -> bool {
        let synced = self.lock();
        synced.get(&(group_id.to_string(), *month)) != Some(&Some(fingerprint))
    }

    /// Note that a month was opened, whether or not its sync completes.
    pub fn mark_opened(&self, group_id: &str, month: &MonthId) {
        self.lock()
            .entry((group_id.to_string(), *month))
            .or_insert(None);
    }

    /// Record a complete sync. Partial or failed syncs must not be recorded.
    pub fn record(&self, group_id: &str, month: &MonthId, fingerprint: u64) {
        debug!("Recorded sync of {}/{} ({:x})", group_id, month, fingerprint);
        self.lock()
            .insert((group_id.to_string(), *month), Some(fingerprint));
    }

    /// Months of `group_id` that have been opened, oldest first.
    pub fn opened_months(&self, group_id: &str) -> Vec<MonthId> {
        let mut months: Vec<MonthId> = self
            .lock()
            .keys()
            .filter(|(group, _)| group == group_id)
            .map(|(_, month)| *month)
            .collect();
        months.sort();
        months
    }

    /// Drop every group's record for `month`, e.g. after its data was deleted.
    pub fn forget_month(&self, month: &MonthId) {
        self.lock().retain(|(_, m), _| m != month);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, MonthId), Option<u64>>> {
        // The map holds plain values, so a poisoned lock is still consistent.
        self.synced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
