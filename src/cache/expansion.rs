//! Collapsed/expanded state of project tasks.
//!
//! A project seen for the first time starts expanded and is registered on the
//! spot. User toggles go through [`ExpansionStore::set_collapsed`], which bumps
//! a revision on a watch channel so the host knows to run another pass.

use crate::types::RecordId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// Shared expansion state. Clones share the same map.
#[derive(Debug, Clone)]
pub struct ExpansionStore {
    collapsed: Arc<Mutex<HashMap<RecordId, bool>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for ExpansionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpansionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            collapsed: Arc::new(Mutex::new(HashMap::new())),
            revision: Arc::new(tx),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<RecordId, bool>> {
        self.collapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the project's children are hidden. Registers unknown ids as expanded.
    pub fn is_collapsed(&self, project_id: &str) -> bool {
        *self.map().entry(project_id.to_string()).or_insert(false)
    }

    /// Record a user toggle and signal that a new pass is due.
    pub fn set_collapsed(&self, project_id: &str, collapsed: bool) {
        let previous = self.map().insert(project_id.to_string(), collapsed);
        debug!(project_id = %project_id, collapsed, ?previous, "Expansion state changed");
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Whether the id has been seen or set.
    pub fn contains(&self, project_id: &str) -> bool {
        self.map().contains_key(project_id)
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Receiver that changes whenever a toggle happens.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of toggles so far.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}
