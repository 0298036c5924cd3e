//! Predecessor-link cache.
//!
//! Reads never wait on the store: `lookup` returns whatever the last
//! completed refresh wrote, and `refresh` only dispatches a background fetch.
//! A pass that looks up an id before refreshing it therefore sees links at
//! least one pass old.
//!
//! Each refresh takes a ticket. Dispatching a newer refresh for the same id
//! aborts the older fetch, and a fetch only writes while its ticket is still
//! the current one, so a slow stale fetch can never overwrite a newer result.
//!
//! Every dispatched fetch holds a pending guard until it completes or is
//! aborted; [`DependencyCache::settle`] waits for the count to reach zero, so
//! any number of clones may settle at once.

use crate::error::LookupFailure;
use crate::logging::NotificationChannel;
use crate::store::RecordStore;
use crate::types::RecordId;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, trace};

#[derive(Debug)]
struct InFlight {
    ticket: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<RecordId, Vec<RecordId>>,
    in_flight: HashMap<RecordId, InFlight>,
    next_ticket: u64,
}

struct Shared {
    state: Mutex<State>,
    tasks: Mutex<JoinSet<()>>,
    /// Fetches spawned and not yet finished or dropped.
    pending: AtomicUsize,
    idle: Notify,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn NotificationChannel>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts one fetch as pending until dropped, whether the fetch ran to the
/// end or was aborted.
struct PendingGuard(Arc<Shared>);

impl PendingGuard {
    fn new(shared: &Arc<Shared>) -> Self {
        shared.pending.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Read-through, eventually consistent predecessor cache.
///
/// Cheap to clone; clones share the same entries and in-flight fetches.
#[derive(Clone)]
pub struct DependencyCache {
    shared: Arc<Shared>,
}

impl DependencyCache {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn NotificationChannel>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                tasks: Mutex::new(JoinSet::new()),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
                store,
                notifier,
            }),
        }
    }

    /// Cached predecessors of `id`; empty if never fetched.
    pub fn lookup(&self, id: &str) -> Vec<RecordId> {
        self.shared
            .state()
            .entries
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Dispatch a background fetch for `id` and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn refresh(&self, id: &str) {
        let mut tasks = self.shared.tasks();
        // Reap finished fetches so the set does not grow across passes.
        while tasks.try_join_next().is_some() {}

        let mut state = self.shared.state();
        state.next_ticket += 1;
        let ticket = state.next_ticket;

        let shared = Arc::clone(&self.shared);
        let guard = PendingGuard::new(&self.shared);
        let key = id.to_string();
        let handle = tasks.spawn(async move {
            let _guard = guard;
            let result = shared.store.fetch_predecessors(&key).await;
            complete(&shared, &key, ticket, result);
        });

        if let Some(previous) = state
            .in_flight
            .insert(id.to_string(), InFlight { ticket, handle })
        {
            trace!(record_id = %id, ticket = previous.ticket, "Superseding in-flight dependency fetch");
            previous.handle.abort();
        }
    }

    /// Overwrite the entry for `id` directly.
    pub fn insert(&self, id: &str, predecessors: Vec<RecordId>) {
        self.shared
            .state()
            .entries
            .insert(id.to_string(), dedup_ordered(predecessors));
    }

    /// Number of fetches still running.
    pub fn in_flight(&self) -> usize {
        self.shared.state().in_flight.len()
    }

    /// Wait for every dispatched fetch to finish (or be aborted), including
    /// fetches dispatched while waiting.
    pub async fn settle(&self) {
        loop {
            let idle = self.shared.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl std::fmt::Debug for DependencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state();
        f.debug_struct("DependencyCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

fn complete(
    shared: &Shared,
    id: &str,
    ticket: u64,
    result: Result<Vec<RecordId>, crate::error::StoreError>,
) {
    let mut state = shared.state();
    let current = state.in_flight.get(id).is_some_and(|f| f.ticket == ticket);
    if !current {
        debug!(record_id = %id, ticket, "Dropping superseded dependency fetch");
        return;
    }
    state.in_flight.remove(id);

    match result {
        Ok(predecessors) => {
            state
                .entries
                .insert(id.to_string(), dedup_ordered(predecessors));
        }
        Err(e) => {
            drop(state);
            shared
                .notifier
                .report_error(&LookupFailure::dependencies(id, e));
        }
    }
}

/// Keep the first occurrence of each id.
fn dedup_ordered(ids: Vec<RecordId>) -> Vec<RecordId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
