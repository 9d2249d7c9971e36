//! In-memory deployment status records, bounded by capacity and pruned by age.

use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use tokio::sync::Notify;

use crate::models::{DeploymentStatus, LogLevel};

pub const CANCELLED_MESSAGE: &str = "Deployment cancelled by user";

/// Cooperative cancellation flag shared between the store and one pipeline.
#[derive(Debug, Default)]
pub struct CancelSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelSignal::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug)]
struct StatusEntry {
    status: DeploymentStatus,
    cancel: Arc<CancelSignal>,
    created_at: Instant,
    finished_at: Option<Instant>,
}

#[derive(Debug)]
pub struct StatusStore {
    entries: RwLock<HashMap<String, StatusEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl StatusStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Inserts a fresh record. At capacity the oldest finished record is
    /// evicted first; running deployments are never evicted.
    pub fn insert(&self, status: DeploymentStatus) -> Arc<CancelSignal> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if entries.len() >= self.capacity
            && let Some(oldest_id) = entries
                .iter()
                .filter(|(_, e)| e.status.is_terminal())
                .min_by_key(|(_, e)| e.created_at)
                .map(|(id, _)| id.clone())
        {
            tracing::debug!(deployment_id = %oldest_id, "Evicting deployment record at capacity");
            entries.remove(&oldest_id);
        }

        let cancel = Arc::new(CancelSignal::default());
        let terminal = status.is_terminal();
        entries.insert(
            status.id.clone(),
            StatusEntry {
                status,
                cancel: cancel.clone(),
                created_at: Instant::now(),
                finished_at: terminal.then(Instant::now),
            },
        );
        cancel
    }

    pub fn get(&self, id: &str) -> Option<DeploymentStatus> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).map(|e| e.status.clone())
    }

    /// Applies `f` to a record that is still running and returns the new
    /// snapshot. Finished or unknown records are left untouched (`None`).
    pub fn update(
        &self,
        id: &str,
        f: impl FnOnce(&mut DeploymentStatus),
    ) -> Option<DeploymentStatus> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(id)?;
        if entry.status.is_terminal() {
            return None;
        }
        f(&mut entry.status);
        if entry.status.is_terminal() {
            entry.finished_at = Some(Instant::now());
        }
        Some(entry.status.clone())
    }

    /// Marks a running record as failed by the user and trips its signal.
    pub fn cancel(&self, id: &str) -> Option<DeploymentStatus> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(id)?;
        if entry.status.is_terminal() {
            return None;
        }
        entry.status.log(LogLevel::Warn, CANCELLED_MESSAGE);
        entry.status.mark_failed(CANCELLED_MESSAGE);
        entry.finished_at = Some(Instant::now());
        entry.cancel.cancel();
        Some(entry.status.clone())
    }

    pub fn list(&self) -> Vec<DeploymentStatus> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut statuses: Vec<_> = entries.values().map(|e| e.status.clone()).collect();
        statuses.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        statuses
    }

    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    /// Drops finished records older than the TTL as of `now`.
    pub fn prune_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| match e.finished_at {
            Some(finished) => now.saturating_duration_since(finished) < self.ttl,
            None => true,
        });
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new(1000, Duration::from_secs(3600))
    }
}
