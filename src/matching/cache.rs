// src/matching/cache.rs
//! Session-lived results cache, keyed by application.
//!
//! The cache is the single source of truth the UI reads from. Writers from
//! the single and batch paths need no coordination beyond the
//! last-write-wins-by-`computed_at` rule applied here per key. Change events
//! are wake-ups, not state: a woken subscriber re-reads its projection, so
//! `watch` coalescing under bursts loses nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;
use tracing::debug;

use crate::types::{ApplicationId, JobId, MatchResult};

/// Notification that some entry changed. Carries enough for subscribers to
/// skip wake-ups they do not care about; the entry itself is re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub revision: u64,
    pub application_id: ApplicationId,
    pub job_id: JobId,
}

/// In-memory map from application to its latest known match result.
/// No eviction: entries live as long as the cache's owner.
pub struct ResultsCache {
    entries: RwLock<HashMap<ApplicationId, MatchResult>>,
    revision: AtomicU64,
    events: watch::Sender<Option<CacheEvent>>,
}

impl ResultsCache {
    pub fn new() -> Self {
        let (events, _) = watch::channel(None);
        Self {
            entries: RwLock::new(HashMap::new()),
            revision: AtomicU64::new(0),
            events,
        }
    }

    /// Latest result for an application, if any.
    pub fn get(&self, application_id: &ApplicationId) -> Option<MatchResult> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(application_id)
            .cloned()
    }

    /// Whether a result exists for this application.
    pub fn is_analyzed(&self, application_id: &ApplicationId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(application_id)
    }

    /// Insert a result unless a strictly newer one is already cached.
    /// Returns whether the write was accepted; a stale write is dropped
    /// silently because it is expected under concurrent single/batch paths.
    pub fn put(&self, result: MatchResult) -> bool {
        let event = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&result.application_id) {
                Some(existing) if existing.computed_at > result.computed_at => {
                    debug!(
                        application_id = %result.application_id,
                        incoming = %result.computed_at,
                        cached = %existing.computed_at,
                        "dropping stale match result"
                    );
                    None
                }
                _ => {
                    let event = CacheEvent {
                        revision: self.revision.fetch_add(1, Ordering::Relaxed) + 1,
                        application_id: result.application_id.clone(),
                        job_id: result.job_id.clone(),
                    };
                    entries.insert(result.application_id.clone(), result);
                    Some(event)
                }
            }
        };

        match event {
            Some(event) => {
                self.events.send_replace(Some(event));
                true
            }
            None => false,
        }
    }

    /// Bulk insert; returns how many writes were accepted.
    pub fn put_many(&self, results: Vec<MatchResult>) -> usize {
        results.into_iter().filter(|r| self.put(r.clone())).count()
    }

    /// A job's full result set is always a computed projection over the
    /// per-application entries, never a second stored collection. Sorted by
    /// application id for a deterministic view.
    pub fn job_results(&self, job_id: &JobId) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|result| &result.job_id == job_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.application_id.cmp(&b.application_id));
        results
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to change notifications. The initial value is `None` until
    /// the first accepted write.
    pub fn subscribe(&self) -> watch::Receiver<Option<CacheEvent>> {
        self.events.subscribe()
    }
}

impl Default for ResultsCache {
    fn default() -> Self {
        Self::new()
    }
}
