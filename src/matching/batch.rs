// src/matching/batch.rs
//! Batch scoring orchestration.
//!
//! One worker task per live batch run owns both the 1-second progress tick
//! and the scoring future in a single `select!` loop, so the tick cannot
//! outlive the `Running` state. Restarting a batch for the same job aborts
//! the previous worker, which cancels its pending deferred re-fetch rather
//! than ignoring it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::MatchError;
use crate::matching::cache::ResultsCache;
use crate::matching::client::MatchApi;
use crate::matching::normalizer::normalize;
use crate::types::{BatchKickoff, JobId, ServerMatchPayload};

const DEFAULT_REFETCH_DELAY_SECS: u64 = 5;
const DEFAULT_REFETCH_TIMEOUT_SECS: u64 = 30;

/// Progress of a batch scoring run for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Running,
    SettledComplete,
    SettledPartial,
    Failed,
}

impl BatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BatchStatus::Idle => "idle",
            BatchStatus::Running => "running",
            BatchStatus::SettledComplete => "settled_complete",
            BatchStatus::SettledPartial => "settled_partial",
            BatchStatus::Failed => "failed",
        }
    }

    /// Terminal states persist until the next explicit batch start.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchStatus::SettledComplete | BatchStatus::SettledPartial | BatchStatus::Failed
        )
    }
}

/// Ephemeral per-job batch state, observed through a `watch` channel.
#[derive(Debug, Clone)]
pub struct BatchJobState {
    pub job_id: JobId,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    /// Wall-clock counter while `Running`. Cosmetic, for "Analyzing... 12s"
    /// style progress; carries no correctness weight.
    pub elapsed_seconds: u64,
    /// Applications the server reported scoring, used only to judge
    /// completeness.
    pub expected_count: Option<usize>,
    /// Terminal error value for `Failed` and partial settlements.
    pub error: Option<String>,
    /// Monotonic per-job run counter. Late writes from a superseded run are
    /// discarded by comparing against it.
    pub run: u64,
}

impl BatchJobState {
    fn idle(job_id: JobId) -> Self {
        Self {
            job_id,
            status: BatchStatus::Idle,
            started_at: Utc::now(),
            elapsed_seconds: 0,
            expected_count: None,
            error: None,
            run: 0,
        }
    }

    fn running(job_id: JobId, run: u64) -> Self {
        Self {
            job_id,
            status: BatchStatus::Running,
            started_at: Utc::now(),
            elapsed_seconds: 0,
            expected_count: None,
            error: None,
            run,
        }
    }
}

struct JobEntry {
    state_tx: watch::Sender<BatchJobState>,
    worker: Option<JoinHandle<()>>,
    generation: u64,
}

impl JobEntry {
    fn new(job_id: &JobId) -> Self {
        let (state_tx, _) = watch::channel(BatchJobState::idle(job_id.clone()));
        Self {
            state_tx,
            worker: None,
            generation: 0,
        }
    }
}

/// Drives "score every application for this job" runs.
///
/// Consumers subscribe to state transitions instead of awaiting a return
/// value, because settlement may be deferred past the initiating call.
pub struct BatchOrchestrator {
    api: Arc<dyn MatchApi>,
    cache: Arc<ResultsCache>,
    refetch_delay: Duration,
    refetch_timeout: Duration,
    runs: Mutex<HashMap<JobId, JobEntry>>,
}

impl BatchOrchestrator {
    pub fn new(api: Arc<dyn MatchApi>, cache: Arc<ResultsCache>) -> Self {
        Self {
            api,
            cache,
            refetch_delay: Duration::from_secs(DEFAULT_REFETCH_DELAY_SECS),
            refetch_timeout: Duration::from_secs(DEFAULT_REFETCH_TIMEOUT_SECS),
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Delay before the one deferred re-fetch after an acknowledgement.
    pub fn with_refetch_delay(mut self, delay: Duration) -> Self {
        self.refetch_delay = delay;
        self
    }

    /// Bound on the deferred re-fetch call itself.
    pub fn with_refetch_timeout(mut self, timeout: Duration) -> Self {
        self.refetch_timeout = timeout;
        self
    }

    /// Start (or restart) the batch run for a job.
    ///
    /// Any previous run for the same job is aborted first: its tick stops
    /// and a pending deferred re-fetch is cancelled, never left to land
    /// after this run's writes. Must be called within a tokio runtime.
    pub fn start_batch(&self, job_id: &JobId) -> watch::Receiver<BatchJobState> {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = runs
            .entry(job_id.clone())
            .or_insert_with(|| JobEntry::new(job_id));

        if let Some(worker) = entry.worker.take() {
            worker.abort();
            debug!("Aborted previous batch run for job {}", job_id);
        }

        entry.generation += 1;
        let generation = entry.generation;
        let run_id = Uuid::new_v4();
        info!("Starting batch match run {} for job {}", run_id, job_id);

        entry
            .state_tx
            .send_replace(BatchJobState::running(job_id.clone(), generation));
        let receiver = entry.state_tx.subscribe();

        entry.worker = Some(tokio::spawn(run_batch(RunContext {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
            job_id: job_id.clone(),
            state_tx: entry.state_tx.clone(),
            generation,
            run_id,
            refetch_delay: self.refetch_delay,
            refetch_timeout: self.refetch_timeout,
        })));

        receiver
    }

    /// Subscribe to a job's batch state without starting anything. Jobs with
    /// no run yet read as `Idle`.
    pub fn batch_state(&self, job_id: &JobId) -> watch::Receiver<BatchJobState> {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        runs.entry(job_id.clone())
            .or_insert_with(|| JobEntry::new(job_id))
            .state_tx
            .subscribe()
    }

    /// Snapshot of the current state.
    pub fn current_state(&self, job_id: &JobId) -> BatchJobState {
        self.batch_state(job_id).borrow().clone()
    }

    /// Abort a live run. A `Running` state reverts to `Idle`; settled states
    /// stay visible.
    pub fn cancel(&self, job_id: &JobId) {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = runs.get_mut(job_id) {
            if let Some(worker) = entry.worker.take() {
                worker.abort();
                info!("Cancelled batch run for job {}", job_id);
            }
            entry.state_tx.send_if_modified(|state| {
                if state.status == BatchStatus::Running {
                    state.status = BatchStatus::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }
}

impl Drop for BatchOrchestrator {
    fn drop(&mut self) {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in runs.values_mut() {
            if let Some(worker) = entry.worker.take() {
                worker.abort();
            }
        }
    }
}

struct RunContext {
    api: Arc<dyn MatchApi>,
    cache: Arc<ResultsCache>,
    job_id: JobId,
    state_tx: watch::Sender<BatchJobState>,
    generation: u64,
    run_id: Uuid,
    refetch_delay: Duration,
    refetch_timeout: Duration,
}

enum BatchOutcome {
    Complete { cached: usize, total: usize },
    Partial { error: Option<String> },
    Failed { error: String },
}

async fn run_batch(ctx: RunContext) {
    let RunContext {
        api,
        cache,
        job_id,
        state_tx,
        generation,
        run_id,
        refetch_delay,
        refetch_timeout,
    } = ctx;

    let mut ticker = interval_at(
        Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );

    let work = async {
        match api.score_all(&job_id).await {
            Ok(BatchKickoff::Completed(results)) => {
                let (cached, total) = store_results(&cache, &job_id, results);
                info!(
                    "Batch run {} completed inline: {}/{} results cached for job {}",
                    run_id, cached, total, job_id
                );
                BatchOutcome::Complete { cached, total }
            }
            Ok(BatchKickoff::Accepted { message }) => {
                info!(
                    "Batch run {} acknowledged for job {} ({}), re-fetching in {}s",
                    run_id,
                    job_id,
                    message,
                    refetch_delay.as_secs()
                );
                tokio::time::sleep(refetch_delay).await;
                deferred_fetch(&*api, &cache, &job_id, run_id, refetch_timeout).await
            }
            Err(e) => {
                warn!("Batch run {} failed for job {}: {}", run_id, job_id, e);
                BatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    };
    tokio::pin!(work);

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {
                state_tx.send_if_modified(|state| {
                    if state.run == generation {
                        state.elapsed_seconds += 1;
                        true
                    } else {
                        false
                    }
                });
            }
            outcome = &mut work => break outcome,
        }
    };

    // Gated on the run counter inside the channel's critical section, so a
    // superseded run can never overwrite its successor's state.
    state_tx.send_if_modified(|state| {
        if state.run != generation {
            return false;
        }
        match &outcome {
            BatchOutcome::Complete { total, .. } => {
                state.status = BatchStatus::SettledComplete;
                state.expected_count = Some(*total);
                state.error = None;
            }
            BatchOutcome::Partial { error } => {
                state.status = BatchStatus::SettledPartial;
                state.error = error.clone();
            }
            BatchOutcome::Failed { error } => {
                state.status = BatchStatus::Failed;
                state.error = Some(error.clone());
            }
        }
        true
    });
}

/// The single deferred re-fetch. Bounded by `refetch_timeout`; never
/// repeated, so an abandoned page cannot leave runaway background polling.
async fn deferred_fetch(
    api: &dyn MatchApi,
    cache: &ResultsCache,
    job_id: &JobId,
    run_id: Uuid,
    refetch_timeout: Duration,
) -> BatchOutcome {
    match tokio::time::timeout(refetch_timeout, api.fetch_results(job_id)).await {
        Ok(Ok(results)) if !results.is_empty() => {
            let (cached, total) = store_results(cache, job_id, results);
            info!(
                "Batch run {} settled after re-fetch: {}/{} results cached for job {}",
                run_id, cached, total, job_id
            );
            BatchOutcome::Complete { cached, total }
        }
        Ok(Ok(_)) => {
            info!(
                "Batch run {} re-fetch returned nothing for job {}, settling partial",
                run_id, job_id
            );
            BatchOutcome::Partial { error: None }
        }
        Ok(Err(e)) => {
            warn!(
                "Batch run {} re-fetch failed for job {}: {}",
                run_id, job_id, e
            );
            BatchOutcome::Partial {
                error: Some(e.to_string()),
            }
        }
        Err(_) => {
            let timed_out = MatchError::BatchTimedOut {
                elapsed_seconds: refetch_timeout.as_secs(),
            };
            warn!("Batch run {} for job {}: {}", run_id, job_id, timed_out);
            BatchOutcome::Partial {
                error: Some(timed_out.to_string()),
            }
        }
    }
}

/// Normalize and cache a batch result array. Malformed elements are skipped
/// with a warning and stay absent from the cache; an unscorable application
/// must not appear as a zero-score match. Returns (cached, total).
pub(crate) fn store_results(
    cache: &ResultsCache,
    job_id: &JobId,
    payloads: Vec<ServerMatchPayload>,
) -> (usize, usize) {
    let total = payloads.len();
    let mut normalized = Vec::with_capacity(total);
    for payload in payloads {
        match normalize(payload.with_job(job_id)) {
            Ok(result) => normalized.push(result),
            Err(e) => warn!("Skipping malformed batch element for job {}: {}", job_id, e),
        }
    }
    let cached = cache.put_many(normalized);
    (cached, total)
}
