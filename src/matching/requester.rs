// src/matching/requester.rs
//! Single-application scoring path.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::MatchError;
use crate::matching::cache::ResultsCache;
use crate::matching::client::MatchApi;
use crate::matching::normalizer::normalize;
use crate::types::{ApplicationId, JobId, MatchResult};

/// Issues one scoring request for a specific (job, application) pair.
///
/// Exactly one network call, no internal retry; retry policy belongs to the
/// caller so this layer stays composable. The normalized result is written
/// to the cache before it is returned, so concurrent readers observe it even
/// if the caller discards the return value. On any failure the cache is left
/// untouched: a failed request never evicts an existing result.
pub struct MatchRequester {
    api: Arc<dyn MatchApi>,
    cache: Arc<ResultsCache>,
}

impl MatchRequester {
    pub fn new(api: Arc<dyn MatchApi>, cache: Arc<ResultsCache>) -> Self {
        Self { api, cache }
    }

    pub async fn request_match(
        &self,
        job_id: &JobId,
        application_id: &ApplicationId,
    ) -> Result<MatchResult, MatchError> {
        info!("Scoring application {} against job {}", application_id, job_id);

        let payload = self
            .api
            .score_application(job_id, application_id)
            .await
            .map_err(|e| {
                warn!(
                    "Match request failed for application {}: {}",
                    application_id, e
                );
                e
            })?;

        let result = normalize(payload.with_pair(job_id, application_id))?;
        self.cache.put(result.clone());

        info!(
            "Cached match score {:.3} for application {}",
            result.score_unit, application_id
        );
        Ok(result)
    }
}
