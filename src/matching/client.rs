// src/matching/client.rs
//! Transport seam for the remote scoring service.
//!
//! `MatchApi` is the trait the requester and orchestrator are written
//! against; `HttpMatchClient` is the production implementation. Tests drive
//! the components through scripted in-memory implementations instead.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{MatchError, TransportError};
use crate::types::{
    ApplicationId, BatchKickoff, BatchMatchResponse, JobId, MatchResultsResponse,
    ServerMatchPayload,
};

/// Remote operations consumed by the scoring layer.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Score one (job, application) pair.
    async fn score_application(
        &self,
        job_id: &JobId,
        application_id: &ApplicationId,
    ) -> Result<ServerMatchPayload, MatchError>;

    /// Ask the server to score every application for a job. The server
    /// either completes synchronously or acknowledges and computes later.
    async fn score_all(&self, job_id: &JobId) -> Result<BatchKickoff, MatchError>;

    /// Fetch whatever results the server currently has for a job.
    async fn fetch_results(&self, job_id: &JobId) -> Result<Vec<ServerMatchPayload>, MatchError>;
}

/// HTTP client for the scoring service.
pub struct HttpMatchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMatchClient {
    /// Create a client with every request bounded by `timeout`.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, MatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            client,
            base_url,
            api_key: None,
        })
    }

    /// Attach a bearer key sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, MatchError> {
        let request = match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        };

        let response = request.send().await.map_err(TransportError::Http)?;
        let status = response.status();

        if status.is_success() {
            Ok(response.text().await.map_err(TransportError::Http)?)
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!("match service returned {}: {}", status, body);
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into())
        }
    }
}

#[async_trait]
impl MatchApi for HttpMatchClient {
    async fn score_application(
        &self,
        job_id: &JobId,
        application_id: &ApplicationId,
    ) -> Result<ServerMatchPayload, MatchError> {
        let url = format!(
            "{}/jobs/{}/applications/{}/match",
            self.base_url, job_id, application_id
        );
        info!("Requesting single match score: {}", url);

        let body = self.send(self.client.post(&url)).await?;
        serde_json::from_str(&body).map_err(|e| {
            MatchError::MalformedPayload(format!("single match response: {}", e))
        })
    }

    async fn score_all(&self, job_id: &JobId) -> Result<BatchKickoff, MatchError> {
        let url = format!("{}/jobs/{}/match-all", self.base_url, job_id);
        info!("Requesting batch match score: {}", url);

        let body = self.send(self.client.post(&url)).await?;
        let response: BatchMatchResponse = serde_json::from_str(&body)
            .map_err(|e| MatchError::MalformedPayload(format!("batch response: {}", e)))?;
        Ok(response.into_kickoff())
    }

    async fn fetch_results(&self, job_id: &JobId) -> Result<Vec<ServerMatchPayload>, MatchError> {
        let url = format!("{}/jobs/{}/match-results", self.base_url, job_id);
        info!("Fetching batch match results: {}", url);

        let body = self.send(self.client.get(&url)).await?;
        let response: MatchResultsResponse = serde_json::from_str(&body)
            .map_err(|e| MatchError::MalformedPayload(format!("results response: {}", e)))?;
        Ok(response.into_results())
    }
}
