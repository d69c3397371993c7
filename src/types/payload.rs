// src/types/payload.rs
//! Wire shapes for the two scoring endpoints.
//!
//! The single-match endpoint speaks `match_score` in [0,1] with
//! `key_strengths`/`areas_to_improve`; the batch endpoints speak
//! `match_percentage` in [0,100] with `strengths`/`weaknesses` and
//! `detail_scores`. One lenient payload covers both dialects and the
//! normalizer reconciles them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::match_result::{ApplicationId, JobId};

/// Raw scoring payload as delivered by either endpoint dialect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerMatchPayload {
    pub application_id: Option<String>,
    pub job_id: Option<String>,
    pub applicant_name: Option<String>,
    /// Single-match dialect, unit interval.
    pub match_score: Option<f64>,
    /// Batch dialect, percentage. Presence of this field, never magnitude,
    /// selects the percentage branch during normalization.
    pub match_percentage: Option<f64>,
    pub skills_match: Option<RawSkillsMatch>,
    #[serde(alias = "detail_scores")]
    pub detailed_scores: Option<BTreeMap<String, f64>>,
    /// Single-match dialect narrative, mapped to `explanation.overall` when
    /// no structured explanation is present.
    pub analysis: Option<String>,
    pub key_strengths: Option<Vec<String>>,
    pub areas_to_improve: Option<Vec<String>>,
    pub strengths: Option<Vec<String>>,
    pub weaknesses: Option<Vec<String>>,
    pub explanation: Option<RawExplanation>,
    pub computed_at: Option<DateTime<Utc>>,
}

impl ServerMatchPayload {
    /// Fill identifiers the single-match response omits; the request URL
    /// already addressed the pair, so the caller's ids are authoritative.
    pub fn with_pair(mut self, job_id: &JobId, application_id: &ApplicationId) -> Self {
        self.job_id.get_or_insert_with(|| job_id.0.clone());
        self.application_id
            .get_or_insert_with(|| application_id.0.clone());
        self
    }

    /// Fill the job identifier on a batch element that omits it.
    pub fn with_job(mut self, job_id: &JobId) -> Self {
        self.job_id.get_or_insert_with(|| job_id.0.clone());
        self
    }
}

/// Skills section; `match_rate` arrives as `"70.5%"` text from the
/// single-match endpoint and as a unit fraction from the batch endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSkillsMatch {
    pub match_rate: Option<MatchRate>,
    pub matching_skills: Option<Vec<String>>,
    pub missing_skills: Option<Vec<String>>,
    pub total_job_skills: Option<u32>,
    pub total_cv_skills: Option<u32>,
}

/// The two on-wire forms of a skills match rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchRate {
    Unit(f64),
    Text(String),
}

/// Optional structured explanation block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExplanation {
    pub overall: Option<String>,
    pub top_strengths: Option<Vec<String>>,
    pub key_gaps: Option<Vec<String>>,
    pub note: Option<String>,
}

/// Batch kickoff response body: a completed result array, or an
/// acknowledgement when the server computes asynchronously.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchMatchResponse {
    pub results: Option<Vec<ServerMatchPayload>>,
    pub message: Option<String>,
}

/// The client's reading of a batch kickoff response.
#[derive(Debug, Clone)]
pub enum BatchKickoff {
    /// The response itself carried scored results.
    Completed(Vec<ServerMatchPayload>),
    /// Acknowledgement only; results must be fetched later.
    Accepted { message: String },
}

impl BatchMatchResponse {
    pub fn into_kickoff(self) -> BatchKickoff {
        match self.results {
            Some(results) if !results.is_empty() => BatchKickoff::Completed(results),
            _ => BatchKickoff::Accepted {
                message: self.message.unwrap_or_else(|| "accepted".to_string()),
            },
        }
    }
}

/// Result-set fetch body; the service has shipped both a bare array and a
/// wrapped object over time.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MatchResultsResponse {
    Bare(Vec<ServerMatchPayload>),
    Wrapped { results: Vec<ServerMatchPayload> },
}

impl MatchResultsResponse {
    pub fn into_results(self) -> Vec<ServerMatchPayload> {
        match self {
            MatchResultsResponse::Bare(results) => results,
            MatchResultsResponse::Wrapped { results } => results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_rate_accepts_both_wire_forms() {
        let text: RawSkillsMatch = serde_json::from_str(r#"{"match_rate": "70.5%"}"#)
            .expect("text form should parse");
        assert!(matches!(text.match_rate, Some(MatchRate::Text(ref s)) if s == "70.5%"));

        let unit: RawSkillsMatch =
            serde_json::from_str(r#"{"match_rate": 0.705}"#).expect("unit form should parse");
        assert!(matches!(unit.match_rate, Some(MatchRate::Unit(v)) if v == 0.705));
    }

    #[test]
    fn detail_scores_alias_maps_to_detailed_scores() {
        let payload: ServerMatchPayload =
            serde_json::from_str(r#"{"detail_scores": {"skills": 0.8}}"#)
                .expect("alias should parse");
        let scores = payload.detailed_scores.expect("map should be present");
        assert_eq!(scores.get("skills"), Some(&0.8));
    }

    #[test]
    fn kickoff_with_results_is_completed() {
        let response: BatchMatchResponse =
            serde_json::from_str(r#"{"results": [{"application_id": "a1", "match_score": 0.5}]}"#)
                .expect("results body should parse");
        assert!(matches!(response.into_kickoff(), BatchKickoff::Completed(ref r) if r.len() == 1));
    }

    #[test]
    fn kickoff_with_message_only_is_accepted() {
        let response: BatchMatchResponse =
            serde_json::from_str(r#"{"message": "started"}"#).expect("ack body should parse");
        assert!(
            matches!(response.into_kickoff(), BatchKickoff::Accepted { ref message } if message == "started")
        );
    }

    #[test]
    fn kickoff_with_empty_results_is_accepted() {
        let response: BatchMatchResponse =
            serde_json::from_str(r#"{"results": []}"#).expect("empty body should parse");
        assert!(matches!(
            response.into_kickoff(),
            BatchKickoff::Accepted { .. }
        ));
    }

    #[test]
    fn results_body_parses_bare_and_wrapped() {
        let bare: MatchResultsResponse =
            serde_json::from_str(r#"[{"application_id": "a1"}]"#).expect("bare should parse");
        assert_eq!(bare.into_results().len(), 1);

        let wrapped: MatchResultsResponse =
            serde_json::from_str(r#"{"results": [{"application_id": "a1"}]}"#)
                .expect("wrapped should parse");
        assert_eq!(wrapped.into_results().len(), 1);
    }

    #[test]
    fn with_pair_does_not_override_payload_ids() {
        let payload = ServerMatchPayload {
            application_id: Some("a-wire".to_string()),
            ..Default::default()
        };
        let filled = payload.with_pair(&JobId::from("j1"), &ApplicationId::from("a-caller"));
        assert_eq!(filled.application_id.as_deref(), Some("a-wire"));
        assert_eq!(filled.job_id.as_deref(), Some("j1"));
    }
}
