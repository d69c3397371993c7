// src/types/match_result.rs
//! Canonical scoring record shared by every component downstream of the
//! normalizer. Scores are always unit-scaled here; percentage forms exist
//! only on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier wrapper for applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Canonical match record for one (job, application) pair.
///
/// `computed_at` decides merge order in the results cache and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub applicant_name: Option<String>,
    /// Always in [0,1]. Percentage sources are divided by 100 on ingest.
    pub score_unit: f64,
    pub skills: SkillsMatch,
    /// Server-defined sub-metric names. Keys are opaque and not enumerable
    /// in advance.
    pub detailed_scores: BTreeMap<String, f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub explanation: MatchExplanation,
    pub computed_at: DateTime<Utc>,
}

/// Skills overlap between the job requirements and the CV.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillsMatch {
    /// Unit-scaled, even when the source delivered "70.5%" text.
    pub match_rate_unit: f64,
    pub matching_skills: BTreeSet<String>,
    pub missing_skills: BTreeSet<String>,
    pub total_job_skills: u32,
    pub total_cv_skills: u32,
}

/// Narrative sections of a match analysis. Sub-arrays are normalized to
/// empty, never absent, so consumers skip the null checks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchExplanation {
    pub overall: String,
    pub top_strengths: Vec<String>,
    pub key_gaps: Vec<String>,
    pub note: String,
}
