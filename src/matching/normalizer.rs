// src/matching/normalizer.rs
//! Reconciles the two scoring dialects into one canonical `MatchResult`.
//!
//! Branch selection is by field presence, never by magnitude: a score of
//! exactly 1.0 is ambiguous between "1%" and "100%" if judged by value, so
//! the presence of `match_percentage` is what selects the percentage branch.

use chrono::Utc;

use crate::error::MatchError;
use crate::types::{
    ApplicationId, JobId, MatchExplanation, MatchRate, MatchResult, RawSkillsMatch,
    ServerMatchPayload, SkillsMatch,
};

/// Convert a raw payload from either endpoint into the canonical record.
///
/// Fails with `MalformedPayload` when identifiers or both score fields are
/// missing, or when a score is outside its dialect's range. A payload that
/// cannot produce a real score never produces a default one.
pub fn normalize(raw: ServerMatchPayload) -> Result<MatchResult, MatchError> {
    let application_id = required_id(raw.application_id, "application_id")?;
    let job_id = required_id(raw.job_id, "job_id")?;

    let score_unit = match (raw.match_percentage, raw.match_score) {
        (Some(percentage), _) => {
            if !(0.0..=100.0).contains(&percentage) {
                return Err(MatchError::MalformedPayload(format!(
                    "match_percentage {} outside [0,100]",
                    percentage
                )));
            }
            percentage / 100.0
        }
        (None, Some(score)) => {
            if !(0.0..=1.0).contains(&score) {
                return Err(MatchError::MalformedPayload(format!(
                    "match_score {} outside [0,1]",
                    score
                )));
            }
            score
        }
        (None, None) => {
            return Err(MatchError::MalformedPayload(
                "neither match_score nor match_percentage present".to_string(),
            ))
        }
    };

    let skills = match raw.skills_match {
        Some(section) => normalize_skills(section)?,
        None => SkillsMatch::default(),
    };

    // The dialects disagree on the list names; take whichever is present,
    // single-match spelling first.
    let strengths = raw.key_strengths.or(raw.strengths).unwrap_or_default();
    let weaknesses = raw.areas_to_improve.or(raw.weaknesses).unwrap_or_default();

    let explanation = match raw.explanation {
        Some(block) => MatchExplanation {
            overall: block
                .overall
                .or(raw.analysis)
                .unwrap_or_default(),
            top_strengths: block.top_strengths.unwrap_or_default(),
            key_gaps: block.key_gaps.unwrap_or_default(),
            note: block.note.unwrap_or_default(),
        },
        None => MatchExplanation {
            overall: raw.analysis.unwrap_or_default(),
            ..MatchExplanation::default()
        },
    };

    Ok(MatchResult {
        application_id: ApplicationId(application_id),
        job_id: JobId(job_id),
        applicant_name: raw.applicant_name,
        score_unit,
        skills,
        detailed_scores: raw.detailed_scores.unwrap_or_default(),
        strengths,
        weaknesses,
        explanation,
        computed_at: raw.computed_at.unwrap_or_else(Utc::now),
    })
}

fn required_id(value: Option<String>, field: &str) -> Result<String, MatchError> {
    match value {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(MatchError::MalformedPayload(format!("missing {}", field))),
    }
}

fn normalize_skills(section: RawSkillsMatch) -> Result<SkillsMatch, MatchError> {
    let match_rate_unit = match section.match_rate {
        Some(MatchRate::Unit(value)) => {
            if !(0.0..=1.0).contains(&value) {
                return Err(MatchError::MalformedPayload(format!(
                    "match_rate {} outside [0,1]",
                    value
                )));
            }
            value
        }
        Some(MatchRate::Text(text)) => parse_match_rate_text(&text)?,
        None => 0.0,
    };

    Ok(SkillsMatch {
        match_rate_unit,
        matching_skills: section
            .matching_skills
            .unwrap_or_default()
            .into_iter()
            .collect(),
        missing_skills: section
            .missing_skills
            .unwrap_or_default()
            .into_iter()
            .collect(),
        total_job_skills: section.total_job_skills.unwrap_or(0),
        total_cv_skills: section.total_cv_skills.unwrap_or(0),
    })
}

/// Parse the text form of a match rate. The text form always carries
/// percentage semantics, with or without the trailing `%`.
fn parse_match_rate_text(text: &str) -> Result<f64, MatchError> {
    let trimmed = text.trim().trim_end_matches('%').trim();
    let percentage: f64 = trimmed.parse().map_err(|_| {
        MatchError::MalformedPayload(format!("unparseable match_rate {:?}", text))
    })?;
    if !(0.0..=100.0).contains(&percentage) {
        return Err(MatchError::MalformedPayload(format!(
            "match_rate {:?} outside [0,100]",
            text
        )));
    }
    Ok(percentage / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawExplanation;
    use chrono::{TimeZone, Utc};

    fn base_payload() -> ServerMatchPayload {
        ServerMatchPayload {
            application_id: Some("app-1".to_string()),
            job_id: Some("job-1".to_string()),
            ..ServerMatchPayload::default()
        }
    }

    #[test]
    fn percentage_and_unit_dialects_converge() {
        let mut percent = base_payload();
        percent.match_percentage = Some(70.5);

        let mut unit = base_payload();
        unit.match_score = Some(0.705);

        let from_percent = normalize(percent).expect("percentage payload");
        let from_unit = normalize(unit).expect("unit payload");
        assert_eq!(from_percent.score_unit, 0.705);
        assert_eq!(from_unit.score_unit, 0.705);
    }

    #[test]
    fn percentage_presence_wins_over_magnitude() {
        // A payload carrying match_percentage: 1.0 means 1%, not a perfect
        // score, because the field's presence selects the branch.
        let mut payload = base_payload();
        payload.match_percentage = Some(1.0);
        payload.match_score = Some(1.0);

        let result = normalize(payload).expect("should normalize");
        assert_eq!(result.score_unit, 0.01);
    }

    #[test]
    fn match_rate_text_is_unit_scaled() {
        let mut payload = base_payload();
        payload.match_score = Some(0.8);
        payload.skills_match = Some(RawSkillsMatch {
            match_rate: Some(MatchRate::Text("70.5%".to_string())),
            matching_skills: Some(vec!["rust".to_string(), "sql".to_string()]),
            missing_skills: Some(vec!["kubernetes".to_string()]),
            total_job_skills: Some(10),
            total_cv_skills: Some(7),
        });

        let result = normalize(payload).expect("should normalize");
        assert_eq!(result.skills.match_rate_unit, 0.705);
        assert_eq!(result.skills.matching_skills.len(), 2);
        assert_eq!(result.skills.total_job_skills, 10);
    }

    #[test]
    fn match_rate_unit_fraction_is_used_directly() {
        let mut payload = base_payload();
        payload.match_score = Some(0.8);
        payload.skills_match = Some(RawSkillsMatch {
            match_rate: Some(MatchRate::Unit(0.705)),
            ..RawSkillsMatch::default()
        });

        let result = normalize(payload).expect("should normalize");
        assert_eq!(result.skills.match_rate_unit, 0.705);
    }

    #[test]
    fn missing_both_score_fields_is_malformed() {
        let payload = base_payload();
        let err = normalize(payload).expect_err("must not default to zero");
        assert!(matches!(err, MatchError::MalformedPayload(_)));
    }

    #[test]
    fn missing_application_id_is_malformed() {
        let mut payload = base_payload();
        payload.application_id = None;
        payload.match_score = Some(0.5);
        let err = normalize(payload).expect_err("id is required");
        assert!(matches!(err, MatchError::MalformedPayload(ref m) if m.contains("application_id")));
    }

    #[test]
    fn blank_job_id_is_malformed() {
        let mut payload = base_payload();
        payload.job_id = Some("  ".to_string());
        payload.match_score = Some(0.5);
        assert!(normalize(payload).is_err());
    }

    #[test]
    fn out_of_range_scores_are_malformed() {
        let mut high_unit = base_payload();
        high_unit.match_score = Some(1.2);
        assert!(normalize(high_unit).is_err());

        let mut high_percent = base_payload();
        high_percent.match_percentage = Some(130.0);
        assert!(normalize(high_percent).is_err());

        let mut garbage_rate = base_payload();
        garbage_rate.match_score = Some(0.5);
        garbage_rate.skills_match = Some(RawSkillsMatch {
            match_rate: Some(MatchRate::Text("n/a".to_string())),
            ..RawSkillsMatch::default()
        });
        assert!(normalize(garbage_rate).is_err());
    }

    #[test]
    fn optional_lists_normalize_to_empty() {
        let mut payload = base_payload();
        payload.match_score = Some(0.5);

        let result = normalize(payload).expect("should normalize");
        assert!(result.strengths.is_empty());
        assert!(result.weaknesses.is_empty());
        assert!(result.detailed_scores.is_empty());
        assert!(result.explanation.top_strengths.is_empty());
    }

    #[test]
    fn dialect_list_spellings_both_map() {
        let mut single = base_payload();
        single.match_score = Some(0.5);
        single.key_strengths = Some(vec!["strong rust".to_string()]);
        single.areas_to_improve = Some(vec!["needs sql".to_string()]);

        let mut batch = base_payload();
        batch.match_percentage = Some(50.0);
        batch.strengths = Some(vec!["strong rust".to_string()]);
        batch.weaknesses = Some(vec!["needs sql".to_string()]);

        let from_single = normalize(single).expect("single dialect");
        let from_batch = normalize(batch).expect("batch dialect");
        assert_eq!(from_single.strengths, from_batch.strengths);
        assert_eq!(from_single.weaknesses, from_batch.weaknesses);
    }

    #[test]
    fn analysis_text_becomes_overall_explanation() {
        let mut payload = base_payload();
        payload.match_score = Some(0.5);
        payload.analysis = Some("solid backend profile".to_string());

        let result = normalize(payload).expect("should normalize");
        assert_eq!(result.explanation.overall, "solid backend profile");
    }

    #[test]
    fn structured_explanation_is_preserved() {
        let mut payload = base_payload();
        payload.match_score = Some(0.5);
        payload.explanation = Some(RawExplanation {
            overall: Some("good fit".to_string()),
            top_strengths: Some(vec!["rust".to_string()]),
            key_gaps: None,
            note: Some("recent grad".to_string()),
        });

        let result = normalize(payload).expect("should normalize");
        assert_eq!(result.explanation.overall, "good fit");
        assert_eq!(result.explanation.top_strengths, vec!["rust".to_string()]);
        assert!(result.explanation.key_gaps.is_empty());
        assert_eq!(result.explanation.note, "recent grad");
    }

    #[test]
    fn wire_computed_at_is_kept_and_absent_is_stamped() {
        let stamped = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single();
        let mut payload = base_payload();
        payload.match_score = Some(0.5);
        payload.computed_at = stamped;

        let result = normalize(payload).expect("should normalize");
        assert_eq!(Some(result.computed_at), stamped);

        let mut unstamped = base_payload();
        unstamped.match_score = Some(0.5);
        let before = Utc::now();
        let result = normalize(unstamped).expect("should normalize");
        assert!(result.computed_at >= before);
    }
}
