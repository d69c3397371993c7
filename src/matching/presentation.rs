// src/matching/presentation.rs
//! UI-ready projections of match results. Pure and stateless; reads cache
//! values, produces no side effects.

use crate::types::MatchResult;

/// Score bucket rendered across every screen. The 0.70/0.40 cutoffs are
/// defined here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    pub const fn label(self) -> &'static str {
        match self {
            ScoreBand::Low => "low",
            ScoreBand::Medium => "medium",
            ScoreBand::High => "high",
        }
    }

    pub const fn hex_color(self) -> &'static str {
        match self {
            ScoreBand::Low => "#ef4444",
            ScoreBand::Medium => "#f59e0b",
            ScoreBand::High => "#22c55e",
        }
    }
}

/// Bucket a unit-scaled score: High at and above 0.70, Medium at and above
/// 0.40, Low below.
pub fn score_band(score_unit: f64) -> ScoreBand {
    if score_unit >= 0.70 {
        ScoreBand::High
    } else if score_unit >= 0.40 {
        ScoreBand::Medium
    } else {
        ScoreBand::Low
    }
}

/// Sort key for result listings.
pub fn sort_key(result: &MatchResult) -> f64 {
    result.score_unit
}

/// Order results for the job-detail screen: best score first, ties keep
/// their incoming order.
pub fn rank_results(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    results.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
    results
}

/// Render a unit score the one way the UI shows percentages.
pub fn display_percent(score_unit: f64) -> String {
    format!("{:.1}%", score_unit * 100.0)
}

/// One renderable sub-metric row.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub label: String,
    pub score_unit: f64,
    pub band: ScoreBand,
}

/// Rows for the detailed-scores panel. The key set is server-defined and
/// opaque: unknown keys get readable labels, a missing map yields no rows.
pub fn detail_rows(result: &MatchResult) -> Vec<DetailRow> {
    result
        .detailed_scores
        .iter()
        .map(|(key, &score_unit)| DetailRow {
            label: humanize_key(key),
            score_unit,
            band: score_band(score_unit),
        })
        .collect()
}

fn humanize_key(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApplicationId, JobId, MatchExplanation, SkillsMatch};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result_with_score(application: &str, score: f64) -> MatchResult {
        MatchResult {
            application_id: ApplicationId::from(application),
            job_id: JobId::from("j"),
            applicant_name: None,
            score_unit: score,
            skills: SkillsMatch::default(),
            detailed_scores: BTreeMap::new(),
            strengths: vec![],
            weaknesses: vec![],
            explanation: MatchExplanation::default(),
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn bands_hit_exactly_at_the_cutoffs() {
        assert_eq!(score_band(0.70), ScoreBand::High);
        assert_eq!(score_band(0.699), ScoreBand::Medium);
        assert_eq!(score_band(0.40), ScoreBand::Medium);
        assert_eq!(score_band(0.399), ScoreBand::Low);
        assert_eq!(score_band(0.0), ScoreBand::Low);
        assert_eq!(score_band(1.0), ScoreBand::High);
    }

    #[test]
    fn band_helpers_are_consistent() {
        assert_eq!(ScoreBand::High.label(), "high");
        assert_eq!(ScoreBand::Medium.hex_color(), "#f59e0b");
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let ranked = rank_results(vec![
            result_with_score("a", 0.4),
            result_with_score("b", 0.9),
            result_with_score("c", 0.4),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.application_id.0.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn percent_display_has_one_decimal() {
        assert_eq!(display_percent(0.705), "70.5%");
        assert_eq!(display_percent(1.0), "100.0%");
        assert_eq!(display_percent(0.0), "0.0%");
    }

    #[test]
    fn detail_rows_handle_unknown_keys() {
        let mut result = result_with_score("a", 0.8);
        result
            .detailed_scores
            .insert("skills_coverage".to_string(), 0.75);
        result
            .detailed_scores
            .insert("seniority-fit".to_string(), 0.30);

        let rows = detail_rows(&result);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Seniority Fit");
        assert_eq!(rows[0].band, ScoreBand::Low);
        assert_eq!(rows[1].label, "Skills Coverage");
        assert_eq!(rows[1].band, ScoreBand::High);
    }

    #[test]
    fn empty_detail_map_yields_no_rows() {
        let result = result_with_score("a", 0.8);
        assert!(detail_rows(&result).is_empty());
    }
}
