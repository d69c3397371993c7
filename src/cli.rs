// src/cli.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::MatchServiceConfig;
use crate::matching::batch::{store_results, BatchOrchestrator, BatchStatus};
use crate::matching::cache::ResultsCache;
use crate::matching::client::{HttpMatchClient, MatchApi};
use crate::matching::presentation::{detail_rows, display_percent, rank_results, score_band};
use crate::matching::requester::MatchRequester;
use crate::types::{ApplicationId, JobId, MatchResult};

#[derive(Parser)]
#[command(name = "fitscore")]
#[command(about = "Match-scoring client for the recruitment platform")]
pub struct MatchCli {
    #[command(subcommand)]
    pub command: MatchCommand,
}

#[derive(Subcommand)]
pub enum MatchCommand {
    /// Score one application against a job
    Score {
        job_id: String,
        application_id: String,
    },
    /// Re-score every application for a job and follow progress
    ScoreAll { job_id: String },
    /// Fetch and display the current match results for a job
    Results { job_id: String },
}

pub async fn handle_match_command(cli: MatchCli, config: MatchServiceConfig) -> Result<()> {
    let client = HttpMatchClient::new(config.base_url.clone(), config.timeout())?;
    let client = match &config.api_key {
        Some(key) => client.with_api_key(key.clone()),
        None => client,
    };
    let api: Arc<dyn MatchApi> = Arc::new(client);
    let cache = Arc::new(ResultsCache::new());

    match cli.command {
        MatchCommand::Score {
            job_id,
            application_id,
        } => {
            let job_id = JobId(job_id);
            let application_id = ApplicationId(application_id);
            let requester = MatchRequester::new(api, cache);

            let result = requester.request_match(&job_id, &application_id).await?;
            print_single_result(&result);
        }

        MatchCommand::ScoreAll { job_id } => {
            let job_id = JobId(job_id);
            let orchestrator = BatchOrchestrator::new(api, Arc::clone(&cache))
                .with_refetch_delay(config.refetch_delay())
                .with_refetch_timeout(config.refetch_timeout());

            let mut state_rx = orchestrator.start_batch(&job_id);
            let final_state = loop {
                let state = state_rx.borrow_and_update().clone();
                match state.status {
                    BatchStatus::Running => {
                        println!("⏳ Analyzing applications... {}s", state.elapsed_seconds);
                    }
                    _ => break state,
                }
                if state_rx.changed().await.is_err() {
                    break state_rx.borrow().clone();
                }
            };

            match final_state.status {
                BatchStatus::SettledComplete => {
                    println!(
                        "✓ Batch settled complete: {} application(s) scored in {}s",
                        final_state.expected_count.unwrap_or(0),
                        final_state.elapsed_seconds
                    );
                }
                BatchStatus::SettledPartial => {
                    println!(
                        "⚠ Batch settled partial after {}s; results may still be computing",
                        final_state.elapsed_seconds
                    );
                    if let Some(error) = &final_state.error {
                        println!("  Last error: {}", error);
                    }
                }
                BatchStatus::Failed => {
                    anyhow::bail!(
                        "Batch scoring failed: {}",
                        final_state.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                }
                _ => {}
            }

            print_job_results(&cache.job_results(&job_id));
        }

        MatchCommand::Results { job_id } => {
            let job_id = JobId(job_id);
            let payloads = api.fetch_results(&job_id).await?;
            let (cached, total) = store_results(&cache, &job_id, payloads);
            println!("✓ Fetched {} result(s) for job {} ({} usable)", total, job_id, cached);
            print_job_results(&cache.job_results(&job_id));
        }
    }

    Ok(())
}

fn print_single_result(result: &MatchResult) {
    let band = score_band(result.score_unit);
    println!(
        "✓ Match score for {}: {} ({})",
        result.application_id,
        display_percent(result.score_unit),
        band.label()
    );
    println!(
        "  Skills: {}/{} matched ({})",
        result.skills.matching_skills.len(),
        result.skills.total_job_skills,
        display_percent(result.skills.match_rate_unit)
    );
    for strength in &result.strengths {
        println!("  + {}", strength);
    }
    for weakness in &result.weaknesses {
        println!("  - {}", weakness);
    }
    for row in detail_rows(result) {
        println!("    {:<24} {:>8}", row.label, display_percent(row.score_unit));
    }
    if !result.explanation.overall.is_empty() {
        println!("  {}", result.explanation.overall);
    }
}

fn print_job_results(results: &[MatchResult]) {
    if results.is_empty() {
        println!("No cached match results for this job.");
        return;
    }

    println!(
        "{:<24} {:<24} {:>8} {:>8}",
        "Application", "Applicant", "Score", "Band"
    );
    for result in rank_results(results.to_vec()) {
        println!(
            "{:<24} {:<24} {:>8} {:>8}",
            result.application_id,
            result.applicant_name.as_deref().unwrap_or("-"),
            display_percent(result.score_unit),
            score_band(result.score_unit).label()
        );
    }
}
