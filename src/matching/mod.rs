// src/matching/mod.rs
//! Match-scoring orchestration: normalization, single and batch request
//! paths, the results cache, and presentation projections.

pub mod batch;
pub mod cache;
pub mod client;
pub mod normalizer;
pub mod presentation;
pub mod requester;

pub use batch::{BatchJobState, BatchOrchestrator, BatchStatus};
pub use cache::{CacheEvent, ResultsCache};
pub use client::{HttpMatchClient, MatchApi};
pub use normalizer::normalize;
pub use presentation::{
    detail_rows, display_percent, rank_results, score_band, sort_key, DetailRow, ScoreBand,
};
pub use requester::MatchRequester;
