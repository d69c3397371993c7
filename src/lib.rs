// src/lib.rs
//! Match-scoring orchestration layer for the recruitment platform.
//!
//! Wraps a slow, possibly-asynchronous remote scoring service: single and
//! batch score requests, batch progress tracking without a push channel,
//! an in-memory last-write-wins results cache, and normalization of the
//! service's two score dialects into one canonical record.

pub mod cli;
pub mod config;
pub mod error;
pub mod matching;
pub mod types;

pub use config::MatchServiceConfig;
pub use error::{MatchError, TransportError};
pub use matching::{
    score_band, BatchJobState, BatchOrchestrator, BatchStatus, HttpMatchClient, MatchApi,
    MatchRequester, ResultsCache, ScoreBand,
};
pub use types::{ApplicationId, JobId, MatchResult};
