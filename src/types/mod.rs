// src/types/mod.rs
//! Data model: canonical records and endpoint wire shapes

pub mod match_result;
pub mod payload;

pub use match_result::{ApplicationId, JobId, MatchExplanation, MatchResult, SkillsMatch};
pub use payload::{
    BatchKickoff, BatchMatchResponse, MatchRate, MatchResultsResponse, RawExplanation,
    RawSkillsMatch, ServerMatchPayload,
};
