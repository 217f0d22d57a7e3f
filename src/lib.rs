//! PitchLens - multi-agent startup investment analysis.
//!
//! Specialized agents read pitch decks, data-room files and call
//! transcripts, the orchestrator runs them concurrently with per-task
//! timeouts and retries, the aggregator merges their findings into a
//! weighted investment score, and the store keeps every completed
//! analysis on disk.

pub mod agent;
pub mod analysis;
pub mod cli;
pub mod company;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod report;
pub mod scanner;
pub mod store;

#[cfg(test)]
mod testing;
