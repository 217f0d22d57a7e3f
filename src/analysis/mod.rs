//! Scoring, question compilation and the analysis service.

pub mod aggregator;
pub mod questions;
pub mod service;

pub use aggregator::{aggregate, summary_text};
pub use questions::compile_questions;
pub use service::{build_record, InvestmentAnalyst, RunOptions};
