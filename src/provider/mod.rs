//! Model and search provider interfaces.
//!
//! Agents reach the network only through these traits, so orchestration
//! and aggregation can be exercised with stub providers.

mod ollama;
mod tavily;

pub use ollama::OllamaProvider;
pub use tavily::{DisabledSearch, TavilySearch};

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Shape of the structured output a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaHint {
    /// Category scores, rationale, insights and confidence.
    Scores,
    /// Prioritized founder questions.
    Questions,
}

impl SchemaHint {
    /// Example object shown to the model.
    pub fn example(&self) -> &'static str {
        match self {
            SchemaHint::Scores => {
                r#"{"scores": {"team": 72, "market": 65}, "rationale": {"team": "why", "market": "why"}, "insights": ["key observation"], "confidence": 0.7}"#
            }
            SchemaHint::Questions => {
                r#"{"questions": [{"priority": "must_ask", "category": "traction", "question": "text", "validates": "what the answer proves", "red_flags": "answers to worry about"}], "gaps": ["missing information"], "confidence": 0.6}"#
            }
        }
    }
}

/// Text generation with structured (JSON) output.
///
/// A returned `Value::String` means the model answered with text that was
/// not valid JSON; callers decide whether it can be salvaged.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, prompt: &Prompt, schema: SchemaHint) -> Result<Value, ProviderError>;
}

/// One ranked web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Web search.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError>;
}
