//! Analysis agents.
//!
//! Each agent turns the documents routed to it into one [`Finding`].
//! Agents are stateless; everything they need arrives through the
//! documents and the shared [`RunContext`].

mod data_room;
mod interaction;
mod pitch_deck;
pub mod prompt;
mod questions;
pub mod response;
mod web;

pub use data_room::DataRoomAgent;
pub use interaction::InteractionAgent;
pub use pitch_deck::PitchDeckAgent;
pub use questions::QuestionAgent;
pub use web::{search_queries, WebIntelligenceAgent};

use crate::company::{extract_claims, CompanyProfile};
use crate::config::Config;
use crate::error::{AgentError, ExtractionError};
use crate::models::{AgentKind, Document, Finding};
use crate::provider::{ModelProvider, SchemaHint, SearchProvider};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Read-only facts computed once per run and shared with every agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub run_id: Uuid,
    pub profile: CompanyProfile,
    /// Quantitative claims found across all usable documents.
    pub claims: Vec<String>,
}

impl RunContext {
    pub fn from_documents(run_id: Uuid, documents: &[Document]) -> Self {
        Self {
            run_id,
            profile: CompanyProfile::from_documents(documents),
            claims: extract_claims(documents),
        }
    }
}

/// An analysis agent.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Which agent this is.
    fn kind(&self) -> AgentKind;

    /// Analyze the documents routed to this agent.
    async fn analyze(
        &self,
        documents: &[Document],
        context: &RunContext,
    ) -> Result<Finding, AgentError>;
}

/// Settings shared by the model-backed agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    /// Characters of each document included in a prompt.
    pub max_document_chars: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_document_chars: 12_000,
        }
    }
}

/// Usable documents, or an extraction error when there are none.
pub(crate) fn usable_documents(
    kind: AgentKind,
    documents: &[Document],
) -> Result<Vec<&Document>, AgentError> {
    let usable: Vec<&Document> = documents.iter().filter(|d| d.is_usable()).collect();
    if usable.is_empty() {
        return Err(ExtractionError::NoDocuments(kind).into());
    }
    Ok(usable)
}

/// Prompt the model for scores on the agent's focus categories.
pub(crate) async fn score_with_model(
    model: &dyn ModelProvider,
    kind: AgentKind,
    system: &str,
    documents: &[&Document],
    context: &RunContext,
    settings: AgentSettings,
    extra: Option<&str>,
) -> Result<Finding, AgentError> {
    let prompt = prompt::scoring_prompt(
        system,
        kind.focus(),
        documents,
        context,
        settings.max_document_chars,
        extra,
    );
    let value = model.generate(&prompt, SchemaHint::Scores).await?;
    let document_chars = documents.iter().map(|d| d.extracted_text.len()).sum();
    response::parse_scores(kind, value, kind.focus(), document_chars)
}

/// Build every agent kind over the given providers.
pub fn build_agents(
    model: Arc<dyn ModelProvider>,
    search: Arc<dyn SearchProvider>,
    config: &Config,
) -> Vec<Arc<dyn Agent>> {
    let settings = AgentSettings {
        max_document_chars: config.model.max_document_chars,
    };

    vec![
        Arc::new(PitchDeckAgent::new(Arc::clone(&model), settings)) as Arc<dyn Agent>,
        Arc::new(DataRoomAgent::new(Arc::clone(&model), settings)) as Arc<dyn Agent>,
        Arc::new(WebIntelligenceAgent::new(
            Arc::clone(&model),
            search,
            settings,
            config.search.max_claim_queries,
        )) as Arc<dyn Agent>,
        Arc::new(InteractionAgent::new(Arc::clone(&model), settings)) as Arc<dyn Agent>,
        Arc::new(QuestionAgent::new(model, settings)) as Arc<dyn Agent>,
    ]
}
