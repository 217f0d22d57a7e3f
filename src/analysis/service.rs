//! Caller-facing analysis operations.
//!
//! [`InvestmentAnalyst`] ties the orchestrator, the aggregator and the
//! store together: run the agents, score the findings, compile questions
//! and persist the resulting record.

use super::{aggregate, compile_questions};
use crate::agent::build_agents;
use crate::company::CompanyProfile;
use crate::config::Config;
use crate::error::{AnalysisError, StoreError};
use crate::models::{AnalysisMode, AnalysisRecord, AnalysisRun, Document, DocumentSummary, IndexEntry};
use crate::orchestrator::{Orchestrator, TaskPolicy};
use crate::provider::{DisabledSearch, ModelProvider, OllamaProvider, SearchProvider, TavilySearch};
use crate::store::{generate_id, AnalysisStore, ListFilter, StoreStats};
use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Per-call options for [`InvestmentAnalyst::run_analysis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Label for the record instead of the detected company name.
    pub company_name: Option<String>,
    /// Persist the record in the store.
    pub save: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            company_name: None,
            save: true,
        }
    }
}

/// Runs analyses and manages their stored results.
pub struct InvestmentAnalyst {
    orchestrator: Orchestrator,
    store: Arc<AnalysisStore>,
}

impl InvestmentAnalyst {
    pub fn new(orchestrator: Orchestrator, store: Arc<AnalysisStore>) -> Self {
        Self { orchestrator, store }
    }

    /// Wire up providers, agents and the store from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model: Arc<dyn ModelProvider> =
            Arc::new(OllamaProvider::new(&config.model).context("Failed to create model provider")?);

        let search: Arc<dyn SearchProvider> = if config.search.enabled {
            match TavilySearch::from_config(&config.search) {
                Ok(search) => Arc::new(search),
                Err(e) => {
                    warn!("Web search disabled: {}", e);
                    Arc::new(DisabledSearch)
                }
            }
        } else {
            Arc::new(DisabledSearch)
        };

        let agents = build_agents(model, search, config);
        let orchestrator =
            Orchestrator::with_agents(agents, TaskPolicy::from(&config.orchestrator));

        let store = AnalysisStore::open(&config.storage.data_dir).with_context(|| {
            format!(
                "Failed to open analysis store at {}",
                config.storage.data_dir.display()
            )
        })?;

        Ok(Self::new(orchestrator, Arc::new(store)))
    }

    pub fn store(&self) -> &AnalysisStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Analyze documents with the agents selected by `mode`.
    pub async fn run_analysis(
        &self,
        documents: Vec<Document>,
        mode: AnalysisMode,
        options: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<AnalysisRecord, AnalysisError> {
        if documents.is_empty() {
            return Err(AnalysisError::NoDocuments);
        }

        let run = self
            .orchestrator
            .run(documents, &mode.agent_kinds(), cancel)
            .await?;
        let record = build_record(&run, mode, options.company_name.as_deref());

        if options.save {
            let store = Arc::clone(&self.store);
            let saved = record.clone();
            tokio::task::spawn_blocking(move || store.save(&saved)).await??;
        }

        info!(
            "Analysis {} for {}: {}/100 ({})",
            record.analysis_id,
            record.company_name,
            record.score_report.overall_score,
            record.score_report.grade
        );
        Ok(record)
    }

    pub fn get_analysis(&self, analysis_id: &str) -> Result<AnalysisRecord, StoreError> {
        self.store.get(analysis_id)
    }

    pub fn list_analyses(&self, filter: &ListFilter) -> Vec<IndexEntry> {
        self.store.list(filter).collect()
    }

    pub fn delete_analysis(&self, analysis_id: &str) -> Result<(), StoreError> {
        self.store.delete(analysis_id)
    }

    pub fn store_stats(&self) -> Result<StoreStats, StoreError> {
        self.store.stats()
    }
}

/// Score a run and assemble the record that gets persisted.
///
/// Calling this again after [`Orchestrator::retry_failed`] recomputes the
/// report from the enlarged finding set.
pub fn build_record(run: &AnalysisRun, mode: AnalysisMode, company_name: Option<&str>) -> AnalysisRecord {
    let findings = run.findings();
    let score_report = aggregate(&findings);
    let questions = compile_questions(&findings, &score_report);

    let company_name = company_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .unwrap_or_else(|| {
            CompanyProfile::from_documents(&run.documents)
                .display_name()
                .to_string()
        });

    AnalysisRecord {
        analysis_id: generate_id(&company_name, run.created_at),
        company_name,
        created_at: run.created_at,
        mode,
        score_report,
        findings,
        failures: run.failures(),
        questions,
        documents: run.documents.iter().map(DocumentSummary::from).collect(),
    }
}
