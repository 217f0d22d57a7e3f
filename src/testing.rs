//! Test doubles for agents and providers.

use crate::agent::{Agent, RunContext};
use crate::error::{AgentError, ProviderError};
use crate::models::{AgentKind, Category, Document, Finding};
use crate::provider::{ModelProvider, Prompt, SchemaHint, SearchHit, SearchProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Model that answers every prompt the same way and records prompts.
pub(crate) struct StubModel {
    outcome: Result<Value, ProviderError>,
    prompts: Mutex<Vec<Prompt>>,
}

impl StubModel {
    pub(crate) fn scores(value: Value) -> Self {
        Self {
            outcome: Ok(value),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            outcome: Err(ProviderError::Connection {
                service: "stub".to_string(),
                url: "http://stub".to_string(),
            }),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for StubModel {
    async fn generate(&self, prompt: &Prompt, _schema: SchemaHint) -> Result<Value, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.outcome.clone()
    }
}

/// Search provider returning one hit per query and recording queries.
#[derive(Default)]
pub(crate) struct StubSearch {
    failure: Option<ProviderError>,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub(crate) fn failing(err: ProviderError) -> Self {
        Self {
            failure: Some(err),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(ref err) = self.failure {
            return Err(err.clone());
        }
        Ok(vec![SearchHit {
            title: format!("Result for {}", query),
            snippet: "snippet".to_string(),
            url: "https://example.com".to_string(),
        }])
    }
}

/// What a [`StubAgent`] does when called.
pub(crate) enum Behavior {
    Succeed(Finding),
    Fail(AgentError),
    /// Sleep, then succeed.
    Delay(Duration, Finding),
    /// Fail with a provider error this many times, then succeed.
    Flaky(u32, Finding),
    Panic,
}

/// Agent with scripted behavior that counts its calls.
pub(crate) struct StubAgent {
    kind: AgentKind,
    behavior: Behavior,
    calls: AtomicU32,
}

impl StubAgent {
    pub(crate) fn new(kind: AgentKind, behavior: Behavior) -> Self {
        Self {
            kind,
            behavior,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for StubAgent {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn analyze(
        &self,
        _documents: &[Document],
        _context: &RunContext,
    ) -> Result<Finding, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            Behavior::Succeed(finding) => Ok(finding.clone()),
            Behavior::Fail(err) => Err(err.clone()),
            Behavior::Delay(delay, finding) => {
                tokio::time::sleep(*delay).await;
                Ok(finding.clone())
            }
            Behavior::Flaky(failures, finding) => {
                if call <= *failures {
                    Err(provider_error().into())
                } else {
                    Ok(finding.clone())
                }
            }
            Behavior::Panic => panic!("stub agent panicked"),
        }
    }
}

pub(crate) fn provider_error() -> ProviderError {
    ProviderError::Status {
        service: "stub".to_string(),
        status: 503,
        body: "overloaded".to_string(),
    }
}

/// Finding scoring every given category with the same score and confidence.
pub(crate) fn finding(kind: AgentKind, categories: &[Category], score: f64, confidence: f64) -> Finding {
    categories.iter().fold(Finding::new(kind, confidence), |f, c| {
        f.with_score(*c, score, format!("{} view of {}", kind, c))
    })
}

/// Stored-record fixture scoring every category the same.
pub(crate) fn sample_record(company: &str, score: f64) -> crate::models::AnalysisRecord {
    let findings = vec![finding(AgentKind::PitchDeck, &Category::ALL, score, 0.7)];
    let score_report = crate::analysis::aggregate(&findings);
    let created_at = chrono::Utc::now();

    crate::models::AnalysisRecord {
        analysis_id: crate::store::generate_id(company, created_at),
        company_name: company.to_string(),
        created_at,
        mode: crate::models::AnalysisMode::Full,
        questions: crate::analysis::compile_questions(&findings, &score_report),
        score_report,
        findings,
        failures: Vec::new(),
        documents: vec![crate::models::DocumentSummary::from(&Document::from_text(
            "pitch_deck.md",
            format!("{} pitch", company),
        ))],
    }
}
