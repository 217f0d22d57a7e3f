//! Data room agent.

use super::{score_with_model, usable_documents, Agent, AgentSettings, RunContext};
use crate::error::AgentError;
use crate::models::{AgentKind, Document, Finding};
use crate::provider::ModelProvider;
use async_trait::async_trait;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a financial analyst working through a startup data room. \
Extract revenue, growth rates, retention, burn, runway and unit economics from the \
spreadsheets and metric exports provided. Flag numbers that do not reconcile. \
Answer in JSON only.";

/// Scores traction, financials and market from financial and metric exports.
pub struct DataRoomAgent {
    model: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl DataRoomAgent {
    pub fn new(model: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { model, settings }
    }
}

#[async_trait]
impl Agent for DataRoomAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::DataRoom
    }

    async fn analyze(
        &self,
        documents: &[Document],
        context: &RunContext,
    ) -> Result<Finding, AgentError> {
        let docs = usable_documents(self.kind(), documents)?;
        score_with_model(
            self.model.as_ref(),
            self.kind(),
            SYSTEM_PROMPT,
            &docs,
            context,
            self.settings,
            None,
        )
        .await
    }
}
