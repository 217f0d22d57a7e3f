//! Interaction agent.

use super::{score_with_model, usable_documents, Agent, AgentSettings, RunContext};
use crate::error::AgentError;
use crate::models::{AgentKind, Document, Finding};
use crate::provider::ModelProvider;
use async_trait::async_trait;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are analyzing founder call transcripts, interview notes and \
questionnaire answers. Judge how well the founders know their customers and numbers, \
how they handle hard questions, and whether what they say matches their materials. \
Answer in JSON only.";

/// Scores team, product and traction from transcripts and interviews.
pub struct InteractionAgent {
    model: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl InteractionAgent {
    pub fn new(model: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { model, settings }
    }
}

#[async_trait]
impl Agent for InteractionAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Interaction
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
