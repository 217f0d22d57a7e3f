//! Pitch deck agent.

use super::{score_with_model, usable_documents, Agent, AgentSettings, RunContext};
use crate::error::AgentError;
use crate::models::{AgentKind, Document, Finding};
use crate::provider::ModelProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a venture analyst reviewing a startup pitch deck. \
Assess the business model, the market opportunity, the founding team, the product, \
traction to date and the financial projections. Judge claims by the evidence shown, \
not by the confidence of the wording. Answer in JSON only.";

/// Scores all six categories from pitch decks and general material.
pub struct PitchDeckAgent {
    model: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl PitchDeckAgent {
    pub fn new(model: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { model, settings }
    }
}

#[async_trait]
impl Agent for PitchDeckAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::PitchDeck
    }

    async fn analyze(
        &self,
        documents: &[Document],
        context: &RunContext,
    ) -> Result<Finding, AgentError> {
        let docs = usable_documents(self.kind(), documents)?;
        debug!("Pitch deck agent reading {} document(s)", docs.len());

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::testing::StubModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_pitch_deck_scores() {
        let model = Arc::new(StubModel::scores(json!({
            "scores": {"team": 70, "market": 80, "product": 60, "traction": 75, "financials": 50, "moat": 40},
            "rationale": {"traction": "$2M ARR growing 40% MoM"},
            "confidence": 0.7
        })));
        let agent = PitchDeckAgent::new(model.clone(), AgentSettings::default());
        let docs = vec![Document::from_text("pitch.md", "Company X, $2M ARR, 40% MoM growth")];
        let context = RunContext::from_documents(uuid::Uuid::nil(), &docs);

        let finding = agent.analyze(&docs, &context).await.unwrap();
        assert_eq!(finding.agent_kind, AgentKind::PitchDeck);
        assert_eq!(finding.category_scores.len(), 6);
        assert_eq!(finding.category_scores[&Category::Traction], 75.0);
        assert_eq!(finding.rationale[&Category::Team], "");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("Company X, $2M ARR"));
    }

    #[tokio::test]
    async fn test_pitch_deck_without_text() {
        let model = Arc::new(StubModel::scores(json!({})));
        let agent = PitchDeckAgent::new(model.clone(), AgentSettings::default());
        let docs = vec![Document::failed("deck.pdf", "unsupported")];
        let context = RunContext::from_documents(uuid::Uuid::nil(), &docs);

        let err = agent.analyze(&docs, &context).await.unwrap_err();
        assert!(matches!(err, AgentError::Extraction(_)));
        assert!(model.prompts().is_empty());
    }
}
