//! Founder question agent.

use super::{prompt, response, usable_documents, Agent, AgentSettings, RunContext};
use crate::error::AgentError;
use crate::models::{AgentKind, Document, Finding};
use crate::provider::{ModelProvider, SchemaHint};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an experienced venture investor preparing a founder \
interview. Find the gaps, unverified claims and inconsistencies in the materials and turn \
them into sharp, specific questions. Prefer questions whose answers can be checked. \
Answer in JSON only.";

/// Produces prioritized due-diligence questions. Reports no scores.
pub struct QuestionAgent {
    model: Arc<dyn ModelProvider>,
    settings: AgentSettings,
}

impl QuestionAgent {
    pub fn new(model: Arc<dyn ModelProvider>, settings: AgentSettings) -> Self {
        Self { model, settings }
    }
}

#[async_trait]
impl Agent for QuestionAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Question
    }

    async fn analyze(
        &self,
        documents: &[Document],
        context: &RunContext,
    ) -> Result<Finding, AgentError> {
        let docs = usable_documents(self.kind(), documents)?;
        let prompt =
            prompt::questions_prompt(SYSTEM_PROMPT, &docs, context, self.settings.max_document_chars);

        let value = self.model.generate(&prompt, SchemaHint::Questions).await?;
        let document_chars = docs.iter().map(|d| d.extracted_text.len()).sum();
        let finding = response::parse_questions(value, document_chars)?;
        debug!("Question agent proposed {} question(s)", finding.questions.len());
        Ok(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionPriority;
    use crate::testing::StubModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_question_agent() {
        let model = Arc::new(StubModel::scores(json!({
            "questions": [
                {"priority": "risk", "question": "What happens if your largest customer churns?",
                 "validates": "Revenue concentration"}
            ],
            "confidence": 0.5
        })));
        let agent = QuestionAgent::new(model.clone(), AgentSettings::default());
        let docs = vec![Document::from_text("pitch.md", "Company X, $2M ARR")];
        let context = RunContext::from_documents(uuid::Uuid::nil(), &docs);

        let finding = agent.analyze(&docs, &context).await.unwrap();
        assert!(finding.category_scores.is_empty());
        assert_eq!(finding.questions[0].priority, QuestionPriority::Risk);
        assert_eq!(finding.confidence, 0.5);
        assert!(model.prompts()[0].user.contains("must_ask"));
    }
}
