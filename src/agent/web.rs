//! Web intelligence agent.
//!
//! Searches the web for the company, its competitors and each extracted
//! claim, then asks the model to score the market position against both
//! the documents and the search results.

use super::{score_with_model, usable_documents, Agent, AgentSettings, RunContext};
use crate::company::CompanyProfile;
use crate::error::AgentError;
use crate::models::{AgentKind, Document, Finding};
use crate::provider::{ModelProvider, SearchHit, SearchProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a web intelligence analyst validating a startup against \
public information. Compare funding news, competitor landscape, customer sentiment and \
team background with what the company claims. Call out claims the search results \
contradict or cannot confirm. Answer in JSON only.";

/// Build the ordered, deduplicated query plan for a company.
///
/// The same profile and claims always produce the same list.
pub fn search_queries(
    profile: &CompanyProfile,
    claims: &[String],
    max_claim_queries: usize,
) -> Vec<String> {
    let Some(ref name) = profile.name else {
        return Vec::new();
    };

    let mut queries = vec![
        format!("\"{}\" funding round investors", name),
        format!("\"{}\" competitors alternatives", name),
        format!("\"{}\" customer reviews testimonials", name),
        format!("\"{}\" team founders leadership", name),
    ];
    queries.extend(
        claims
            .iter()
            .take(max_claim_queries)
            .map(|claim| format!("\"{}\" {}", name, claim)),
    );
    if let Some(ref industry) = profile.industry {
        queries.push(format!("{} market size growth", industry));
    }

    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.to_lowercase()));
    queries
}

fn render_results(results: &[(String, Vec<SearchHit>)]) -> String {
    let mut out = String::from("=== WEB SEARCH RESULTS ===\n");

    for (query, hits) in results {
        out.push_str(&format!("\nQuery: {}\n", query));
        if hits.is_empty() {
            out.push_str("  (no results)\n");
        }
        for (i, hit) in hits.iter().enumerate() {
            out.push_str(&format!("  {}. {} ({})\n     {}\n", i + 1, hit.title, hit.url, hit.snippet));
        }
    }

    out.push_str("=== END OF WEB SEARCH RESULTS ===\n");
    out
}

/// Scores market, moat, traction and team using web search.
pub struct WebIntelligenceAgent {
    model: Arc<dyn ModelProvider>,
    search: Arc<dyn SearchProvider>,
    settings: AgentSettings,
    max_claim_queries: usize,
}

impl WebIntelligenceAgent {
    pub fn new(
        model: Arc<dyn ModelProvider>,
        search: Arc<dyn SearchProvider>,
        settings: AgentSettings,
        max_claim_queries: usize,
    ) -> Self {
        Self {
            model,
            search,
            settings,
            max_claim_queries,
        }
    }
}

#[async_trait]
impl Agent for WebIntelligenceAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::WebIntelligence
    }

    async fn analyze(
        &self,
        documents: &[Document],
        context: &RunContext,
    ) -> Result<Finding, AgentError> {
        let docs = usable_documents(self.kind(), documents)?;
        let queries = search_queries(&context.profile, &context.claims, self.max_claim_queries);
        info!("Web intelligence: {} search queries", queries.len());

        // Sequential so the provider sees queries in plan order.
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let hits = self.search.search(&query).await?;
            debug!("{} hit(s) for {}", hits.len(), query);
            results.push((query, hits));
        }

        let web_section = if results.iter().all(|(_, hits)| hits.is_empty()) {
            None
        } else {
            Some(render_results(&results))
        };

        score_with_model(
            self.model.as_ref(),
            self.kind(),
            SYSTEM_PROMPT,
            &docs,
            context,
            self.settings,
            web_section.as_deref(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::models::Category;
    use crate::testing::{StubModel, StubSearch};
    use serde_json::json;

    fn profile(name: &str, industry: Option<&str>) -> CompanyProfile {
        CompanyProfile {
            name: Some(name.to_string()),
            industry: industry.map(String::from),
            stage: None,
        }
    }

    #[test]
    fn test_query_plan() {
        let claims = vec![
            "$2M ARR".to_string(),
            "40% MoM growth".to_string(),
            "12,000 users".to_string(),
        ];
        let queries = search_queries(&profile("Acme", Some("saas")), &claims, 2);

        assert_eq!(
            queries,
            vec![
                "\"Acme\" funding round investors",
                "\"Acme\" competitors alternatives",
                "\"Acme\" customer reviews testimonials",
                "\"Acme\" team founders leadership",
                "\"Acme\" $2M ARR",
                "\"Acme\" 40% MoM growth",
                "saas market size growth",
            ]
        );
    }

    #[test]
    fn test_query_plan_dedup_and_unknown_name() {
        let claims = vec!["$2M ARR".to_string(), "$2m arr".to_string()];
        let queries = search_queries(&profile("Acme", None), &claims, 5);
        assert_eq!(queries.len(), 5);

        assert!(search_queries(&CompanyProfile::default(), &claims, 5).is_empty());
    }

    #[tokio::test]
    async fn test_same_documents_same_queries() {
        let docs = vec![Document::from_text(
            "pitch.md",
            "Company X, $2M ARR, 40% MoM growth",
        )];
        let model = Arc::new(StubModel::scores(json!({"scores": {"market": 60, "moat": 30}})));

        let mut issued = Vec::new();
        for _ in 0..2 {
            let search = Arc::new(StubSearch::default());
            let agent =
                WebIntelligenceAgent::new(model.clone(), search.clone(), AgentSettings::default(), 3);
            let context = RunContext::from_documents(uuid::Uuid::new_v4(), &docs);
            let finding = agent.analyze(&docs, &context).await.unwrap();
            assert_eq!(finding.category_scores[&Category::Moat], 30.0);
            issued.push(search.queries());
        }

        assert_eq!(issued[0], issued[1]);
        assert_eq!(issued[0][0], "\"Company X\" funding round investors");
        assert_eq!(issued[0].len(), 6);

        let prompt = &model.prompts()[0];
        assert!(prompt.user.contains("=== WEB SEARCH RESULTS ==="));
    }

    #[tokio::test]
    async fn test_search_failure_is_provider_error() {
        let docs = vec![Document::from_text("pitch.md", "Company: Acme\nRobots")];
        let model = Arc::new(StubModel::scores(json!({"scores": {"market": 60}})));
        let search = Arc::new(StubSearch::failing(ProviderError::Timeout {
            service: "Tavily".to_string(),
        }));
        let agent = WebIntelligenceAgent::new(model.clone(), search, AgentSettings::default(), 3);
        let context = RunContext::from_documents(uuid::Uuid::nil(), &docs);

        let err = agent.analyze(&docs, &context).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(model.prompts().is_empty());
    }
}
