//! Tavily web search client.

use super::{SearchHit, SearchProvider};
use crate::config::SearchConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "Tavily";

/// Characters of each result body kept as the snippet.
const SNIPPET_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Search provider backed by the Tavily API.
pub struct TavilySearch {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    search_depth: String,
    max_results: usize,
}

impl TavilySearch {
    /// Build a client; the API key is read from the configured environment variable.
    pub fn from_config(config: &SearchConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ProviderError::Other(format!(
                "Search enabled but {} is not set",
                config.api_key_env
            ))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            search_depth: config.search_depth.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        debug!("Searching: {}", query);

        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: &self.search_depth,
            max_results: self.max_results,
            include_answer: false,
        };

        let response = self
            .http_client
            .post(format!("{}/search", self.api_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        service: SERVICE.to_string(),
                    }
                } else if e.is_connect() {
                    ProviderError::Connection {
                        service: SERVICE.to_string(),
                        url: self.api_url.clone(),
                    }
                } else {
                    ProviderError::Other(format!("Search request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                service: SERVICE.to_string(),
                status,
                body,
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| ProviderError::Decode {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })?;

        Ok(body.results.into_iter().map(SearchHit::from).collect())
    }
}

impl From<SearchResult> for SearchHit {
    fn from(result: SearchResult) -> Self {
        Self {
            title: result.title,
            snippet: result.content.chars().take(SNIPPET_CHARS).collect(),
            url: result.url,
        }
    }
}

/// Search provider used when web search is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        let config = SearchConfig {
            enabled: true,
            api_key_env: "PITCHLENS_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..SearchConfig::default()
        };
        assert!(TavilySearch::from_config(&config).is_err());
    }

    #[test]
    fn test_result_to_hit() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"results": [{"title": "Acme raises $5M", "url": "https://news.example/acme", "content": "Seed round led by..."}]}"#,
        )
        .unwrap();
        let hits: Vec<SearchHit> = body.results.into_iter().map(SearchHit::from).collect();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Acme raises $5M");
        assert_eq!(hits[0].snippet, "Seed round led by...");
    }

    #[test]
    fn test_disabled_search_returns_nothing() {
        let hits = tokio_test::block_on(DisabledSearch.search("anything")).unwrap();
        assert!(hits.is_empty());
    }
}
