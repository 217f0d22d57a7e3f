//! Ollama chat client.

use super::{ModelProvider, Prompt, SchemaHint};
use crate::config::ModelConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "Ollama";

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Model provider backed by a local or remote Ollama server.
pub struct OllamaProvider {
    http_client: reqwest::Client,
    ollama_url: String,
    model_name: String,
    temperature: f32,
}

impl OllamaProvider {
    pub fn new(config: &ModelConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            ollama_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.name.clone(),
            temperature: config.temperature,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a Prompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn generate(&self, prompt: &Prompt, schema: SchemaHint) -> Result<Value, ProviderError> {
        let url = format!("{}/api/chat", self.ollama_url);
        debug!(
            "Sending {:?} prompt ({} chars) to {}",
            schema,
            prompt.user.len(),
            self.model_name
        );

        let response = self
            .http_client
            .post(&url)
            .json(&self.request_body(prompt))
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
                        url: self.ollama_url.clone(),
                    }
                } else {
                    ProviderError::Other(format!("Failed to send request: {}", e))
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

        let chat: ChatResponse = response.json().await.map_err(|e| ProviderError::Decode {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })?;

        Ok(serde_json::from_str(&chat.message.content)
            .unwrap_or(Value::String(chat.message.content)))
    }
}
