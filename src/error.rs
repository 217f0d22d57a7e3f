//! Error types for the analysis engine.
//!
//! Agent failures are absorbed by the orchestrator and recorded on their
//! task; only run-level and store errors reach the caller.

use crate::models::{AgentFailure, AgentKind, FailureKind};
use thiserror::Error;
use uuid::Uuid;

/// Text extraction failed or produced nothing usable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("unsupported format for {filename}: {kind}")]
    Unsupported { filename: String, kind: String },

    #[error("failed to read {filename}: {message}")]
    Read { filename: String, message: String },

    #[error("no usable text in {0}")]
    NoText(String),

    #[error("no usable documents routed to the {0} agent")]
    NoDocuments(AgentKind),
}

/// An external model or search call failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("cannot connect to {service} at {url}")]
    Connection { service: String, url: String },

    #[error("{service} request timed out")]
    Timeout { service: String },

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} response could not be decoded: {message}")]
    Decode { service: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Why a single agent execution failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("model output did not match the expected schema: {0}")]
    Validation(String),
}

impl AgentError {
    /// Only provider failures are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Provider(_))
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AgentError::Extraction(_) => FailureKind::Extraction,
            AgentError::Provider(_) => FailureKind::Provider,
            AgentError::Validation(_) => FailureKind::Validation,
        }
    }
}

/// Run-level outcomes that prevent a score from being computed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("run {run_id} failed: all {} agent task(s) failed", failures.len())]
    RunFailed {
        run_id: Uuid,
        failures: Vec<AgentFailure>,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error("no agent registered for {0}")]
    AgentNotRegistered(AgentKind),

    #[error("no agents selected")]
    EmptySelection,
}

/// Analysis store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("analysis not found: {0}")]
    NotFound(String),

    #[error("invalid analysis id: {0:?}")]
    InvalidId(String),

    #[error("store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store is locked by another process: {0}")]
    Locked(String),
}

/// Errors surfaced by the caller-facing analysis service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no documents provided")]
    NoDocuments,

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_provider_errors_retry() {
        let provider = AgentError::from(ProviderError::Timeout {
            service: "ollama".to_string(),
        });
        let validation = AgentError::Validation("missing scores".to_string());
        let extraction = AgentError::from(ExtractionError::NoDocuments(AgentKind::DataRoom));

        assert!(provider.is_retryable());
        assert!(!validation.is_retryable());
        assert!(!extraction.is_retryable());
        assert_eq!(extraction.failure_kind(), FailureKind::Extraction);
    }

    #[test]
    fn test_error_messages() {
        let err = ExtractionError::NoDocuments(AgentKind::DataRoom);
        assert_eq!(err.to_string(), "no usable documents routed to the Data Room agent");

        let err = StoreError::InvalidId("../x".to_string());
        assert!(err.to_string().contains("../x"));
    }
}
