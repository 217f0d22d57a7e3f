//! Text extraction from uploaded documents.
//!
//! Binary formats (PDF, PPTX, XLSX) belong to an external adapter; the
//! built-in [`TextExtractor`] handles the text-based formats and reports
//! the rest as unsupported.

use crate::error::ExtractionError;
use crate::models::{Document, MimeKind};
use crate::scanner::ScannedFile;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Converts raw file bytes into normalized text.
///
/// Implementations must be idempotent and side-effect free.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        filename: &str,
        bytes: &[u8],
        mime_kind: MimeKind,
    ) -> Result<String, ExtractionError>;
}

/// Extractor for plain text, Markdown, CSV and JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(
        &self,
        filename: &str,
        bytes: &[u8],
        mime_kind: MimeKind,
    ) -> Result<String, ExtractionError> {
        match mime_kind {
            MimeKind::Text | MimeKind::Markdown | MimeKind::Csv => {
                Ok(normalize(&String::from_utf8_lossy(bytes)))
            }
            MimeKind::Json => {
                let value: serde_json::Value =
                    serde_json::from_slice(bytes).map_err(|e| ExtractionError::Read {
                        filename: filename.to_string(),
                        message: e.to_string(),
                    })?;
                serde_json::to_string_pretty(&value).map_err(|e| ExtractionError::Read {
                    filename: filename.to_string(),
                    message: e.to_string(),
                })
            }
            other => Err(ExtractionError::Unsupported {
                filename: filename.to_string(),
                kind: format!("{:?}", other).to_lowercase(),
            }),
        }
    }
}

/// Strip a BOM, unify line endings and trim trailing whitespace per line.
fn normalize(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Read and extract every scanned file concurrently.
///
/// Failures do not abort loading; they produce a document whose status
/// records the reason, so the run can report which inputs were unusable.
pub async fn load_documents(
    extractor: Arc<dyn Extractor>,
    files: &[ScannedFile],
) -> Vec<Document> {
    let jobs = files.iter().map(|file| {
        let extractor = Arc::clone(&extractor);
        async move {
            let mime_kind = MimeKind::from_filename(&file.filename);
            let bytes = match tokio::fs::read(&file.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Failed to read {}: {}", file.path.display(), e);
                    return Document::failed(&file.filename, e.to_string());
                }
            };

            match extractor.extract(&file.filename, &bytes, mime_kind).await {
                Ok(text) => {
                    debug!("Extracted {} chars from {}", text.len(), file.filename);
                    Document::from_text(&file.filename, text)
                }
                Err(e) => {
                    warn!("{}", e);
                    Document::failed(&file.filename, e.to_string())
                }
            }
        }
    });

    join_all(jobs).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionStatus;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_text_extraction_normalizes() {
        let text = tokio_test::block_on(TextExtractor.extract(
            "deck.md",
            b"\xEF\xBB\xBF# Acme  \r\nSeed round\r\n\r\n",
            MimeKind::Markdown,
        ))
        .unwrap();
        assert_eq!(text, "# Acme\nSeed round");
    }

    #[test]
    fn test_json_is_pretty_printed() {
        let text = tokio_test::block_on(TextExtractor.extract(
            "kpi.json",
            br#"{"arr":2000000}"#,
            MimeKind::Json,
        ))
        .unwrap();
        assert!(text.contains("\"arr\": 2000000"));
    }

    #[test]
    fn test_binary_formats_unsupported() {
        let err = tokio_test::block_on(TextExtractor.extract("deck.pdf", b"%PDF", MimeKind::Pdf))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_load_documents_keeps_failures() {
        let dir = TempDir::new().unwrap();
        let deck = dir.path().join("pitch_deck.md");
        let pdf = dir.path().join("financials.pdf");
        fs::write(&deck, "Company: Acme\n$2M ARR").unwrap();
        fs::write(&pdf, "%PDF-1.7").unwrap();

        let files = vec![
            ScannedFile {
                path: deck,
                filename: "pitch_deck.md".to_string(),
                size: 21,
            },
            ScannedFile {
                path: pdf,
                filename: "financials.pdf".to_string(),
                size: 8,
            },
        ];

        let docs = load_documents(Arc::new(TextExtractor), &files).await;
        assert_eq!(docs.len(), 2);
        assert!(docs[0].is_usable());
        assert!(matches!(docs[1].extraction_status, ExtractionStatus::Failed(_)));
    }
}
