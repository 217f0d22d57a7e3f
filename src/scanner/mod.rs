//! Document discovery.
//!
//! Expands the paths given on the command line into the list of document
//! files to hand to extraction. Directories are walked recursively.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for document scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions considered documents (without dot).
    pub extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Maximum number of documents collected.
    pub max_files: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: [
                "pdf", "pptx", "ppt", "key", "xlsx", "xls", "csv", "json", "md", "markdown",
                "txt", "vtt", "srt",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_file_size: 25 * 1024 * 1024,
            max_files: 50,
        }
    }
}

/// A document file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Full path on disk.
    pub path: PathBuf,
    /// Name shown in prompts and reports.
    pub filename: String,
    /// File size in bytes.
    pub size: u64,
}

/// Walks input paths for document files.
pub struct DocumentScanner {
    config: ScanConfig,
}

impl DocumentScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Collect document files from files and directories, sorted by path.
    ///
    /// Explicitly named files are taken regardless of extension; extraction
    /// decides whether they are usable.
    pub fn scan(&self, inputs: &[PathBuf]) -> Result<Vec<ScannedFile>> {
        let mut seen = BTreeSet::new();

        for input in inputs {
            if input.is_file() {
                seen.insert(input.clone());
                continue;
            }

            for entry in WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            {
                let entry =
                    entry.with_context(|| format!("Failed to walk {}", input.display()))?;
                if entry.file_type().is_file() && self.matches(entry.path()) {
                    seen.insert(entry.into_path());
                }
            }
        }

        let mut files = Vec::new();
        for path in seen {
            if files.len() >= self.config.max_files {
                debug!("Document limit of {} reached", self.config.max_files);
                break;
            }

            let size = std::fs::metadata(&path)
                .with_context(|| format!("Failed to stat {}", path.display()))?
                .len();
            if size > self.config.max_file_size {
                debug!("Skipping {} ({} bytes)", path.display(), size);
                continue;
            }

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            files.push(ScannedFile {
                path,
                filename,
                size,
            });
        }

        Ok(files)
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.config.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deck.md"), "Acme").unwrap();
        fs::write(dir.path().join("metrics.CSV"), "a,b").unwrap();
        fs::write(dir.path().join("binary.exe"), "x").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("calls")).unwrap();
        fs::write(dir.path().join("calls").join("founder_call.txt"), "hi").unwrap();

        let scanner = DocumentScanner::new(ScanConfig::default());
        let files = scanner.scan(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"deck.md"));
        assert!(names.contains(&"metrics.CSV"));
        assert!(names.contains(&"founder_call.txt"));
    }

    #[test]
    fn test_explicit_file_and_dedup() {
        let dir = TempDir::new().unwrap();
        let deck = dir.path().join("deck.md");
        fs::write(&deck, "Acme").unwrap();

        let scanner = DocumentScanner::new(ScanConfig::default());
        let files = scanner
            .scan(&[deck.clone(), dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, deck);
        assert_eq!(files[0].size, 4);
    }

    #[test]
    fn test_max_files() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("doc{}.txt", i)), "x").unwrap();
        }

        let config = ScanConfig {
            max_files: 2,
            ..ScanConfig::default()
        };
        let files = DocumentScanner::new(config)
            .scan(&[dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(files.len(), 2);
    }
}
