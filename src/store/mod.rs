//! Durable storage for completed analyses.
//!
//! Layout: one `<analysis_id>.json` file per record plus `index.json`, a
//! JSON object mapping ids to summary metadata. Every file is written to a
//! temp file in the same directory and renamed into place.
//!
//! Index mutations hold the in-process mutex and an `index.lock` file, then
//! re-read `index.json`, apply one change and write it back, so several
//! processes can share a store directory. The index is updated after the
//! record write on save and before the record removal on delete, so it
//! never points at a record that was not fully written.

use crate::error::StoreError;
use crate::models::{AnalysisRecord, IndexEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

const INDEX_FILE: &str = "index.json";
const LOCK_FILE: &str = "index.lock";
const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);
/// A lock file older than this was left behind by a crashed process.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(120);
const MAX_SLUG_LEN: usize = 40;

type Index = BTreeMap<String, IndexEntry>;

/// Filter for [`AnalysisStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
    pub min_score: Option<u8>,
    pub limit: Option<usize>,
}

/// Storage statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub count: usize,
    pub companies: usize,
    /// Bytes used by record files.
    pub total_size: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Outcome of [`AnalysisStore::reindex`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexReport {
    /// Records on disk that had no index entry.
    pub adopted: usize,
    /// Index entries whose record was missing.
    pub dropped: usize,
    /// Files that could not be read as records.
    pub skipped: usize,
    pub total: usize,
}

/// File-backed analysis store.
pub struct AnalysisStore {
    dir: PathBuf,
    index: Mutex<Index>,
}

impl AnalysisStore {
    /// Open (or create) a store in `dir`.
    ///
    /// Index entries whose record file is gone are pruned. An unreadable
    /// index is rebuilt from the record files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let store = Self {
            dir,
            index: Mutex::new(Index::new()),
        };

        {
            let mut cached = store.lock();
            let _guard = store.acquire_file_lock()?;
            let (mut index, rebuilt) = store.load_index()?;

            let before = index.len();
            index.retain(|id, _| store.record_path(id).exists());
            if index.len() != before {
                warn!(
                    "Pruned {} index entr(ies) with missing records",
                    before - index.len()
                );
            }
            if rebuilt || index.len() != before {
                store.write_index(&index)?;
            }
            *cached = index;
        }

        debug!("Opened analysis store at {}", store.dir.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Persist a record and register it in the index.
    ///
    /// Saving an existing id replaces it; concurrent saves and deletes of
    /// the same id are ordered by the index lock and the last one wins.
    pub fn save(&self, record: &AnalysisRecord) -> Result<String, StoreError> {
        validate_id(&record.analysis_id)?;
        let path = self.record_path(&record.analysis_id);
        let bytes = serde_json::to_vec_pretty(record).map_err(serde_error(&path))?;

        let mut cached = self.lock();
        let _guard = self.acquire_file_lock()?;
        self.write_atomic(&path, &bytes)?;

        let (mut index, _) = self.load_index()?;
        index.insert(record.analysis_id.clone(), IndexEntry::from(record));
        self.write_index(&index)?;
        *cached = index;

        info!("Saved analysis {}", record.analysis_id);
        Ok(record.analysis_id.clone())
    }

    /// Load a record by id. Orphaned records are still readable.
    pub fn get(&self, analysis_id: &str) -> Result<AnalysisRecord, StoreError> {
        validate_id(analysis_id)?;
        let path = self.record_path(analysis_id);

        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(analysis_id.to_string()))
            }
            Err(e) => return Err(io_error(&path)(e)),
        };

        serde_json::from_slice(&content).map_err(serde_error(&path))
    }

    /// Remove a record and its index entry.
    pub fn delete(&self, analysis_id: &str) -> Result<(), StoreError> {
        validate_id(analysis_id)?;
        let path = self.record_path(analysis_id);

        let mut cached = self.lock();
        let _guard = self.acquire_file_lock()?;
        let (mut index, rebuilt) = self.load_index()?;

        let indexed = index.remove(analysis_id).is_some();
        if indexed || rebuilt {
            self.write_index(&index)?;
        }
        *cached = index;

        if !indexed && !path.exists() {
            return Err(StoreError::NotFound(analysis_id.to_string()));
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&path)(e)),
        }

        info!("Deleted analysis {}", analysis_id);
        Ok(())
    }

    /// Index entries matching `filter`, newest first.
    ///
    /// Works on a snapshot of the index as last written by any process;
    /// entries whose record file has disappeared are skipped as the
    /// sequence is consumed.
    pub fn list(&self, filter: &ListFilter) -> impl Iterator<Item = IndexEntry> {
        let mut entries: Vec<IndexEntry> = self.snapshot().into_values().collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.analysis_id.cmp(&a.analysis_id))
        });

        let company = filter.company.as_ref().map(|c| c.to_lowercase());
        let min_score = filter.min_score;
        let dir = self.dir.clone();

        entries
            .into_iter()
            .filter(move |e| {
                company
                    .as_ref()
                    .map_or(true, |c| e.company_name.to_lowercase().contains(c))
            })
            .filter(move |e| min_score.map_or(true, |min| e.overall_score >= min))
            .filter(move |e| dir.join(record_file(&e.analysis_id)).exists())
            .take(filter.limit.unwrap_or(usize::MAX))
    }

    /// Most recent record whose company name matches exactly (ignoring case).
    pub fn latest_for(&self, company: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        let filter = ListFilter {
            company: Some(company.to_string()),
            ..ListFilter::default()
        };
        let wanted = company.to_lowercase();

        match self
            .list(&filter)
            .find(|e| e.company_name.to_lowercase() == wanted)
        {
            Some(entry) => self.get(&entry.analysis_id).map(Some),
            None => Ok(None),
        }
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let entries: Vec<IndexEntry> = self.list(&ListFilter::default()).collect();

        let mut total_size = 0;
        for entry in &entries {
            let path = self.record_path(&entry.analysis_id);
            match std::fs::metadata(&path) {
                Ok(meta) => total_size += meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path)(e)),
            }
        }

        let mut companies: Vec<String> =
            entries.iter().map(|e| e.company_name.to_lowercase()).collect();
        companies.sort();
        companies.dedup();

        Ok(StoreStats {
            count: entries.len(),
            companies: companies.len(),
            total_size,
            oldest: entries.iter().map(|e| e.created_at).min(),
            newest: entries.iter().map(|e| e.created_at).max(),
            path: self.dir.clone(),
        })
    }

    /// Rebuild the index from the record files on disk.
    pub fn reindex(&self) -> Result<ReindexReport, StoreError> {
        let mut cached = self.lock();
        let _guard = self.acquire_file_lock()?;

        let previous = match self.read_index() {
            Ok(Some(index)) => index,
            _ => cached.clone(),
        };
        let (rebuilt, skipped) = self.scan_records()?;

        let report = ReindexReport {
            adopted: rebuilt.keys().filter(|id| !previous.contains_key(*id)).count(),
            dropped: previous.keys().filter(|id| !rebuilt.contains_key(*id)).count(),
            skipped,
            total: rebuilt.len(),
        };

        self.write_index(&rebuilt)?;
        *cached = rebuilt;

        info!(
            "Reindexed {} record(s): {} adopted, {} dropped",
            report.total, report.adopted, report.dropped
        );
        Ok(report)
    }

    /// Index entries for every readable record file, plus the number of
    /// files that could not be read.
    fn scan_records(&self) -> Result<(Index, usize), StoreError> {
        let mut index = Index::new();
        let mut skipped = 0;

        let entries = std::fs::read_dir(&self.dir).map_err(io_error(&self.dir))?;
        for entry in entries {
            let entry = entry.map_err(io_error(&self.dir))?;
            let path = entry.path();
            let is_record = path.extension().map_or(false, |ext| ext == "json")
                && path.file_name().map_or(false, |name| name != INDEX_FILE);
            if !is_record {
                continue;
            }

            let record = std::fs::read(&path)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<AnalysisRecord>(&bytes).ok());
            match record {
                Some(record) if self.record_path(&record.analysis_id) == path => {
                    index.insert(record.analysis_id.clone(), IndexEntry::from(&record));
                }
                _ => {
                    warn!("Skipping unreadable record file {}", path.display());
                    skipped += 1;
                }
            }
        }

        Ok((index, skipped))
    }

    /// `index.json` as on disk. `None` when it exists but cannot be parsed.
    fn read_index(&self) -> Result<Option<Index>, StoreError> {
        let path = self.index_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Some(Index::new())),
            Err(e) => return Err(io_error(&path)(e)),
        };

        match serde_json::from_str::<Index>(&content) {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                warn!("Index {} is unreadable ({})", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Current index, rebuilt from the record files when unreadable. The
    /// flag is set when it was rebuilt and still needs writing.
    fn load_index(&self) -> Result<(Index, bool), StoreError> {
        match self.read_index()? {
            Some(index) => Ok((index, false)),
            None => {
                warn!("Rebuilding index from record files");
                let (index, _) = self.scan_records()?;
                Ok((index, true))
            }
        }
    }

    /// Refresh the cached index from disk, keeping the cache if that fails.
    fn snapshot(&self) -> Index {
        let mut cached = self.lock();
        match self.read_index() {
            Ok(Some(index)) => *cached = index,
            Ok(None) => {}
            Err(e) => warn!("Using cached index: {}", e),
        }
        cached.clone()
    }

    /// Take `index.lock`, waiting for other processes and clearing stale locks.
    fn acquire_file_lock(&self) -> Result<IndexLock, StoreError> {
        let path = self.dir.join(LOCK_FILE);
        let started = Instant::now();

        loop {
            match OpenOptions::new().create_new(true).write(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(IndexLock { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if lock_is_stale(&path) {
                        warn!("Removing stale lock {}", path.display());
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                    if started.elapsed() >= LOCK_WAIT_TIMEOUT {
                        return Err(StoreError::Locked(path.display().to_string()));
                    }
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(io_error(&path)(e)),
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn record_path(&self, analysis_id: &str) -> PathBuf {
        self.dir.join(record_file(analysis_id))
    }

    fn write_index(&self, index: &Index) -> Result<(), StoreError> {
        let path = self.index_path();
        let bytes = serde_json::to_vec_pretty(index).map_err(serde_error(&path))?;
        self.write_atomic(&path, &bytes)
    }

    /// Write through a temp file in the store directory, then rename.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_error(&self.dir))?;
        tmp.write_all(bytes).map_err(io_error(path))?;
        tmp.as_file().sync_all().map_err(io_error(path))?;
        tmp.persist(path).map_err(|e| io_error(path)(e.error))?;
        Ok(())
    }
}

/// Held while the index is being changed; removes the lock file on drop.
struct IndexLock {
    path: PathBuf,
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn lock_is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map_or(false, |age| age > LOCK_STALE_AFTER)
}

fn record_file(analysis_id: &str) -> String {
    format!("{}.json", analysis_id)
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn serde_error(path: &Path) -> impl Fn(serde_json::Error) -> StoreError + '_ {
    move |source| StoreError::Serialization {
        path: path.display().to_string(),
        source,
    }
}

/// Ids are file stems: ASCII letters, digits, `_` and `-` only.
fn validate_id(analysis_id: &str) -> Result<(), StoreError> {
    let valid = !analysis_id.is_empty()
        && analysis_id != "index"
        && analysis_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(analysis_id.to_string()))
    }
}

/// Lowercase, underscore-separated slug of a company name.
pub fn slugify(company_name: &str) -> String {
    let mut slug = String::new();
    for c in company_name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }

    let mut slug: String = slug.trim_end_matches('_').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        "company".to_string()
    } else {
        slug
    }
}

/// New analysis id: `<slug>_<YYYYmmdd_HHMMSS>_<8 hex>`.
pub fn generate_id(company_name: &str, created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        slugify(company_name),
        created_at.format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}
