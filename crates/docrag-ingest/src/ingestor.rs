//! Ingestion coordinator: turns files under the documents root into indexed chunks.

use crate::chunker::ChunkSplitter;
use crate::error::{IngestError, IngestResult};
use crate::repository::DocumentRepository;
use crate::topic::resolve_topic;
use crate::watcher::{should_ignore_path, WatchEvent};
use chrono::Utc;
use docrag_core::{
    ChunkMetadata, DocumentKind, DocumentRecord, IngestOutcome, SkipReason, TextExtractor,
    TextUnit, VectorIndex, GENERAL_TOPIC,
};
use glob::Pattern;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts from a full-tree scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub ingested: usize,
    pub duplicates: usize,
    pub unsupported: usize,
    pub empty: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Ingested(_) => self.ingested += 1,
            IngestOutcome::Skipped(SkipReason::Duplicate) => self.duplicates += 1,
            IngestOutcome::Skipped(SkipReason::UnsupportedType(_)) => self.unsupported += 1,
            IngestOutcome::Skipped(SkipReason::EmptyText) => self.empty += 1,
            IngestOutcome::Skipped(SkipReason::Failed(_)) => self.failed += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.duplicates + self.unsupported + self.empty + self.failed
    }

    pub fn total(&self) -> usize {
        self.ingested + self.skipped()
    }
}

/// Coordinates extraction, chunking and indexing for files under one root.
///
/// Cheap to share behind an `Arc`: the watcher queue consumer and request
/// handlers can call [`ingest_file`](Self::ingest_file) concurrently.
pub struct Ingestor {
    root: PathBuf,
    repository: Arc<DocumentRepository>,
    extractor: Arc<dyn TextExtractor>,
    index: Arc<dyn VectorIndex>,
    splitter: ChunkSplitter,
    ignore_patterns: Vec<Pattern>,
}

impl Ingestor {
    pub fn new(
        root: impl Into<PathBuf>,
        repository: Arc<DocumentRepository>,
        extractor: Arc<dyn TextExtractor>,
        index: Arc<dyn VectorIndex>,
        splitter: ChunkSplitter,
    ) -> Self {
        let root = absolute(&root.into());
        Self {
            root,
            repository,
            extractor,
            index,
            splitter,
            ignore_patterns: Vec::new(),
        }
    }

    /// File name patterns the full-tree scan leaves alone, as the watcher does.
    pub fn with_ignore_patterns(mut self, patterns: Vec<Pattern>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repository(&self) -> &Arc<DocumentRepository> {
        &self.repository
    }

    /// Ingest a single file.
    ///
    /// Never fails: every problem is reported as a [`SkipReason`] and leaves the
    /// ledger and catalogue untouched, so the file can be retried.
    pub fn ingest_file(&self, path: &Path) -> IngestOutcome {
        let path = absolute(path);

        if !self.repository.try_claim(&path) {
            debug!("Skipping {:?}: already ingested", path);
            return IngestOutcome::Skipped(SkipReason::Duplicate);
        }

        match self.process(&path) {
            Ok(record) => {
                info!(
                    "Ingested {} (topic: {}, {} bytes)",
                    record.file_name, record.topic, record.size_bytes
                );
                self.repository.commit(&path, record.clone());
                IngestOutcome::Ingested(record)
            }
            Err(reason) => {
                self.repository.release(&path);
                match &reason {
                    SkipReason::UnsupportedType(_) => info!("Skipping {:?}: {}", path, reason),
                    _ => warn!("Skipping {:?}: {}", path, reason),
                }
                IngestOutcome::Skipped(reason)
            }
        }
    }

    fn process(&self, path: &Path) -> Result<DocumentRecord, SkipReason> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            SkipReason::UnsupportedType(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })?;

        let units: Vec<String> = self
            .extractor
            .extract(path)
            .map_err(|e| SkipReason::Failed(e.to_string()))?
            .into_iter()
            .filter(|unit| !unit.trim().is_empty())
            .collect();
        if units.is_empty() {
            return Err(SkipReason::EmptyText);
        }

        let topic = resolve_topic(path, &self.root);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = ChunkMetadata::new(
            topic.clone(),
            file_name.clone(),
            path.to_string_lossy().into_owned(),
        );

        let units: Vec<TextUnit> = units
            .into_iter()
            .map(|text| TextUnit::new(text, metadata.clone()))
            .collect();
        let chunks = self.splitter.split(&units);
        if chunks.is_empty() {
            return Err(SkipReason::EmptyText);
        }
        debug!(
            "Split {} ({}) into {} chunks from {} text units",
            file_name,
            kind,
            chunks.len(),
            units.len()
        );

        // Searchable once this returns
        self.index
            .add(chunks)
            .map_err(|e| SkipReason::Failed(e.to_string()))?;

        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Ok(DocumentRecord {
            file_name,
            topic,
            source_path: path.to_path_buf(),
            size_bytes,
            ingested_at: Utc::now(),
        })
    }

    /// Every regular file under the root that is neither hidden nor ignored.
    pub fn discover_files(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            warn!("Documents root {:?} does not exist, nothing to scan", self.root);
            return Vec::new();
        }

        walkdir::WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|n| n.starts_with('.'))
                        .unwrap_or(false)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Cannot read entry under {:?}: {}", self.root, e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !should_ignore_path(entry.path(), &self.ignore_patterns))
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Ingest every file under the root.
    pub fn ingest_directory(&self) -> ScanSummary {
        let files = self.discover_files();
        self.ingest_paths(&files, |_, _| {})
    }

    /// Ingest the given files independently, reporting each outcome to `on_file`.
    pub fn ingest_paths<F>(&self, paths: &[PathBuf], mut on_file: F) -> ScanSummary
    where
        F: FnMut(&Path, &IngestOutcome),
    {
        let mut summary = ScanSummary::default();
        for path in paths {
            let outcome = self.ingest_file(path);
            summary.record(&outcome);
            on_file(path, &outcome);
        }

        info!(
            "Scan complete: {} ingested, {} skipped",
            summary.ingested,
            summary.skipped()
        );
        summary
    }

    /// Save uploaded bytes under `root/<topic>/<file_name>` and ingest the file.
    ///
    /// Uploads for the general topic land directly under the root.
    pub fn upload(
        &self,
        topic: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> IngestResult<IngestOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(IngestError::InvalidUpload("topic must not be empty".to_string()));
        }
        if !is_plain_name(topic) {
            return Err(IngestError::InvalidUpload(format!("invalid topic name: {}", topic)));
        }
        if !is_plain_name(file_name) {
            return Err(IngestError::InvalidUpload(format!("invalid file name: {}", file_name)));
        }
        if bytes.is_empty() {
            return Err(IngestError::InvalidUpload("file is empty".to_string()));
        }

        let dir = if topic == GENERAL_TOPIC {
            self.root.clone()
        } else {
            self.root.join(topic)
        };
        std::fs::create_dir_all(&dir)?;

        let destination = dir.join(file_name);
        std::fs::write(&destination, bytes)?;
        info!("Saved upload to {:?}", destination);

        Ok(self.ingest_file(&destination))
    }

    /// Consume watcher events until every sender is gone. Returns the number
    /// of files ingested.
    pub fn run_watch_queue(&self, events: Receiver<WatchEvent>) -> usize {
        let mut ingested = 0;
        for event in events {
            match event {
                WatchEvent::FileReady(path) => {
                    if self.ingest_file(&path).is_ingested() {
                        ingested += 1;
                    }
                }
            }
        }
        debug!("Watch queue closed after {} ingestions", ingested);
        ingested
    }
}

/// A single normal path component, so joining it cannot escape its parent.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkConfig;
    use crate::parsers::FileExtractor;
    use crate::watcher::{PathWatcher, WatcherConfig};
    use docrag_core::{Chunk, ScoredChunk};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct RecordingIndex {
        chunks: Mutex<Vec<Chunk>>,
        fail: AtomicBool,
    }

    impl VectorIndex for RecordingIndex {
        fn add(&self, chunks: Vec<Chunk>) -> docrag_core::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(docrag_core::Error::Index("disk full".to_string()));
            }
            self.chunks.lock().unwrap().extend(chunks);
            Ok(())
        }

        fn search(
            &self,
            _query: &str,
            _top_k: usize,
            _topic: Option<&str>,
        ) -> docrag_core::Result<Vec<ScoredChunk>> {
            Ok(Vec::new())
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract(&self, _path: &Path) -> docrag_core::Result<Vec<String>> {
            Err(docrag_core::Error::Extraction("corrupt file".to_string()))
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        index: Arc<RecordingIndex>,
        ingestor: Ingestor,
    }

    fn fixture_with(extractor: Arc<dyn TextExtractor>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(RecordingIndex::default());
        let splitter = ChunkSplitter::new(ChunkConfig {
            chunk_size: 5,
            chunk_overlap: 1,
            ..ChunkConfig::default()
        })
        .unwrap();
        let ingestor = Ingestor::new(
            dir.path(),
            Arc::new(DocumentRepository::new()),
            extractor,
            index.clone(),
            splitter,
        );
        Fixture {
            dir,
            index,
            ingestor,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(FileExtractor::new()))
    }

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_ingest_assigns_topic_to_record_and_chunks() {
        let f = fixture();
        let path = write(
            f.dir.path(),
            "tax-law/iva-guide.txt",
            "The standard IVA rate in Spain is twenty one percent",
        );

        let record = match f.ingestor.ingest_file(&path) {
            IngestOutcome::Ingested(record) => record,
            other => panic!("expected ingestion, got {:?}", other),
        };
        assert_eq!(record.file_name, "iva-guide.txt");
        assert_eq!(record.topic, "tax-law");

        let chunks = f.index.chunks.lock().unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.metadata.topic == "tax-law"));
        assert!(chunks.iter().all(|c| c.metadata.source_file == "iva-guide.txt"));
        assert_eq!(f.ingestor.repository().len(), 1);
    }

    #[test]
    fn test_file_under_root_is_general() {
        let f = fixture();
        let path = write(f.dir.path(), "notes.txt", "General notes about filing deadlines");

        let outcome = f.ingestor.ingest_file(&path);
        assert!(outcome.is_ingested());
        assert_eq!(f.ingestor.repository().topics(), vec!["general"]);
    }

    #[test]
    fn test_second_ingest_is_duplicate() {
        let f = fixture();
        let path = write(f.dir.path(), "tax-law/iva.txt", "IVA applies to most goods");

        assert!(f.ingestor.ingest_file(&path).is_ingested());
        let again = f.ingestor.ingest_file(&path);
        assert_eq!(again.skip_reason(), Some(&SkipReason::Duplicate));
        assert_eq!(f.ingestor.repository().len(), 1);
    }

    #[test]
    fn test_unsupported_and_empty_files_skipped() {
        let f = fixture();
        let sheet = write(f.dir.path(), "tax-law/rates.xlsx", "binary");
        let blank = write(f.dir.path(), "tax-law/blank.txt", "  \n ");
        let tiny = write(f.dir.path(), "tax-law/tiny.txt", "ok");

        assert_eq!(
            f.ingestor.ingest_file(&sheet).skip_reason(),
            Some(&SkipReason::UnsupportedType("xlsx".to_string()))
        );
        assert_eq!(
            f.ingestor.ingest_file(&blank).skip_reason(),
            Some(&SkipReason::EmptyText)
        );
        // Shorter than the minimum chunk length
        assert_eq!(
            f.ingestor.ingest_file(&tiny).skip_reason(),
            Some(&SkipReason::EmptyText)
        );
        assert!(f.ingestor.repository().is_empty());
        assert!(!f.ingestor.repository().contains(&absolute(&sheet)));
    }

    #[test]
    fn test_extraction_failure_is_skipped() {
        let f = fixture_with(Arc::new(FailingExtractor));
        let path = write(f.dir.path(), "tax-law/iva.pdf", "%PDF");

        let outcome = f.ingestor.ingest_file(&path);
        assert!(matches!(
            outcome.skip_reason(),
            Some(SkipReason::Failed(msg)) if msg.contains("corrupt file")
        ));
        assert!(f.ingestor.repository().is_empty());
    }

    #[test]
    fn test_index_failure_can_be_retried() {
        let f = fixture();
        let path = write(f.dir.path(), "tax-law/iva.txt", "IVA applies to most goods");

        f.index.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            f.ingestor.ingest_file(&path).skip_reason(),
            Some(SkipReason::Failed(_))
        ));
        assert!(f.ingestor.repository().is_empty());

        f.index.fail.store(false, Ordering::SeqCst);
        assert!(f.ingestor.ingest_file(&path).is_ingested());
    }

    #[test]
    fn test_concurrent_ingest_same_path() {
        let f = fixture();
        let path = write(f.dir.path(), "tax-law/iva.txt", "IVA applies to most goods");
        let ingestor = Arc::new(f.ingestor);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ingestor = Arc::clone(&ingestor);
                let barrier = Arc::clone(&barrier);
                let path = path.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    ingestor.ingest_file(&path)
                })
            })
            .collect();

        let outcomes: Vec<IngestOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(outcomes.iter().filter(|o| o.is_ingested()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| o.skip_reason() == Some(&SkipReason::Duplicate))
                .count(),
            1
        );
        assert_eq!(ingestor.repository().len(), 1);
    }

    #[test]
    fn test_ingest_directory_summary() {
        let f = fixture();
        write(f.dir.path(), "notes.txt", "General notes about filing deadlines");
        write(f.dir.path(), "tax-law/iva.txt", "IVA applies to most goods");
        write(f.dir.path(), "tax-law/eu/vat.txt", "VAT directive for the union");
        write(f.dir.path(), "tax-law/rates.xlsx", "binary");
        write(f.dir.path(), ".hidden/secret.txt", "should never be read");

        let summary = f.ingestor.ingest_directory();
        assert_eq!(summary.ingested, 3);
        assert_eq!(summary.unsupported, 1);
        assert_eq!(summary.total(), 4);
        assert_eq!(
            f.ingestor.repository().topics(),
            vec!["eu", "general", "tax-law"]
        );

        let again = f.ingestor.ingest_directory();
        assert_eq!(again.duplicates, 3);
        assert_eq!(again.ingested, 0);
    }

    #[test]
    fn test_scan_skips_ignored_files() {
        let f = fixture();
        let ingestor = f
            .ingestor
            .with_ignore_patterns(vec![Pattern::new("~$*").unwrap()]);
        write(f.dir.path(), "tax-law/iva.txt", "IVA applies to most goods");
        write(f.dir.path(), "tax-law/~$report.docx", "lock");

        let files = ingestor.discover_files();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("tax-law/iva.txt"));

        let summary = ingestor.ingest_directory();
        assert_eq!(summary.ingested, 1);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_upload_saves_and_ingests() {
        let f = fixture();

        let outcome = f
            .ingestor
            .upload("tax-law", "iva.txt", b"IVA applies to most goods")
            .unwrap();
        assert!(outcome.is_ingested());
        assert!(f.dir.path().join("tax-law/iva.txt").exists());

        let outcome = f
            .ingestor
            .upload("general", "notes.txt", b"General notes about deadlines")
            .unwrap();
        assert!(outcome.is_ingested());
        assert!(f.dir.path().join("notes.txt").exists());
        assert_eq!(f.ingestor.repository().topics(), vec!["general", "tax-law"]);
    }

    #[test]
    fn test_upload_rejects_bad_input() {
        let f = fixture();

        for (topic, name, bytes) in [
            ("tax-law", "iva.txt", &b""[..]),
            ("", "iva.txt", &b"text"[..]),
            ("../escape", "iva.txt", &b"text"[..]),
            ("tax-law", "../iva.txt", &b"text"[..]),
            ("tax-law", "", &b"text"[..]),
        ] {
            let result = f.ingestor.upload(topic, name, bytes);
            assert!(
                matches!(result, Err(IngestError::InvalidUpload(_))),
                "accepted upload {:?}/{:?}",
                topic,
                name
            );
        }
        assert!(f.ingestor.repository().is_empty());
    }

    #[test]
    fn test_run_watch_queue() {
        let f = fixture();
        let a = write(f.dir.path(), "tax-law/iva.txt", "IVA applies to most goods");
        let b = write(f.dir.path(), "recipes/paella.txt", "Paella needs bomba rice");

        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(WatchEvent::FileReady(a.clone())).unwrap();
        tx.send(WatchEvent::FileReady(b)).unwrap();
        tx.send(WatchEvent::FileReady(a)).unwrap();
        drop(tx);

        assert_eq!(f.ingestor.run_watch_queue(rx), 2);
        assert_eq!(f.ingestor.repository().len(), 2);
    }

    #[test]
    fn test_watched_new_directory_is_ingested() {
        let f = fixture();
        let ingestor = Arc::new(f.ingestor);

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = PathWatcher::new(WatcherConfig {
            root: f.dir.path().to_path_buf(),
            ignore_patterns: Vec::new(),
            debounce: Duration::from_millis(100),
        });
        watcher.start(tx).unwrap();

        let consumer = {
            let ingestor = Arc::clone(&ingestor);
            std::thread::spawn(move || ingestor.run_watch_queue(rx))
        };

        let topic_dir = f.dir.path().join("tax-law");
        std::fs::create_dir(&topic_dir).unwrap();
        std::thread::sleep(Duration::from_secs(2));
        std::fs::write(
            topic_dir.join("iva-guide.txt"),
            "The standard IVA rate in Spain is twenty one percent",
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(15);
        while ingestor.repository().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }

        let catalogue = ingestor.repository().catalogue();
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue[0].file_name, "iva-guide.txt");
        assert_eq!(catalogue[0].topic, "tax-law");
        assert!(f
            .index
            .chunks
            .lock()
            .unwrap()
            .iter()
            .all(|c| c.metadata.topic == "tax-law"));

        // Closing the watcher closes the queue
        watcher.stop();
        assert_eq!(consumer.join().unwrap(), 1);
    }

    #[test]
    fn test_is_plain_name() {
        assert!(is_plain_name("iva-guide.pdf"));
        assert!(!is_plain_name("a/b.pdf"));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("/etc/passwd"));
        assert!(!is_plain_name(""));
    }
}
