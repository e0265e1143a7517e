//! In-process ledger of ingested paths and the document catalogue.

use docrag_core::DocumentRecord;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerState {
    /// Claimed by a running ingestion, not yet committed.
    InFlight,
    Ingested,
}

/// Shared record of which files have been ingested during this process.
///
/// A path is claimed with [`try_claim`](Self::try_claim) before any work is
/// done for it, then either committed with its catalogue record or released.
/// Only one caller can hold a claim for a path, so concurrent ingestion of the
/// same file proceeds exactly once.
#[derive(Debug, Default)]
pub struct DocumentRepository {
    ledger: Mutex<HashMap<PathBuf, LedgerState>>,
    catalogue: RwLock<Vec<DocumentRecord>>,
}

impl DocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim a path. Returns `false` if it is already ingested or
    /// being ingested by another caller.
    pub fn try_claim(&self, path: &Path) -> bool {
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        if ledger.contains_key(path) {
            return false;
        }
        ledger.insert(path.to_path_buf(), LedgerState::InFlight);
        true
    }

    /// Drop a claim without recording anything, so the path can be retried.
    pub fn release(&self, path: &Path) {
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        if ledger.get(path) == Some(&LedgerState::InFlight) {
            ledger.remove(path);
        }
    }

    /// Mark a claimed path as ingested and append its record to the catalogue.
    pub fn commit(&self, path: &Path, record: DocumentRecord) {
        // Catalogue first: once a path reads as ingested its record is visible
        self.catalogue
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf(), LedgerState::Ingested);
    }

    /// Whether the path has been fully ingested.
    pub fn contains(&self, path: &Path) -> bool {
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            == Some(&LedgerState::Ingested)
    }

    /// Snapshot of the catalogue in ingestion order.
    pub fn catalogue(&self) -> Vec<DocumentRecord> {
        self.catalogue
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Distinct topics in the catalogue, sorted.
    pub fn topics(&self) -> Vec<String> {
        self.catalogue
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|r| r.topic.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.catalogue.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn record(path: &str, topic: &str) -> DocumentRecord {
        let path = PathBuf::from(path);
        DocumentRecord {
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            topic: topic.to_string(),
            source_path: path,
            size_bytes: 10,
            ingested_at: Utc::now(),
        }
    }

    #[test]
    fn test_claim_commit_release() {
        let repo = DocumentRepository::new();
        let path = Path::new("/docs/tax-law/iva.pdf");

        assert!(repo.try_claim(path));
        assert!(!repo.try_claim(path));
        assert!(!repo.contains(path));

        repo.release(path);
        assert!(repo.try_claim(path));

        repo.commit(path, record("/docs/tax-law/iva.pdf", "tax-law"));
        assert!(repo.contains(path));
        assert!(!repo.try_claim(path));

        // Releasing a committed path has no effect
        repo.release(path);
        assert!(repo.contains(path));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_catalogue_and_topics() {
        let repo = DocumentRepository::new();
        for (path, topic) in [
            ("/docs/tax-law/iva.pdf", "tax-law"),
            ("/docs/notes.txt", "general"),
            ("/docs/tax-law/irpf.pdf", "tax-law"),
        ] {
            assert!(repo.try_claim(Path::new(path)));
            repo.commit(Path::new(path), record(path, topic));
        }

        let names: Vec<String> = repo.catalogue().into_iter().map(|r| r.file_name).collect();
        assert_eq!(names, vec!["iva.pdf", "notes.txt", "irpf.pdf"]);
        assert_eq!(repo.topics(), vec!["general", "tax-law"]);
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let repo = Arc::new(DocumentRepository::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                std::thread::spawn(move || repo.try_claim(Path::new("/docs/a.txt")))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
