//! In-memory collaborator implementations wired by the `serve` command and
//! reused by the integration specs. Production deployments replace these with
//! database, mail, and object-storage adapters behind the same traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::workflows::disputes::{
    CaseId, ComplaintCase, ComplaintRepository, ContestRepository, DisputeNotification,
    DocumentId, DocumentMetadata, DocumentStore, DocumentStoreError, NotificationPublisher,
    NotifyError, ResultContestCase, StorageError,
};

#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<AtomicBool>,
    pub metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub struct InMemoryComplaintRepository {
    records: Arc<Mutex<HashMap<CaseId, ComplaintCase>>>,
}

impl ComplaintRepository for InMemoryComplaintRepository {
    fn insert(&self, case: ComplaintCase) -> Result<ComplaintCase, StorageError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&case.id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<ComplaintCase>, StorageError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn save(
        &self,
        mut case: ComplaintCase,
        expected_version: u64,
    ) -> Result<ComplaintCase, StorageError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&case.id).ok_or(StorageError::NotFound)?;
        if stored.version != expected_version {
            return Err(StorageError::VersionConflict);
        }
        case.version = expected_version + 1;
        guard.insert(case.id.clone(), case.clone());
        Ok(case)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryContestRepository {
    records: Arc<Mutex<HashMap<CaseId, ResultContestCase>>>,
}

impl ContestRepository for InMemoryContestRepository {
    fn insert(&self, case: ResultContestCase) -> Result<ResultContestCase, StorageError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&case.id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<ResultContestCase>, StorageError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn save(
        &self,
        mut case: ResultContestCase,
        expected_version: u64,
    ) -> Result<ResultContestCase, StorageError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&case.id).ok_or(StorageError::NotFound)?;
        if stored.version != expected_version {
            return Err(StorageError::VersionConflict);
        }
        case.version = expected_version + 1;
        guard.insert(case.id.clone(), case.clone());
        Ok(case)
    }
}

/// Publishes notifications to the log; the real deployment hangs the mail
/// adapter here.
#[derive(Default, Clone)]
pub struct LoggingNotificationPublisher;

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notification: DisputeNotification) -> Result<(), NotifyError> {
        info!(
            case = %notification.case_id.0,
            kind = notification.kind.label(),
            "dispute notification"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<DocumentId, Vec<u8>>>,
    sequence: AtomicU64,
}

impl DocumentStore for InMemoryDocumentStore {
    fn store(
        &self,
        case_id: &CaseId,
        _metadata: &DocumentMetadata,
        bytes: Vec<u8>,
    ) -> Result<DocumentId, DocumentStoreError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = DocumentId(format!("{}-doc-{sequence:04}", case_id.0));
        self.documents
            .lock()
            .expect("document mutex poisoned")
            .insert(id.clone(), bytes);
        Ok(id)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, DocumentStoreError> {
        self.documents
            .lock()
            .expect("document mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(DocumentStoreError::NotFound)
    }
}
