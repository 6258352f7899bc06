use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::contracts::{
    Notification, NotificationCategory, NotificationSink, NotifyError, StoreError,
};
use super::super::identity::Actor;
use super::domain::{DocumentId, DocumentKind, DocumentRecord, VerificationStatus};
use super::repository::DocumentStore;

/// Error raised by the document verification service.
#[derive(Debug, thiserror::Error)]
pub enum DocumentReviewError {
    #[error("document not found")]
    DocumentNotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("review status must be verified or rejected")]
    InvalidReviewTarget,
    #[error("rejecting a document requires a comment")]
    MissingRejectionComment,
    #[error(transparent)]
    Store(StoreError),
}

/// Upload metadata registered once the binary has landed in external storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    pub kind: DocumentKind,
    pub storage_key: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
}

/// Tracks per-document review state. Deliberately decoupled from the
/// application lifecycle: verifying or rejecting a document never moves the
/// owning application's status.
pub struct DocumentVerificationService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

impl<S, N> DocumentVerificationService<S, N>
where
    S: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Register an upload. Documents always enter review as `pending`.
    pub fn register(
        &self,
        actor: &Actor,
        request: UploadRequest,
    ) -> Result<DocumentRecord, DocumentReviewError> {
        let now = Utc::now();
        let record = DocumentRecord {
            id: next_document_id(),
            owner: actor.id.clone(),
            name: request.name,
            kind: request.kind,
            storage_key: request.storage_key,
            mime_type: request.mime_type,
            size_bytes: request.size_bytes,
            status: VerificationStatus::Pending,
            verification_comments: None,
            uploaded_at: now,
            updated_at: now,
        };

        self.store.insert(record).map_err(DocumentReviewError::Store)
    }

    /// Reviewer decision on a document. Re-review of an already-decided
    /// document is allowed; `pending` is never a target. Rejection requires a
    /// reason, verification clears any previous one. The owner is notified
    /// either way.
    pub fn review(
        &self,
        actor: &Actor,
        id: &DocumentId,
        status: VerificationStatus,
        comments: Option<String>,
    ) -> Result<DocumentRecord, DocumentReviewError> {
        if !actor.role.is_privileged() {
            return Err(DocumentReviewError::Forbidden(
                "students may not review documents",
            ));
        }
        if !status.is_review_outcome() {
            return Err(DocumentReviewError::InvalidReviewTarget);
        }

        let comments = match status {
            VerificationStatus::Rejected => {
                let reason = comments
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .ok_or(DocumentReviewError::MissingRejectionComment)?;
                Some(reason)
            }
            _ => None,
        };

        let updated = self
            .store
            .set_review(id, status, comments)
            .map_err(|err| match err {
                StoreError::NotFound => DocumentReviewError::DocumentNotFound,
                other => DocumentReviewError::Store(other),
            })?;

        let title = match status {
            VerificationStatus::Verified => "Document Verified",
            _ => "Document Rejected",
        };
        let mut message = format!("Your document \"{}\" has been {status}.", updated.name);
        if let Some(reason) = updated.verification_comments.as_deref() {
            message.push_str(&format!(" Comment: {reason}"));
        }

        self.dispatch(Notification {
            recipient: updated.owner.clone(),
            title: title.to_string(),
            message,
            category: NotificationCategory::Alert,
            related_link: None,
            also_email: false,
        });

        Ok(updated)
    }

    /// Fetch one document: its owner or any reviewer-grade role.
    pub fn fetch(
        &self,
        actor: &Actor,
        id: &DocumentId,
    ) -> Result<DocumentRecord, DocumentReviewError> {
        let record = self
            .store
            .fetch(id)
            .map_err(DocumentReviewError::Store)?
            .ok_or(DocumentReviewError::DocumentNotFound)?;

        if record.owner != actor.id && !actor.role.is_privileged() {
            return Err(DocumentReviewError::Forbidden(
                "you do not have permission to view this document",
            ));
        }

        Ok(record)
    }

    /// The acting user's own uploads.
    pub fn list_mine(&self, actor: &Actor) -> Result<Vec<DocumentRecord>, DocumentReviewError> {
        self.store
            .for_owner(&actor.id)
            .map_err(DocumentReviewError::Store)
    }

    fn dispatch(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            let NotifyError::Channel(reason) = &err;
            warn!(%reason, "document notification dispatch failed");
        }
    }
}
