//! Process-local reference implementations of the storage and notification
//! contracts. These back the demo server and the test suites; a deployment
//! swaps them for adapters over the real persistence and delivery systems.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::info;

use super::applications::domain::{
    ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus, Scholarship,
    ScholarshipId, TimelineEntry,
};
use super::applications::repository::{ApplicationPatch, ApplicationStore, PortalDirectory};
use super::contracts::{Notification, NotificationSink, NotifyError, StoreError};
use super::documents::{DocumentId, DocumentRecord, DocumentStore, VerificationStatus};
use super::identity::UserId;

fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
}

/// In-memory application store. Uniqueness of the (student, scholarship)
/// pair is enforced inside the insert critical section, which is what makes
/// concurrent duplicate submissions resolve to exactly one winner.
#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        let mut guard = lock(&self.records)?;
        let duplicate_pair = guard
            .values()
            .any(|existing| existing.student == record.student && existing.scholarship == record.scholarship);
        if duplicate_pair || guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_pair(
        &self,
        student: &UserId,
        scholarship: &ScholarshipId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(lock(&self.records)?
            .values()
            .find(|record| record.student == *student && record.scholarship == *scholarship)
            .cloned())
    }

    fn apply_patch(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = lock(&self.records)?;
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        if let Some(custom_answers) = patch.custom_answers {
            record.custom_answers = custom_answers;
        }
        if let Some(reviewer_notes) = patch.reviewer_notes {
            record.reviewer_notes = Some(reviewer_notes);
        }
        if let Some(attachment) = patch.attach_document {
            let open_slot = record.submitted_documents.iter_mut().find(|slot| {
                slot.document_type == attachment.document_type && slot.document.is_none()
            });
            match open_slot {
                Some(slot) => slot.document = attachment.document,
                None => record.submitted_documents.push(attachment),
            }
        }
        if let Some(score) = patch.score {
            record.score = Some(score);
        }

        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn append_event(
        &self,
        id: &ApplicationId,
        entry: TimelineEntry,
        new_status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = lock(&self.records)?;
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        record.timeline.push(entry);
        record.status = new_status;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn for_student(&self, student: &UserId) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.student == *student)
            .cloned()
            .collect())
    }

    fn for_scholarship(
        &self,
        scholarship: &ScholarshipId,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.scholarship == *scholarship)
            .cloned()
            .collect())
    }
}

/// In-memory catalog and account lookups, seeded at startup.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    scholarships: Arc<Mutex<HashMap<ScholarshipId, Scholarship>>>,
    profiles: Arc<Mutex<HashMap<UserId, ApplicantProfile>>>,
}

impl InMemoryDirectory {
    pub fn upsert_scholarship(&self, scholarship: Scholarship) -> Result<(), StoreError> {
        lock(&self.scholarships)?.insert(scholarship.id.clone(), scholarship);
        Ok(())
    }

    pub fn upsert_profile(
        &self,
        student: UserId,
        profile: ApplicantProfile,
    ) -> Result<(), StoreError> {
        lock(&self.profiles)?.insert(student, profile);
        Ok(())
    }
}

impl PortalDirectory for InMemoryDirectory {
    fn scholarship(&self, id: &ScholarshipId) -> Result<Option<Scholarship>, StoreError> {
        Ok(lock(&self.scholarships)?.get(id).cloned())
    }

    fn applicant_profile(&self, id: &UserId) -> Result<Option<ApplicantProfile>, StoreError> {
        Ok(lock(&self.profiles)?.get(id).cloned())
    }
}

/// In-memory document store.
#[derive(Default, Clone)]
pub struct InMemoryDocumentStore {
    records: Arc<Mutex<HashMap<DocumentId, DocumentRecord>>>,
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, StoreError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn set_review(
        &self,
        id: &DocumentId,
        status: VerificationStatus,
        comments: Option<String>,
    ) -> Result<DocumentRecord, StoreError> {
        let mut guard = lock(&self.records)?;
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;

        record.status = status;
        record.verification_comments = comments;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn for_owner(&self, owner: &UserId) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| record.owner == *owner)
            .cloned()
            .collect())
    }
}

/// Records every dispatched notification so callers can assert on them.
#[derive(Default, Clone)]
pub struct InMemoryNotificationSink {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationSink {
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|_| NotifyError::Channel("sink mutex poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

/// Sink used by the demo server: emits each notification to the log stream
/// instead of a delivery channel.
#[derive(Default, Clone)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient.0,
            category = notification.category.label(),
            title = %notification.title,
            "notification dispatched"
        );
        Ok(())
    }
}
