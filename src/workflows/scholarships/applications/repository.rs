use super::super::identity::UserId;
use super::domain::{
    ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus, CustomAnswer,
    Scholarship, ScholarshipId, SubmittedDocument, TimelineEntry,
};

pub use super::super::contracts::{
    Notification, NotificationCategory, NotificationSink, NotifyError, StoreError,
};

/// Partial update applied to an application. Identity, status, and timeline
/// are deliberately absent: those only move through `append_event`.
#[derive(Debug, Default, Clone)]
pub struct ApplicationPatch {
    pub custom_answers: Option<Vec<CustomAnswer>>,
    pub reviewer_notes: Option<String>,
    pub attach_document: Option<SubmittedDocument>,
    pub score: Option<u8>,
}

/// Storage contract for applications.
///
/// Implementations must enforce uniqueness of the (student, scholarship)
/// pair on `insert`: concurrent duplicate submissions get exactly one
/// winner, the loser a `Conflict`. `append_event` must apply the timeline
/// append and the status write as one atomic unit; no audit entry may be
/// dropped under concurrent writers.
pub trait ApplicationStore: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError>;

    fn find_pair(
        &self,
        student: &UserId,
        scholarship: &ScholarshipId,
    ) -> Result<Option<ApplicationRecord>, StoreError>;

    fn apply_patch(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<ApplicationRecord, StoreError>;

    fn append_event(
        &self,
        id: &ApplicationId,
        entry: TimelineEntry,
        new_status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError>;

    fn for_student(&self, student: &UserId) -> Result<Vec<ApplicationRecord>, StoreError>;

    fn for_scholarship(
        &self,
        scholarship: &ScholarshipId,
    ) -> Result<Vec<ApplicationRecord>, StoreError>;
}

/// Read-only lookups owned by the surrounding platform: the provider catalog
/// and the account system's applicant profiles.
pub trait PortalDirectory: Send + Sync {
    fn scholarship(&self, id: &ScholarshipId) -> Result<Option<Scholarship>, StoreError>;

    fn applicant_profile(&self, id: &UserId) -> Result<Option<ApplicantProfile>, StoreError>;
}
