use super::super::contracts::StoreError;
use super::super::identity::UserId;
use super::domain::{DocumentId, DocumentRecord, VerificationStatus};

/// Storage contract for documents. `set_review` applies the status and the
/// comments as one atomic write.
pub trait DocumentStore: Send + Sync {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, StoreError>;

    fn fetch(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError>;

    fn set_review(
        &self,
        id: &DocumentId,
        status: VerificationStatus,
        comments: Option<String>,
    ) -> Result<DocumentRecord, StoreError>;

    fn for_owner(&self, owner: &UserId) -> Result<Vec<DocumentRecord>, StoreError>;
}
