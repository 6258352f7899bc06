use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::identity::UserId;

/// Identifier wrapper for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Closed set of document types scholarships may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Transcript,
    #[serde(rename = "ID Proof")]
    IdProof,
    #[serde(rename = "Income Certificate")]
    IncomeCertificate,
    #[serde(rename = "Recommendation Letter")]
    RecommendationLetter,
    Essay,
    Other,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Transcript => "Transcript",
            DocumentKind::IdProof => "ID Proof",
            DocumentKind::IncomeCertificate => "Income Certificate",
            DocumentKind::RecommendationLetter => "Recommendation Letter",
            DocumentKind::Essay => "Essay",
            DocumentKind::Other => "Other",
        }
    }
}

/// Review state of a single document, independent of any application's
/// lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    /// A review may only land on `verified` or `rejected`; `pending` is the
    /// upload state, never a target.
    pub const fn is_review_outcome(self) -> bool {
        matches!(
            self,
            VerificationStatus::Verified | VerificationStatus::Rejected
        )
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An uploaded document. The binary itself lives in external storage; this
/// record carries the locator and review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub owner: UserId,
    pub name: String,
    pub kind: DocumentKind,
    pub storage_key: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub status: VerificationStatus,
    /// Set only when the document is rejected.
    pub verification_comments: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
