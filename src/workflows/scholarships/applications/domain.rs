use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::documents::{DocumentId, DocumentKind};
use super::super::identity::{Role, UserId};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for scholarships in the provider catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScholarshipId(pub String);

/// Academic snapshot read from the applicant's account profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub institution: Option<String>,
    pub course: Option<String>,
    /// 0.0 to 4.0 scale; values above 4.0 are clamped by the scorer.
    pub gpa: Option<f64>,
    pub year_of_study: Option<u8>,
}

/// Financial snapshot read from the applicant's account profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub annual_income: Option<u32>,
    pub currency: Option<String>,
}

/// Read-only applicant data consumed by the evaluator and scorer. Owned by
/// the account system; the workflow never writes it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    #[serde(default)]
    pub academic: AcademicRecord,
    #[serde(default)]
    pub financial: FinancialRecord,
}

/// Gender restriction carried in provider catalog data. The evaluator does
/// not consult it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderRestriction {
    #[default]
    All,
    Male,
    Female,
    Other,
}

/// The fixed, closed set of eligibility fields attached to a scholarship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    #[serde(default)]
    pub min_gpa: f64,
    #[serde(default)]
    pub max_income: Option<u32>,
    /// Present in catalog data; not consulted by the evaluator.
    #[serde(default)]
    pub min_age: Option<u8>,
    #[serde(default)]
    pub max_age: Option<u8>,
    /// Empty means no course restriction.
    #[serde(default)]
    pub allowed_courses: Vec<String>,
    #[serde(default)]
    pub gender: GenderRestriction,
}

/// Catalog entry for a scholarship, as resolved through the portal directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: ScholarshipId,
    pub title: String,
    pub provider: UserId,
    #[serde(default)]
    pub criteria: EligibilityCriteria,
    #[serde(default)]
    pub required_documents: Vec<DocumentKind>,
}

/// Lifecycle states for an application. `received` is accepted on the wire as
/// an alias of `submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    #[serde(alias = "received")]
    Submitted,
    UnderReview,
    Interview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    /// Applicants may restructure their submission only before review begins.
    pub const fn accepts_student_edits(self) -> bool {
        matches!(self, ApplicationStatus::Draft | ApplicationStatus::Submitted)
    }

    /// Single authority for the legality of a status move:
    /// - terminal states accept no further transitions;
    /// - nothing transitions back to `Draft`;
    /// - a draft may only be submitted;
    /// - any other pair of distinct states is a legal reviewer move;
    /// - a same-state move is refused (the comment operation appends without
    ///   moving).
    pub fn validate_transition(self, to: ApplicationStatus) -> Result<(), IllegalTransition> {
        let refused = self.is_terminal()
            || matches!(to, ApplicationStatus::Draft)
            || (matches!(self, ApplicationStatus::Draft)
                && !matches!(to, ApplicationStatus::Submitted))
            || self == to;

        if refused {
            Err(IllegalTransition { from: self, to })
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Refused status move, reported with both endpoints so callers can render a
/// lossless error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {from} to {to}")]
pub struct IllegalTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// Applicant-provided answer to a scholarship's custom question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAnswer {
    pub question_id: String,
    pub question: String,
    pub answer: String,
}

/// A required-document slot on an application. The reference stays empty
/// until the applicant uploads something for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedDocument {
    pub document_type: DocumentKind,
    pub document: Option<DocumentId>,
}

/// Append-only audit entry. Never edited or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: ApplicationStatus,
    pub comment: String,
    pub updated_by: UserId,
    pub date: DateTime<Utc>,
}

/// The central workflow entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub student: UserId,
    pub scholarship: ScholarshipId,
    pub status: ApplicationStatus,
    /// Computed once at the submission moment and never recomputed, even if
    /// the profile later changes.
    pub score: Option<u8>,
    pub custom_answers: Vec<CustomAnswer>,
    pub submitted_documents: Vec<SubmittedDocument>,
    pub timeline: Vec<TimelineEntry>,
    /// Never serialized on the raw record; reviewer-grade roles read it
    /// through [`ApplicationView`], which redacts it for everyone else.
    #[serde(skip_serializing)]
    pub reviewer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// Required document kinds with no uploaded reference yet. Reported to
    /// callers, never enforced at submission.
    pub fn missing_documents(&self, required: &[DocumentKind]) -> Vec<DocumentKind> {
        required
            .iter()
            .filter(|kind| {
                !self
                    .submitted_documents
                    .iter()
                    .any(|slot| slot.document_type == **kind && slot.document.is_some())
            })
            .copied()
            .collect()
    }

    /// Render the record for a caller, redacting reviewer notes from
    /// non-privileged roles.
    pub fn view_for(&self, role: Role, required: &[DocumentKind]) -> ApplicationView {
        let reviewer_notes = if role.is_privileged() {
            self.reviewer_notes.clone()
        } else {
            None
        };

        ApplicationView {
            id: self.id.clone(),
            student: self.student.clone(),
            scholarship: self.scholarship.clone(),
            status: self.status.label(),
            score: self.score,
            custom_answers: self.custom_answers.clone(),
            submitted_documents: self.submitted_documents.clone(),
            timeline: self.timeline.clone(),
            missing_documents: self
                .missing_documents(required)
                .into_iter()
                .map(DocumentKind::label)
                .collect(),
            reviewer_notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Sanitized representation of an application returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub student: UserId,
    pub scholarship: ScholarshipId,
    pub status: &'static str,
    pub score: Option<u8>,
    pub custom_answers: Vec<CustomAnswer>,
    pub submitted_documents: Vec<SubmittedDocument>,
    pub timeline: Vec<TimelineEntry>,
    pub missing_documents: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
