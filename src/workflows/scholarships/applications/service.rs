use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::identity::{Actor, Role};
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationView, CustomAnswer,
    IllegalTransition, Scholarship, ScholarshipId, SubmittedDocument, TimelineEntry,
};
use super::eligibility::{evaluate, EligibilityReport};
use super::repository::{
    ApplicationPatch, ApplicationStore, Notification, NotificationCategory, NotificationSink,
    PortalDirectory, StoreError,
};
use super::scoring::composite_score;

/// Error raised by the application lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("scholarship not found")]
    ScholarshipNotFound,
    #[error("application not found")]
    ApplicationNotFound,
    #[error("applicant profile not found")]
    ProfileNotFound,
    #[error("you have already applied for this scholarship")]
    DuplicateApplication,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("application can no longer be edited while {}", .0.label())]
    EditLocked(ApplicationStatus),
    #[error(transparent)]
    InvalidTransition(#[from] IllegalTransition),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Intake payload for a new application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub scholarship: ScholarshipId,
    #[serde(default)]
    pub custom_answers: Vec<CustomAnswer>,
    /// Create as an editable draft instead of submitting immediately. Drafts
    /// carry no score until they are finalized.
    #[serde(default)]
    pub as_draft: bool,
}

/// Eligibility screening result for one (applicant, scholarship) pair.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReport {
    pub scholarship: ScholarshipId,
    #[serde(flatten)]
    pub eligibility: EligibilityReport,
    pub projected_score: u8,
}

/// Owns the application state machine: validates transitions, appends audit
/// timeline entries, enforces edit locks, and requests notifications.
pub struct ApplicationLifecycleService<S, D, N> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<S, D, N> ApplicationLifecycleService<S, D, N>
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, notifier: Arc<N>) -> Self {
        Self {
            store,
            directory,
            notifier,
        }
    }

    /// Create an application for the acting student.
    ///
    /// The ranking score is computed exactly once here (or at draft
    /// finalization) and persisted; it is never recomputed on later reads.
    /// The duplicate pre-check is only the fast, friendly error path; the
    /// store's uniqueness constraint on (student, scholarship) is the actual
    /// race-safety mechanism.
    pub fn submit(
        &self,
        actor: &Actor,
        request: SubmissionRequest,
    ) -> Result<ApplicationRecord, LifecycleError> {
        if actor.role != Role::Student {
            return Err(LifecycleError::Forbidden(
                "only students may submit applications",
            ));
        }

        let scholarship = self
            .directory
            .scholarship(&request.scholarship)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;
        let profile = self
            .directory
            .applicant_profile(&actor.id)?
            .ok_or(LifecycleError::ProfileNotFound)?;

        if self
            .store
            .find_pair(&actor.id, &scholarship.id)?
            .is_some()
        {
            return Err(LifecycleError::DuplicateApplication);
        }

        let now = Utc::now();
        let (status, score, opening_comment) = if request.as_draft {
            (ApplicationStatus::Draft, None, "Application draft created")
        } else {
            (
                ApplicationStatus::Submitted,
                Some(composite_score(&profile, &scholarship.criteria)),
                "Application submitted",
            )
        };

        let submitted_documents = scholarship
            .required_documents
            .iter()
            .map(|kind| SubmittedDocument {
                document_type: *kind,
                document: None,
            })
            .collect();

        let record = ApplicationRecord {
            id: next_application_id(),
            student: actor.id.clone(),
            scholarship: scholarship.id.clone(),
            status,
            score,
            custom_answers: request.custom_answers,
            submitted_documents,
            timeline: vec![TimelineEntry {
                status,
                comment: opening_comment.to_string(),
                updated_by: actor.id.clone(),
                date: now,
            }],
            reviewer_notes: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(record).map_err(|err| match err {
            StoreError::Conflict => LifecycleError::DuplicateApplication,
            other => LifecycleError::Store(other),
        })?;

        if status == ApplicationStatus::Submitted {
            self.dispatch(submission_notification(&stored, &scholarship));
        }

        Ok(stored)
    }

    /// Move an owned draft to `submitted`, scoring it at this moment.
    pub fn finalize_draft(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let record = self.require(id)?;
        if record.student != actor.id {
            return Err(LifecycleError::Forbidden("not authorized"));
        }
        record
            .status
            .validate_transition(ApplicationStatus::Submitted)?;

        let scholarship = self
            .directory
            .scholarship(&record.scholarship)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;
        let profile = self
            .directory
            .applicant_profile(&actor.id)?
            .ok_or(LifecycleError::ProfileNotFound)?;

        let score = composite_score(&profile, &scholarship.criteria);
        self.store.apply_patch(
            id,
            ApplicationPatch {
                score: Some(score),
                ..ApplicationPatch::default()
            },
        )?;

        let updated = self.store.append_event(
            id,
            TimelineEntry {
                status: ApplicationStatus::Submitted,
                comment: "Application submitted".to_string(),
                updated_by: actor.id.clone(),
                date: Utc::now(),
            },
            ApplicationStatus::Submitted,
        )?;

        self.dispatch(submission_notification(&updated, &scholarship));
        Ok(updated)
    }

    /// Applicant edit of the submission content. Permitted only before review
    /// begins; never touches student, scholarship, score, or timeline.
    pub fn update_answers(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        custom_answers: Vec<CustomAnswer>,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let record = self.require(id)?;
        if record.student != actor.id {
            return Err(LifecycleError::Forbidden("not authorized"));
        }
        if !record.status.accepts_student_edits() {
            return Err(LifecycleError::EditLocked(record.status));
        }

        Ok(self.store.apply_patch(
            id,
            ApplicationPatch {
                custom_answers: Some(custom_answers),
                ..ApplicationPatch::default()
            },
        )?)
    }

    /// Reviewer status move. The transition table is the single authority on
    /// legality; the audit append and status write land atomically.
    pub fn change_status(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        target: ApplicationStatus,
        comment: Option<String>,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let record = self.require(id)?;
        let scholarship = self
            .directory
            .scholarship(&record.scholarship)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;
        self.authorize_reviewer(actor, &scholarship)?;

        record.status.validate_transition(target)?;

        let entry = TimelineEntry {
            status: target,
            comment: comment.unwrap_or_else(|| format!("Status updated to {target}")),
            updated_by: actor.id.clone(),
            date: Utc::now(),
        };
        let updated = self.store.append_event(id, entry, target)?;

        self.dispatch(Notification {
            recipient: updated.student.clone(),
            title: "Application Status Updated".to_string(),
            message: format!(
                "Your application status for {} has been updated to: {target}",
                scholarship.title
            ),
            category: NotificationCategory::ApplicationUpdate,
            related_link: Some(format!("/applications/{}", updated.id.0)),
            also_email: true,
        });

        Ok(updated)
    }

    /// Record an uploaded document against the application. Fills the first
    /// empty slot of the same type, or appends a new pair. Completeness
    /// against the scholarship's required list is reported on reads, not
    /// enforced here.
    pub fn attach_document(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        attachment: SubmittedDocument,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let record = self.require(id)?;
        if record.student != actor.id {
            return Err(LifecycleError::Forbidden("not authorized"));
        }
        if !record.status.accepts_student_edits() {
            return Err(LifecycleError::EditLocked(record.status));
        }

        Ok(self.store.apply_patch(
            id,
            ApplicationPatch {
                attach_document: Some(attachment),
                ..ApplicationPatch::default()
            },
        )?)
    }

    /// Append a free-text note at the current status. Allowed for the owner
    /// and for reviewers, including on terminal applications.
    pub fn add_comment(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        comment: String,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let record = self.require(id)?;
        if record.student != actor.id {
            let scholarship = self
                .directory
                .scholarship(&record.scholarship)?
                .ok_or(LifecycleError::ScholarshipNotFound)?;
            self.authorize_reviewer(actor, &scholarship)?;
        }

        let entry = TimelineEntry {
            status: record.status,
            comment,
            updated_by: actor.id.clone(),
            date: Utc::now(),
        };
        Ok(self.store.append_event(id, entry, record.status)?)
    }

    /// Reviewer-only free text, never shown to the applicant.
    pub fn set_reviewer_notes(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        notes: String,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let record = self.require(id)?;
        let scholarship = self
            .directory
            .scholarship(&record.scholarship)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;
        self.authorize_reviewer(actor, &scholarship)?;

        Ok(self.store.apply_patch(
            id,
            ApplicationPatch {
                reviewer_notes: Some(notes),
                ..ApplicationPatch::default()
            },
        )?)
    }

    /// Fetch one application, enforcing view access and redacting reviewer
    /// notes from the applicant.
    pub fn fetch(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<ApplicationView, LifecycleError> {
        let record = self.require(id)?;
        let scholarship = self
            .directory
            .scholarship(&record.scholarship)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;

        let is_owner = record.student == actor.id;
        let is_owning_provider =
            actor.role == Role::Provider && scholarship.provider == actor.id;
        if !is_owner && actor.role != Role::Admin && !is_owning_provider {
            return Err(LifecycleError::Forbidden(
                "you do not have permission to view this application",
            ));
        }

        Ok(record.view_for(actor.role, &scholarship.required_documents))
    }

    /// The acting student's applications, newest first.
    pub fn list_mine(&self, actor: &Actor) -> Result<Vec<ApplicationView>, LifecycleError> {
        if actor.role != Role::Student {
            return Err(LifecycleError::Forbidden(
                "only students may list their applications",
            ));
        }

        let mut records = self.store.for_student(&actor.id)?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.render(actor.role, records)
    }

    /// All applications for one scholarship, ranked by stored score
    /// (highest first, unscored drafts last). Reviewer-only.
    pub fn ranked_for_scholarship(
        &self,
        actor: &Actor,
        scholarship_id: &ScholarshipId,
    ) -> Result<Vec<ApplicationView>, LifecycleError> {
        let scholarship = self
            .directory
            .scholarship(scholarship_id)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;
        self.authorize_reviewer(actor, &scholarship)?;

        let mut records = self.store.for_scholarship(scholarship_id)?;
        records.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        Ok(records
            .into_iter()
            .map(|record| record.view_for(actor.role, &scholarship.required_documents))
            .collect())
    }

    /// Evaluate the acting user's profile against a scholarship without
    /// creating anything. Also projects the ranking score the applicant
    /// would receive if they submitted now.
    pub fn screen(
        &self,
        actor: &Actor,
        scholarship_id: &ScholarshipId,
    ) -> Result<ScreeningReport, LifecycleError> {
        let scholarship = self
            .directory
            .scholarship(scholarship_id)?
            .ok_or(LifecycleError::ScholarshipNotFound)?;
        let profile = self
            .directory
            .applicant_profile(&actor.id)?
            .ok_or(LifecycleError::ProfileNotFound)?;

        Ok(ScreeningReport {
            scholarship: scholarship.id,
            eligibility: evaluate(&profile, &scholarship.criteria),
            projected_score: composite_score(&profile, &scholarship.criteria),
        })
    }

    fn require(&self, id: &ApplicationId) -> Result<ApplicationRecord, LifecycleError> {
        self.store
            .fetch(id)?
            .ok_or(LifecycleError::ApplicationNotFound)
    }

    fn authorize_reviewer(
        &self,
        actor: &Actor,
        scholarship: &Scholarship,
    ) -> Result<(), LifecycleError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Provider if scholarship.provider == actor.id => Ok(()),
            _ => Err(LifecycleError::Forbidden(
                "not authorized to review applications for this scholarship",
            )),
        }
    }

    fn render(
        &self,
        role: Role,
        records: Vec<ApplicationRecord>,
    ) -> Result<Vec<ApplicationView>, LifecycleError> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let required = self
                .directory
                .scholarship(&record.scholarship)?
                .map(|scholarship| scholarship.required_documents)
                .unwrap_or_default();
            views.push(record.view_for(role, &required));
        }
        Ok(views)
    }

    fn dispatch(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification dispatch failed");
        }
    }
}

fn submission_notification(record: &ApplicationRecord, scholarship: &Scholarship) -> Notification {
    Notification {
        recipient: record.student.clone(),
        title: "Application Submitted".to_string(),
        message: format!(
            "Your application for {} has been successfully submitted.",
            scholarship.title
        ),
        category: NotificationCategory::Success,
        related_link: Some(format!("/applications/{}", record.id.0)),
        also_email: true,
    }
}
