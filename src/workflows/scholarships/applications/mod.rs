//! Application intake, eligibility screening, ranking, and the review
//! lifecycle. The evaluator and scorer are pure functions; every mutation
//! flows through the lifecycle service, which owns the state machine and the
//! append-only audit timeline.

pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AcademicRecord, ApplicantProfile, ApplicationId, ApplicationRecord, ApplicationStatus,
    ApplicationView, CustomAnswer, EligibilityCriteria, FinancialRecord, GenderRestriction,
    IllegalTransition, Scholarship, ScholarshipId, SubmittedDocument, TimelineEntry,
};
pub use eligibility::{evaluate, EligibilityReport};
pub use repository::{
    ApplicationPatch, ApplicationStore, Notification, NotificationCategory, NotificationSink,
    NotifyError, PortalDirectory, StoreError,
};
pub use router::application_router;
pub use scoring::composite_score;
pub use service::{
    ApplicationLifecycleService, LifecycleError, ScreeningReport, SubmissionRequest,
};
