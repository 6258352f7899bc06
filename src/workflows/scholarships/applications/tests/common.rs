use std::sync::Arc;

use crate::workflows::scholarships::applications::domain::{
    AcademicRecord, ApplicantProfile, EligibilityCriteria, FinancialRecord, GenderRestriction,
    Scholarship, ScholarshipId,
};
use crate::workflows::scholarships::applications::repository::{
    Notification, NotificationSink, NotifyError,
};
use crate::workflows::scholarships::applications::service::{
    ApplicationLifecycleService, SubmissionRequest,
};
use crate::workflows::scholarships::documents::DocumentKind;
use crate::workflows::scholarships::identity::{Actor, Role, UserId};
use crate::workflows::scholarships::memory::{
    InMemoryApplicationStore, InMemoryDirectory, InMemoryNotificationSink,
};

pub(super) fn student() -> Actor {
    Actor::new("stu-1", Role::Student)
}

pub(super) fn second_student() -> Actor {
    Actor::new("stu-2", Role::Student)
}

pub(super) fn admin() -> Actor {
    Actor::new("adm-1", Role::Admin)
}

pub(super) fn provider() -> Actor {
    Actor::new("prov-1", Role::Provider)
}

pub(super) fn other_provider() -> Actor {
    Actor::new("prov-2", Role::Provider)
}

pub(super) fn profile() -> ApplicantProfile {
    ApplicantProfile {
        academic: AcademicRecord {
            institution: Some("Des Moines State".to_string()),
            course: Some("Computer Science".to_string()),
            gpa: Some(3.8),
            year_of_study: Some(3),
        },
        financial: FinancialRecord {
            annual_income: Some(45_000),
            currency: Some("USD".to_string()),
        },
    }
}

pub(super) fn criteria() -> EligibilityCriteria {
    EligibilityCriteria {
        min_gpa: 3.5,
        max_income: Some(80_000),
        min_age: None,
        max_age: None,
        allowed_courses: vec!["Computer Science".to_string(), "Engineering".to_string()],
        gender: GenderRestriction::All,
    }
}

pub(super) fn scholarship() -> Scholarship {
    Scholarship {
        id: ScholarshipId("sch-stem".to_string()),
        title: "STEM Excellence Scholarship".to_string(),
        provider: UserId("prov-1".to_string()),
        criteria: criteria(),
        required_documents: vec![DocumentKind::Transcript, DocumentKind::IncomeCertificate],
    }
}

pub(super) fn submission() -> SubmissionRequest {
    SubmissionRequest {
        scholarship: scholarship().id,
        custom_answers: Vec::new(),
        as_draft: false,
    }
}

pub(super) fn draft_submission() -> SubmissionRequest {
    SubmissionRequest {
        as_draft: true,
        ..submission()
    }
}

pub(super) type TestService = ApplicationLifecycleService<
    InMemoryApplicationStore,
    InMemoryDirectory,
    InMemoryNotificationSink,
>;

/// Service over fresh in-memory stores, seeded with the standard scholarship
/// and the standard student profile.
pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryApplicationStore>,
    Arc<InMemoryDirectory>,
    Arc<InMemoryNotificationSink>,
) {
    let store = Arc::new(InMemoryApplicationStore::default());
    let directory = Arc::new(InMemoryDirectory::default());
    let sink = Arc::new(InMemoryNotificationSink::default());

    directory
        .upsert_scholarship(scholarship())
        .expect("seed scholarship");
    directory
        .upsert_profile(student().id, profile())
        .expect("seed profile");

    let service = ApplicationLifecycleService::new(store.clone(), directory.clone(), sink.clone());
    (service, store, directory, sink)
}

/// Sink whose channel is permanently down, for asserting that dispatch
/// failures never fail the triggering operation.
pub(super) struct UnreachableSink;

impl NotificationSink for UnreachableSink {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Channel("socket gateway offline".to_string()))
    }
}
