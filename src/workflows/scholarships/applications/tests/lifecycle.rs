use std::sync::Arc;

use chrono::Utc;

use super::common::*;
use crate::workflows::scholarships::applications::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, CustomAnswer, TimelineEntry,
};
use crate::workflows::scholarships::applications::repository::{ApplicationStore, StoreError};
use crate::workflows::scholarships::applications::service::{
    ApplicationLifecycleService, LifecycleError,
};
use crate::workflows::scholarships::documents::{DocumentId, DocumentKind};
use crate::workflows::scholarships::memory::InMemoryApplicationStore;

#[test]
fn submission_scores_once_and_opens_the_timeline() {
    let (service, _store, _directory, sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");

    assert_eq!(record.status, ApplicationStatus::Submitted);
    assert_eq!(record.score, Some(75));
    assert_eq!(record.timeline.len(), 1);
    assert_eq!(record.timeline[0].comment, "Application submitted");
    assert_eq!(record.submitted_documents.len(), 2);
    assert!(record.submitted_documents.iter().all(|slot| slot.document.is_none()));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Application Submitted");
    assert!(events[0].message.contains("STEM Excellence Scholarship"));
    assert!(events[0].also_email);
}

#[test]
fn duplicate_submission_conflicts_without_touching_the_original() {
    let (service, store, _directory, _sink) = build_service();

    let original = service.submit(&student(), submission()).expect("submits");

    match service.submit(&student(), submission()) {
        Err(LifecycleError::DuplicateApplication) => {}
        other => panic!("expected duplicate conflict, got {other:?}"),
    }

    let stored = store
        .fetch(&original.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, original);
}

#[test]
fn the_store_constraint_catches_duplicates_that_slip_past_the_precheck() {
    let store = InMemoryApplicationStore::default();
    let now = Utc::now();
    let template = ApplicationRecord {
        id: ApplicationId("app-race-1".to_string()),
        student: student().id,
        scholarship: scholarship().id,
        status: ApplicationStatus::Submitted,
        score: Some(75),
        custom_answers: Vec::new(),
        submitted_documents: Vec::new(),
        timeline: vec![TimelineEntry {
            status: ApplicationStatus::Submitted,
            comment: "Application submitted".to_string(),
            updated_by: student().id,
            date: now,
        }],
        reviewer_notes: None,
        created_at: now,
        updated_at: now,
    };

    store.insert(template.clone()).expect("first writer wins");

    let rival = ApplicationRecord {
        id: ApplicationId("app-race-2".to_string()),
        ..template
    };
    match store.insert(rival) {
        Err(StoreError::Conflict) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn reviewers_may_reject_straight_from_submitted() {
    let (service, _store, _directory, sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");
    let rejected = service
        .change_status(
            &provider(),
            &record.id,
            ApplicationStatus::Rejected,
            Some("Budget exhausted for this cycle".to_string()),
        )
        .expect("direct rejection is legal");

    assert_eq!(rejected.status, ApplicationStatus::Rejected);
    assert_eq!(rejected.timeline.len(), 2);
    assert_eq!(
        rejected.timeline[1].comment,
        "Budget exhausted for this cycle"
    );

    let update = sink
        .events()
        .into_iter()
        .find(|event| event.title == "Application Status Updated")
        .expect("status notification sent");
    assert!(update.message.contains("rejected"));
}

#[test]
fn terminal_applications_refuse_further_transitions() {
    let (service, store, _directory, _sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");
    service
        .change_status(&admin(), &record.id, ApplicationStatus::Approved, None)
        .expect("approval");

    match service.change_status(&admin(), &record.id, ApplicationStatus::UnderReview, None) {
        Err(LifecycleError::InvalidTransition(refused)) => {
            assert_eq!(refused.from, ApplicationStatus::Approved);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let stored = store
        .fetch(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.timeline.len(), 2, "refused move must not append");
}

#[test]
fn timeline_grows_by_exactly_one_entry_per_operation() {
    let (service, _store, _directory, _sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");
    let steps = [
        ApplicationStatus::UnderReview,
        ApplicationStatus::Interview,
        ApplicationStatus::Approved,
    ];

    let mut current = record;
    for status in steps {
        current = service
            .change_status(&admin(), &current.id, status, None)
            .expect("legal move");
    }
    let current = service
        .add_comment(&admin(), &current.id, "Congratulations".to_string())
        .expect("comments are allowed on terminal applications");

    assert_eq!(current.timeline.len(), 5);
    assert_eq!(current.timeline[0].comment, "Application submitted");
    assert_eq!(current.timeline[1].comment, "Status updated to under_review");
    assert_eq!(current.timeline[4].comment, "Congratulations");
    assert_eq!(current.timeline[4].status, ApplicationStatus::Approved);
    for pair in current.timeline.windows(2) {
        assert!(pair[0].date <= pair[1].date, "timeline must stay chronological");
    }
}

#[test]
fn concurrent_appends_never_drop_audit_entries() {
    let (service, store, _directory, _sink) = build_service();
    let record = service.submit(&student(), submission()).expect("submits");

    let writers: Vec<_> = (0..4)
        .map(|pass| {
            let store = store.clone();
            let id = record.id.clone();
            std::thread::spawn(move || {
                store
                    .append_event(
                        &id,
                        TimelineEntry {
                            status: ApplicationStatus::UnderReview,
                            comment: format!("reviewer pass {pass}"),
                            updated_by: admin().id,
                            date: Utc::now(),
                        },
                        ApplicationStatus::UnderReview,
                    )
                    .expect("append succeeds")
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer completes");
    }

    let stored = store
        .fetch(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.timeline.len(), 5, "every audit entry must survive");
}

#[test]
fn concurrent_duplicate_submissions_have_exactly_one_winner() {
    let (service, _store, _directory, _sink) = build_service();
    let service = Arc::new(service);

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.submit(&student(), submission()))
        })
        .collect();
    let results: Vec<_> = attempts
        .into_iter()
        .map(|attempt| attempt.join().expect("attempt completes"))
        .collect();

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|result| matches!(result, Err(LifecycleError::DuplicateApplication))));
}

#[test]
fn applicant_edits_lock_once_review_begins() {
    let (service, _store, _directory, _sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");
    let answers = vec![CustomAnswer {
        question_id: "q1".to_string(),
        question: "Why this field?".to_string(),
        answer: "Systems curiosity".to_string(),
    }];

    let updated = service
        .update_answers(&student(), &record.id, answers.clone())
        .expect("editable while submitted");
    assert_eq!(updated.custom_answers, answers);
    assert_eq!(updated.score, record.score, "edits never touch the score");
    assert_eq!(updated.timeline.len(), record.timeline.len());

    service
        .change_status(&admin(), &record.id, ApplicationStatus::UnderReview, None)
        .expect("review starts");

    match service.update_answers(&student(), &record.id, Vec::new()) {
        Err(LifecycleError::EditLocked(ApplicationStatus::UnderReview)) => {}
        other => panic!("expected edit lock, got {other:?}"),
    }
}

#[test]
fn only_the_owning_provider_or_admin_may_move_status() {
    let (service, _store, _directory, _sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");

    match service.change_status(
        &other_provider(),
        &record.id,
        ApplicationStatus::UnderReview,
        None,
    ) {
        Err(LifecycleError::Forbidden(_)) => {}
        other => panic!("expected forbidden for non-owning provider, got {other:?}"),
    }

    match service.change_status(&student(), &record.id, ApplicationStatus::Approved, None) {
        Err(LifecycleError::Forbidden(_)) => {}
        other => panic!("expected forbidden for student, got {other:?}"),
    }
}

#[test]
fn drafts_carry_no_score_until_finalized() {
    let (service, _store, _directory, sink) = build_service();

    let draft = service
        .submit(&student(), draft_submission())
        .expect("draft saves");
    assert_eq!(draft.status, ApplicationStatus::Draft);
    assert_eq!(draft.score, None);
    assert!(sink.events().is_empty(), "drafts are silent");

    let submitted = service
        .finalize_draft(&student(), &draft.id)
        .expect("finalizes");
    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert_eq!(submitted.score, Some(75));
    assert_eq!(submitted.timeline.len(), 2);
    assert_eq!(sink.events().len(), 1);

    match service.finalize_draft(&student(), &draft.id) {
        Err(LifecycleError::InvalidTransition(_)) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn drafts_only_move_to_submitted() {
    let (service, _store, _directory, _sink) = build_service();

    let draft = service
        .submit(&student(), draft_submission())
        .expect("draft saves");

    match service.change_status(&admin(), &draft.id, ApplicationStatus::UnderReview, None) {
        Err(LifecycleError::InvalidTransition(_)) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn attaching_documents_fills_the_matching_slot() {
    let (service, _store, _directory, _sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");
    let updated = service
        .attach_document(
            &student(),
            &record.id,
            crate::workflows::scholarships::applications::domain::SubmittedDocument {
                document_type: DocumentKind::Transcript,
                document: Some(DocumentId("doc-000101".to_string())),
            },
        )
        .expect("attaches");

    assert_eq!(updated.submitted_documents.len(), 2);
    let transcript = updated
        .submitted_documents
        .iter()
        .find(|slot| slot.document_type == DocumentKind::Transcript)
        .expect("slot exists");
    assert!(transcript.document.is_some());

    let view = service.fetch(&student(), &record.id).expect("fetches");
    assert_eq!(view.missing_documents, vec!["Income Certificate"]);
}

#[test]
fn reviewer_notes_are_hidden_from_the_applicant() {
    let (service, _store, _directory, _sink) = build_service();

    let record = service.submit(&student(), submission()).expect("submits");
    service
        .set_reviewer_notes(&admin(), &record.id, "Strong transcript".to_string())
        .expect("notes saved");

    let student_view = service.fetch(&student(), &record.id).expect("owner fetch");
    assert!(student_view.reviewer_notes.is_none());

    let admin_view = service.fetch(&admin(), &record.id).expect("admin fetch");
    assert_eq!(admin_view.reviewer_notes.as_deref(), Some("Strong transcript"));

    match service.set_reviewer_notes(&student(), &record.id, "mine now".to_string()) {
        Err(LifecycleError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn ranking_sorts_by_stored_score_descending() {
    let (service, _store, directory, _sink) = build_service();

    let mut weaker = profile();
    weaker.academic.gpa = Some(3.0);
    weaker.financial.annual_income = Some(70_000);
    directory
        .upsert_profile(second_student().id, weaker)
        .expect("seed second profile");

    service.submit(&student(), submission()).expect("first");
    service
        .submit(&second_student(), submission())
        .expect("second");

    let ranked = service
        .ranked_for_scholarship(&provider(), &scholarship().id)
        .expect("provider may rank");
    assert_eq!(ranked.len(), 2);
    assert!(ranked[0].score >= ranked[1].score);
    assert_eq!(ranked[0].student, student().id);

    match service.ranked_for_scholarship(&student(), &scholarship().id) {
        Err(LifecycleError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn screening_projects_eligibility_and_score_without_creating_anything() {
    let (service, store, _directory, _sink) = build_service();

    let report = service
        .screen(&student(), &scholarship().id)
        .expect("screens");
    assert!(report.eligibility.is_eligible);
    assert_eq!(report.projected_score, 75);

    assert!(store
        .find_pair(&student().id, &scholarship().id)
        .expect("lookup succeeds")
        .is_none());
}

#[test]
fn unknown_scholarship_and_application_report_not_found() {
    let (service, _store, _directory, _sink) = build_service();

    let mut request = submission();
    request.scholarship =
        crate::workflows::scholarships::applications::domain::ScholarshipId("sch-ghost".to_string());
    match service.submit(&student(), request) {
        Err(LifecycleError::ScholarshipNotFound) => {}
        other => panic!("expected scholarship not found, got {other:?}"),
    }

    match service.fetch(&student(), &ApplicationId("app-ghost".to_string())) {
        Err(LifecycleError::ApplicationNotFound) => {}
        other => panic!("expected application not found, got {other:?}"),
    }
}

#[test]
fn notification_outages_never_fail_the_operation() {
    let (_service, _store, directory, _sink) = build_service();

    let store = Arc::new(InMemoryApplicationStore::default());
    let service = ApplicationLifecycleService::new(store, directory, Arc::new(UnreachableSink));

    let record = service
        .submit(&student(), submission())
        .expect("submission survives a dead channel");
    service
        .change_status(&admin(), &record.id, ApplicationStatus::Approved, None)
        .expect("status change survives a dead channel");
}
