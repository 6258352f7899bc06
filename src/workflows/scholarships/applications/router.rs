use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::super::documents::{DocumentId, DocumentKind};
use super::super::identity::Actor;
use super::domain::{ApplicationId, ApplicationStatus, CustomAnswer, ScholarshipId, SubmittedDocument};
use super::repository::{ApplicationStore, NotificationSink, PortalDirectory, StoreError};
use super::service::{ApplicationLifecycleService, LifecycleError, SubmissionRequest};

/// Router builder exposing the application lifecycle over HTTP. Transport is
/// a thin adapter: all rules live in the service.
pub fn application_router<S, D, N>(service: Arc<ApplicationLifecycleService<S, D, N>>) -> Router
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<S, D, N>))
        .route("/api/v1/applications/mine", get(mine_handler::<S, D, N>))
        .route(
            "/api/v1/applications/:id",
            get(get_handler::<S, D, N>).patch(update_handler::<S, D, N>),
        )
        .route(
            "/api/v1/applications/:id/submit",
            post(finalize_handler::<S, D, N>),
        )
        .route(
            "/api/v1/applications/:id/status",
            post(status_handler::<S, D, N>),
        )
        .route(
            "/api/v1/applications/:id/documents",
            post(attach_handler::<S, D, N>),
        )
        .route(
            "/api/v1/applications/:id/comments",
            post(comment_handler::<S, D, N>),
        )
        .route(
            "/api/v1/applications/:id/notes",
            post(notes_handler::<S, D, N>),
        )
        .route(
            "/api/v1/scholarships/:id/applications",
            get(ranked_handler::<S, D, N>),
        )
        .route(
            "/api/v1/scholarships/:id/eligibility",
            get(screen_handler::<S, D, N>),
        )
        .with_state(service)
}

#[derive(Deserialize)]
struct UpdateAnswersRequest {
    custom_answers: Vec<CustomAnswer>,
}

#[derive(Deserialize)]
struct StatusChangeRequest {
    status: ApplicationStatus,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct AttachDocumentRequest {
    document_type: DocumentKind,
    document: DocumentId,
}

#[derive(Deserialize)]
struct CommentRequest {
    comment: String,
}

#[derive(Deserialize)]
struct ReviewerNotesRequest {
    notes: String,
}

async fn submit_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Json(request): Json<SubmissionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.submit(&actor, request) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn finalize_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.finalize_draft(&actor, &ApplicationId(id)) {
        Ok(record) => Json(record).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn get_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.fetch(&actor, &ApplicationId(id)) {
        Ok(view) => Json(view).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn update_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<UpdateAnswersRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.update_answers(&actor, &ApplicationId(id), request.custom_answers) {
        Ok(record) => Json(record).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn status_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<StatusChangeRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.change_status(&actor, &ApplicationId(id), request.status, request.comment) {
        Ok(record) => Json(record).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn attach_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<AttachDocumentRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    let attachment = SubmittedDocument {
        document_type: request.document_type,
        document: Some(request.document),
    };
    match service.attach_document(&actor, &ApplicationId(id), attachment) {
        Ok(record) => Json(record).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn comment_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.add_comment(&actor, &ApplicationId(id), request.comment) {
        Ok(record) => Json(record).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn notes_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<ReviewerNotesRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.set_reviewer_notes(&actor, &ApplicationId(id), request.notes) {
        Ok(record) => Json(record).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn mine_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.list_mine(&actor) {
        Ok(views) => Json(views).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn ranked_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.ranked_for_scholarship(&actor, &ScholarshipId(id)) {
        Ok(views) => Json(views).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

async fn screen_handler<S, D, N>(
    State(service): State<Arc<ApplicationLifecycleService<S, D, N>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: PortalDirectory + 'static,
    N: NotificationSink + 'static,
{
    match service.screen(&actor, &ScholarshipId(id)) {
        Ok(report) => Json(report).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

fn lifecycle_error_response(error: LifecycleError) -> Response {
    let status = match &error {
        LifecycleError::ScholarshipNotFound
        | LifecycleError::ApplicationNotFound
        | LifecycleError::ProfileNotFound
        | LifecycleError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        LifecycleError::DuplicateApplication | LifecycleError::InvalidTransition(_) => {
            StatusCode::CONFLICT
        }
        LifecycleError::Forbidden(_) | LifecycleError::EditLocked(_) => StatusCode::FORBIDDEN,
        LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
