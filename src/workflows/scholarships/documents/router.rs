use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::super::contracts::{NotificationSink, StoreError};
use super::super::identity::Actor;
use super::domain::{DocumentId, VerificationStatus};
use super::repository::DocumentStore;
use super::service::{DocumentReviewError, DocumentVerificationService, UploadRequest};

/// Router builder exposing document registration and review over HTTP.
pub fn document_router<S, N>(service: Arc<DocumentVerificationService<S, N>>) -> Router
where
    S: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/documents", post(register_handler::<S, N>))
        .route("/api/v1/documents/mine", get(mine_handler::<S, N>))
        .route("/api/v1/documents/:id", get(get_handler::<S, N>))
        .route(
            "/api/v1/documents/:id/review",
            post(review_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Deserialize)]
struct ReviewRequest {
    status: VerificationStatus,
    comments: Option<String>,
}

async fn register_handler<S, N>(
    State(service): State<Arc<DocumentVerificationService<S, N>>>,
    actor: Actor,
    Json(request): Json<UploadRequest>,
) -> Response
where
    S: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.register(&actor, request) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => review_error_response(error),
    }
}

async fn review_handler<S, N>(
    State(service): State<Arc<DocumentVerificationService<S, N>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.review(&actor, &DocumentId(id), request.status, request.comments) {
        Ok(record) => Json(record).into_response(),
        Err(error) => review_error_response(error),
    }
}

async fn get_handler<S, N>(
    State(service): State<Arc<DocumentVerificationService<S, N>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.fetch(&actor, &DocumentId(id)) {
        Ok(record) => Json(record).into_response(),
        Err(error) => review_error_response(error),
    }
}

async fn mine_handler<S, N>(
    State(service): State<Arc<DocumentVerificationService<S, N>>>,
    actor: Actor,
) -> Response
where
    S: DocumentStore + 'static,
    N: NotificationSink + 'static,
{
    match service.list_mine(&actor) {
        Ok(records) => Json(records).into_response(),
        Err(error) => review_error_response(error),
    }
}

fn review_error_response(error: DocumentReviewError) -> Response {
    let status = match &error {
        DocumentReviewError::DocumentNotFound | DocumentReviewError::Store(StoreError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        DocumentReviewError::Forbidden(_) => StatusCode::FORBIDDEN,
        DocumentReviewError::InvalidReviewTarget
        | DocumentReviewError::MissingRejectionComment => StatusCode::UNPROCESSABLE_ENTITY,
        DocumentReviewError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
