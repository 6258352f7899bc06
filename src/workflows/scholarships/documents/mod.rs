//! Upload registration and per-document verification. A document's review
//! state is its own small state machine, consulted during application review
//! but never driving it.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{DocumentId, DocumentKind, DocumentRecord, VerificationStatus};
pub use repository::DocumentStore;
pub use router::document_router;
pub use service::{DocumentReviewError, DocumentVerificationService, UploadRequest};
