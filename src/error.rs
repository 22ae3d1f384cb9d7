//! Error handling for the application

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::store::StoreError),

    #[error("Document error: {0}")]
    Document(#[from] crate::document::DocumentError),

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("API key not configured")]
    ProposalUnconfigured,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Template(e) => {
                tracing::error!("Template error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error")
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
            }
            AppError::Document(e) => {
                tracing::error!("Document error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Document error")
            }
            AppError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            AppError::ProposalUnconfigured => {
                tracing::error!("Proposal generation requested without an API key");
                (StatusCode::INTERNAL_SERVER_ERROR, "API key not configured")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        let mut response =
            (status, Json(json!({ "success": false, "error": message }))).into_response();

        if let AppError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
