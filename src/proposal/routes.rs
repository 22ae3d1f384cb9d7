//! Proposal generation endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::rate_limit::RateLimitDecision;
use crate::AppState;

use super::client::ProposalError;
use super::prompt::{fallback_content, ProposalContent, ProposalInputs};

/// Where the proposal content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalSource {
    Generated,
    Cached,
    Fallback,
}

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub success: bool,
    pub source: ProposalSource,
    pub content: ProposalContent,
}

/// Produce proposal content for the given inputs: cached content first, then
/// one generation attempt, then the deterministic fallback. Only a missing
/// API key is surfaced to the caller.
pub(crate) async fn resolve_content(
    state: &AppState,
    inputs: &ProposalInputs,
) -> std::result::Result<(ProposalSource, ProposalContent), ProposalError> {
    if let Some(quote_id) = &inputs.quote_id {
        if let Some(cached) = state.cache.get(quote_id).await {
            return Ok((ProposalSource::Cached, (*cached).clone()));
        }
    }

    match state.anthropic.generate(inputs).await {
        Ok(content) => {
            if let Some(quote_id) = &inputs.quote_id {
                state
                    .cache
                    .insert(quote_id.clone(), Arc::new(content.clone()))
                    .await;
            }
            info!(quote_id = ?inputs.quote_id, "proposal content generated");
            Ok((ProposalSource::Generated, content))
        }
        Err(ProposalError::MissingApiKey) => Err(ProposalError::MissingApiKey),
        Err(err) => {
            warn!(error = %err, "proposal generation failed, using fallback content");
            Ok((ProposalSource::Fallback, fallback_content(inputs)))
        }
    }
}

/// Generate proposal copy for a quote. Rate limited per client; a missing
/// API key is an explicit failure, every other failure degrades to the
/// templated fallback.
pub async fn generate(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(inputs): Json<ProposalInputs>,
) -> Result<Json<ProposalResponse>> {
    let identifier = client_identifier(&headers, addr);

    let decision = {
        let mut limiter = state
            .limiter
            .lock()
            .map_err(|_| AppError::Internal("rate limiter lock poisoned".into()))?;
        limiter.check(&identifier, Utc::now())
    };
    if let RateLimitDecision::Limited { retry_after_secs } = decision {
        warn!(identifier = %identifier, retry_after_secs, "proposal request rate limited");
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let (source, content) = resolve_content(&state, &inputs)
        .await
        .map_err(|_| AppError::ProposalUnconfigured)?;

    Ok(Json(ProposalResponse {
        success: true,
        source,
        content,
    }))
}

/// Client identifier for throttling: the first forwarded address when
/// present, otherwise the peer address.
pub(crate) fn client_identifier(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/proposal", post(generate))
}
