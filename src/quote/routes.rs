//! Quote API route handlers.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::document;
use crate::error::{AppError, Result};
use crate::store::CURRENT_QUOTE_KEY;
use crate::AppState;

use super::calculators::monthly_minimum;
use super::models::{
    QuoteCalculationResult, QuoteSnapshot, BUILDING_TYPES, FLOOR_TYPES, HOURLY_RATE_PRESETS,
    MINUTES_PER_FIXTURE_PRESETS, RUN_RATE_PRESETS, SOIL_LEVELS,
};
use super::requests::QuoteInputs;

/// Form catalogs plus a starter quote for clients rendering the calculator.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub building_types: Vec<&'static str>,
    pub floor_types: Vec<&'static str>,
    pub soil_levels: Vec<&'static str>,
    pub run_rate_presets: Vec<u32>,
    pub hourly_rate_presets: Vec<u32>,
    pub minutes_per_fixture_presets: Vec<Decimal>,
    pub monthly_minimums: BTreeMap<u8, Decimal>,
    pub starter_quote: QuoteInputs,
}

/// Recompute the quote from posted inputs without persisting anything.
pub async fn compute(Json(inputs): Json<QuoteInputs>) -> Json<QuoteCalculationResult> {
    Json(inputs.compute())
}

/// Compute and persist the current quote snapshot.
pub async fn save(
    State(state): State<AppState>,
    Json(inputs): Json<QuoteInputs>,
) -> Result<(StatusCode, Json<QuoteSnapshot>)> {
    let snapshot = inputs.into_snapshot(Utc::now());
    state.store.save(CURRENT_QUOTE_KEY, &snapshot)?;
    tracing::info!(quote_id = %snapshot.quote_id, "quote snapshot saved");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// The saved quote, if any.
pub async fn current(State(state): State<AppState>) -> Result<Json<QuoteSnapshot>> {
    let snapshot: Option<QuoteSnapshot> = state.store.load(CURRENT_QUOTE_KEY)?;
    snapshot.map(Json).ok_or(AppError::NotFound)
}

/// "New quote": drop the saved snapshot and any cached proposal content.
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode> {
    state.store.clear(CURRENT_QUOTE_KEY)?;
    state.cache.invalidate_all();
    tracing::info!("quote snapshot cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// Render the saved quote as a downloadable PDF document.
pub async fn export_document(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let snapshot: QuoteSnapshot = state
        .store
        .load(CURRENT_QUOTE_KEY)?
        .ok_or(AppError::NotFound)?;

    let pdf = document::render_quote_pdf(&snapshot)?;
    let filename = document::document_filename(&snapshot, Utc::now().date_naive());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    let disposition = format!("attachment; filename=\"{filename}\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| AppError::Internal(format!("invalid disposition header: {e}")))?,
    );

    Ok((headers, pdf))
}

/// Catalog constants for the calculator form.
pub async fn catalog() -> Json<CatalogResponse> {
    let monthly_minimums = (1..=5u8).map(|f| (f, monthly_minimum(f))).collect();

    Json(CatalogResponse {
        building_types: BUILDING_TYPES.to_vec(),
        floor_types: FLOOR_TYPES.to_vec(),
        soil_levels: SOIL_LEVELS.to_vec(),
        run_rate_presets: RUN_RATE_PRESETS.to_vec(),
        hourly_rate_presets: HOURLY_RATE_PRESETS.to_vec(),
        minutes_per_fixture_presets: MINUTES_PER_FIXTURE_PRESETS.to_vec(),
        monthly_minimums,
        starter_quote: QuoteInputs::starter(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/quote", post(save).get(current).delete(clear))
        .route("/api/quote/compute", post(compute))
        .route("/api/quote/document", get(export_document))
        .route("/api/catalog", get(catalog))
}
