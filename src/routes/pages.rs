//! Server-rendered quote views.

use std::net::SocketAddr;

use askama::Template;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{Html, Redirect};
use chrono::Utc;

use crate::error::Result;
use crate::proposal::routes::{client_identifier, resolve_content};
use crate::proposal::{fallback_content, ProposalInputs, ProposalSource};
use crate::quote::format_money;
use crate::quote::models::{BillingType, QuoteSnapshot};
use crate::rate_limit::RateLimitDecision;
use crate::store::CURRENT_QUOTE_KEY;
use crate::AppState;

#[derive(Default)]
struct AreaRow {
    name: String,
    sq_ft: String,
    floor_type: String,
    soil_level: String,
    run_rate: String,
    hours: String,
    monthly: String,
}

#[derive(Default)]
struct BathroomRow {
    name: String,
    sq_ft: String,
    floor_type: String,
    soil_level: String,
    run_rate: String,
    fixtures: String,
    minutes: String,
    hours: String,
    monthly: String,
}

#[derive(Default)]
struct ServiceRow {
    name: String,
    billing: String,
    price: String,
}

/// Pre-quote summary template
#[derive(Template, Default)]
#[template(path = "summary.html")]
struct SummaryTemplate {
    has_quote: bool,
    quote_id: String,
    date_created: String,
    contact_name: String,
    business_name: String,
    address: String,
    city_state_zip: String,
    email: String,
    phone: String,
    building_type: String,
    has_building_type: bool,
    total_sq_ft: String,
    frequency: u8,
    hourly_rate: String,
    total_hours: String,
    cost_per_clean: String,
    standard_rows: Vec<AreaRow>,
    standard_total: String,
    sutm_rows: Vec<BathroomRow>,
    sutm_total: String,
    service_rows: Vec<ServiceRow>,
    has_services: bool,
    special_services_total: String,
    subtotal: String,
    minimum_applied: bool,
    minimum_difference: String,
    has_surcharge: bool,
    surcharge: String,
    has_one_time: bool,
    one_time_total: String,
    first_month_total: String,
    monthly_total: String,
}

impl SummaryTemplate {
    fn from_snapshot(snapshot: &QuoteSnapshot) -> Self {
        let calc = &snapshot.calculations;
        let customer = &snapshot.customer_info;

        let standard_rows = calc
            .standard_lines
            .iter()
            .map(|line| AreaRow {
                name: line.area.name.clone(),
                sq_ft: line.sq_ft.round_dp(0).to_string(),
                floor_type: line.area.floor_type.clone(),
                soil_level: line.area.soil_level.clone(),
                run_rate: line.area.run_rate.round_dp(0).to_string(),
                hours: format!("{:.2}", line.hours),
                monthly: format_money(line.monthly_cost),
            })
            .collect();

        let sutm_rows = calc
            .sutm_lines
            .iter()
            .map(|line| BathroomRow {
                name: line.bathroom.name.clone(),
                sq_ft: line.sq_ft.round_dp(0).to_string(),
                floor_type: line.bathroom.floor_type.clone(),
                soil_level: line.bathroom.soil_level.clone(),
                run_rate: line.bathroom.run_rate.round_dp(0).to_string(),
                fixtures: line.bathroom.fixture_count.to_string(),
                minutes: format!("{:.1}", line.bathroom.minutes_per_fixture),
                hours: format!("{:.2}", line.total_hours),
                monthly: format_money(line.monthly_cost),
            })
            .collect();

        let service_rows: Vec<ServiceRow> = snapshot
            .special_services
            .iter()
            .filter(|s| s.checked)
            .map(|s| ServiceRow {
                name: s.name.clone(),
                billing: match s.billing_type {
                    BillingType::Monthly => "Monthly".into(),
                    BillingType::OneTime => "One-time".into(),
                },
                price: format_money(s.price),
            })
            .collect();

        let city_state_zip = [
            snapshot.customer_info.city.trim(),
            snapshot.customer_info.state.trim(),
            snapshot.customer_info.zip.trim(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

        SummaryTemplate {
            has_quote: true,
            quote_id: snapshot.quote_id.clone(),
            date_created: snapshot.date_created.clone(),
            contact_name: customer.display_name(),
            business_name: customer.business_name.clone(),
            address: customer.address.clone(),
            city_state_zip,
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            building_type: snapshot.building_type.clone(),
            has_building_type: !snapshot.building_type.is_empty(),
            total_sq_ft: calc.total_sq_ft.round_dp(0).to_string(),
            frequency: snapshot.frequency_rate.frequency,
            hourly_rate: format_money(snapshot.frequency_rate.hourly_rate),
            total_hours: format!("{:.2}", calc.total_hours),
            cost_per_clean: format_money(calc.cost_per_clean),
            standard_rows,
            standard_total: format_money(calc.standard_total),
            sutm_rows,
            sutm_total: format_money(calc.sutm_total),
            has_services: !service_rows.is_empty(),
            service_rows,
            special_services_total: format_money(calc.special_services_total),
            subtotal: format_money(calc.subtotal),
            minimum_applied: calc.minimum_applied,
            minimum_difference: format_money(calc.minimum_difference),
            has_surcharge: calc.surcharge > rust_decimal::Decimal::ZERO,
            surcharge: format_money(calc.surcharge),
            has_one_time: calc.one_time_total > rust_decimal::Decimal::ZERO,
            one_time_total: format_money(calc.one_time_total),
            first_month_total: format_money(calc.first_month_total),
            monthly_total: format_money(calc.final_total_with_surcharge),
        }
    }
}

/// Proposal view template
#[derive(Template, Default)]
#[template(path = "proposal.html")]
struct ProposalTemplate {
    has_quote: bool,
    quote_id: String,
    date_created: String,
    contact_name: String,
    business_name: String,
    monthly_total: String,
    frequency: u8,
    total_sq_ft: String,
    ai_generated: bool,
    introduction: String,
    service_description: String,
    value_proposition: String,
}

pub async fn index() -> Redirect {
    Redirect::to("/summary")
}

/// Pre-quote summary of the saved snapshot. Renders an empty state when no
/// quote has been saved yet.
pub async fn summary(State(state): State<AppState>) -> Result<Html<String>> {
    let snapshot: Option<QuoteSnapshot> = state.store.load(CURRENT_QUOTE_KEY)?;

    let template = match &snapshot {
        Some(snapshot) => SummaryTemplate::from_snapshot(snapshot),
        None => SummaryTemplate::default(),
    };

    Ok(Html(template.render()?))
}

/// Proposal view. Content comes from the cache or one generation attempt;
/// every failure path (including a missing API key or an exhausted rate
/// window) falls back to the deterministic template so this page never shows
/// a raw error.
pub async fn proposal(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Html<String>> {
    let snapshot: Option<QuoteSnapshot> = state.store.load(CURRENT_QUOTE_KEY)?;

    let Some(snapshot) = snapshot else {
        return Ok(Html(ProposalTemplate::default().render()?));
    };

    let inputs = ProposalInputs::from_snapshot(&snapshot);

    let identifier = client_identifier(&headers, addr);

    let limited = {
        let mut limiter = state
            .limiter
            .lock()
            .map_err(|_| crate::error::AppError::Internal("rate limiter lock poisoned".into()))?;
        matches!(
            limiter.check(&identifier, Utc::now()),
            RateLimitDecision::Limited { .. }
        )
    };

    let (source, content) = if limited {
        (ProposalSource::Fallback, fallback_content(&inputs))
    } else {
        match resolve_content(&state, &inputs).await {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(error = %err, "proposal view falling back to templated content");
                (ProposalSource::Fallback, fallback_content(&inputs))
            }
        }
    };

    let template = ProposalTemplate {
        has_quote: true,
        quote_id: snapshot.quote_id.clone(),
        date_created: snapshot.date_created.clone(),
        contact_name: snapshot.customer_info.display_name(),
        business_name: snapshot.customer_info.business_name.clone(),
        monthly_total: format_money(snapshot.calculations.final_total_with_surcharge),
        frequency: snapshot.frequency_rate.frequency,
        total_sq_ft: snapshot.calculations.total_sq_ft.round_dp(0).to_string(),
        ai_generated: !matches!(source, ProposalSource::Fallback),
        introduction: content.introduction,
        service_description: content.service_description,
        value_proposition: content.value_proposition,
    };

    Ok(Html(template.render()?))
}
