//! Core pricing calculation functions.
//!
//! Pure functions for quote math - no storage or HTTP access. Every function
//! here is deterministic and total: absent or non-positive inputs degrade to
//! zero contributions instead of erroring, so the engine can be re-run
//! safely on every form change.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::models::{
    AreaCostLine, BathroomCostLine, BillingType, FrequencyRate, QuoteCalculationResult,
    SpecialService, StandardArea, SutmBathroom,
};

/// Average weeks per month (52/12), expanding a weekly cleaning frequency
/// into a monthly cost multiplier.
pub const WEEKS_PER_MONTH: Decimal = dec!(4.33);

/// Premium applied to 6x/7x weekly service plans.
const SURCHARGE_RATE: Decimal = dec!(0.20);

const MINUTES_PER_HOUR: Decimal = dec!(60);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use ironquote_web::quote::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Dollar string for summaries and documents, e.g. "$585.00".
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", round_money(amount, 2))
}

/// Frequency-indexed minimum monthly billing amount. 6x/7x plans carry no
/// minimum; a lookup miss means no floor.
pub fn monthly_minimum(frequency: u8) -> Decimal {
    match frequency {
        1 => dec!(275),
        2 => dec!(390),
        3 => dec!(585),
        4 => dec!(780),
        5 => dec!(975),
        _ => Decimal::ZERO,
    }
}

/// Cost figures for a single standard area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaCost {
    pub sq_ft: Decimal,
    pub hours: Decimal,
    pub monthly_cost: Decimal,
}

/// Cost figures for a single SUTM bathroom.
#[derive(Debug, Clone, PartialEq)]
pub struct BathroomCost {
    pub sq_ft: Decimal,
    pub area_hours: Decimal,
    pub fixture_hours: Decimal,
    pub total_hours: Decimal,
    pub monthly_cost: Decimal,
}

/// Expand per-clean hours into a monthly dollar figure.
fn monthly_cost(hours: Decimal, rate: &FrequencyRate) -> Decimal {
    hours * Decimal::from(rate.frequency) * WEEKS_PER_MONTH * rate.hourly_rate.max(Decimal::ZERO)
}

/// Cost one standard area.
///
/// An unconfigured run rate (zero or negative) is not an error; the area
/// simply contributes zero hours.
pub fn area_cost(area: &StandardArea, rate: &FrequencyRate) -> AreaCost {
    let sq_ft = area.effective_sq_ft().max(Decimal::ZERO);
    let hours = if sq_ft > Decimal::ZERO && area.run_rate > Decimal::ZERO {
        sq_ft / area.run_rate
    } else {
        Decimal::ZERO
    };

    AreaCost {
        sq_ft,
        hours,
        monthly_cost: monthly_cost(hours, rate),
    }
}

/// Cost one SUTM bathroom: area time plus fixture time, expanded monthly as
/// a single combined hour figure.
pub fn bathroom_cost(bathroom: &SutmBathroom, rate: &FrequencyRate) -> BathroomCost {
    let sq_ft = bathroom.effective_sq_ft().max(Decimal::ZERO);
    let area_hours = if sq_ft > Decimal::ZERO && bathroom.run_rate > Decimal::ZERO {
        sq_ft / bathroom.run_rate
    } else {
        Decimal::ZERO
    };

    let fixture_hours = if bathroom.fixture_count > 0 {
        Decimal::from(bathroom.fixture_count) * bathroom.minutes_per_fixture.max(Decimal::ZERO)
            / MINUTES_PER_HOUR
    } else {
        Decimal::ZERO
    };

    let total_hours = area_hours + fixture_hours;

    BathroomCost {
        sq_ft,
        area_hours,
        fixture_hours,
        total_hours,
        monthly_cost: monthly_cost(total_hours, rate),
    }
}

/// Compute the full quote from the current inputs.
///
/// Rule order is a business rule and fixed: the minimum floor is applied to
/// the recurring subtotal first, then the high-frequency surcharge is applied
/// on top of the floored total. One-time charges (one-time billed services
/// and the initial clean) are tracked separately and never participate in
/// the minimum test or the surcharge base.
pub fn compute_quote(
    areas: &[StandardArea],
    bathrooms: &[SutmBathroom],
    services: &[SpecialService],
    initial_clean: Option<Decimal>,
    rate: &FrequencyRate,
) -> QuoteCalculationResult {
    let standard_lines: Vec<AreaCostLine> = areas
        .iter()
        .map(|area| {
            let cost = area_cost(area, rate);
            AreaCostLine {
                area: area.clone(),
                sq_ft: cost.sq_ft,
                hours: cost.hours,
                monthly_cost: cost.monthly_cost,
            }
        })
        .collect();

    let standard_total: Decimal = standard_lines.iter().map(|l| l.monthly_cost).sum();
    let standard_hours: Decimal = standard_lines.iter().map(|l| l.hours).sum();
    let standard_sq_ft: Decimal = standard_lines.iter().map(|l| l.sq_ft).sum();

    let sutm_lines: Vec<BathroomCostLine> = bathrooms
        .iter()
        .map(|bathroom| {
            let cost = bathroom_cost(bathroom, rate);
            BathroomCostLine {
                bathroom: bathroom.clone(),
                sq_ft: cost.sq_ft,
                area_hours: cost.area_hours,
                fixture_hours: cost.fixture_hours,
                total_hours: cost.total_hours,
                monthly_cost: cost.monthly_cost,
            }
        })
        .collect();

    let sutm_total: Decimal = sutm_lines.iter().map(|l| l.monthly_cost).sum();
    let sutm_hours: Decimal = sutm_lines.iter().map(|l| l.total_hours).sum();
    let sutm_sq_ft: Decimal = sutm_lines.iter().map(|l| l.sq_ft).sum();

    let mut special_services_total = Decimal::ZERO;
    let mut one_time_total = Decimal::ZERO;
    for service in services.iter().filter(|s| s.checked) {
        match service.billing_type {
            BillingType::Monthly => special_services_total += service.price,
            BillingType::OneTime => one_time_total += service.price,
        }
    }
    if let Some(initial) = initial_clean {
        if initial > Decimal::ZERO {
            one_time_total += initial;
        }
    }

    let subtotal = standard_total + sutm_total + special_services_total;

    // Minimum floor first.
    let minimum_required = monthly_minimum(rate.frequency);
    let minimum_applied = subtotal < minimum_required;
    let (final_total, minimum_difference) = if minimum_applied {
        (minimum_required, minimum_required - subtotal)
    } else {
        (subtotal, Decimal::ZERO)
    };

    // Surcharge second, on the floored total.
    let (surcharge, final_total_with_surcharge) = if rate.frequency == 6 || rate.frequency == 7 {
        let surcharge = final_total * SURCHARGE_RATE;
        (surcharge, final_total + surcharge)
    } else {
        (Decimal::ZERO, final_total)
    };

    let total_hours = standard_hours + sutm_hours;
    let total_sq_ft = standard_sq_ft + sutm_sq_ft;
    let cost_per_clean = total_hours * rate.hourly_rate.max(Decimal::ZERO);

    QuoteCalculationResult {
        standard_lines,
        standard_total,
        standard_hours,
        standard_sq_ft,
        sutm_lines,
        sutm_total,
        sutm_hours,
        sutm_sq_ft,
        special_services_total,
        one_time_total,
        subtotal,
        minimum_required,
        minimum_applied,
        minimum_difference,
        final_total,
        surcharge,
        final_total_with_surcharge,
        first_month_total: final_total_with_surcharge + one_time_total,
        total_hours,
        total_sq_ft,
        cost_per_clean,
    }
}
