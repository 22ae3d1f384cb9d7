//! Request DTOs for quote API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculators::compute_quote;
use super::models::{
    default_special_services, format_quote_date, generate_quote_id, CustomerInfo, FrequencyRate,
    QuoteCalculationResult, QuotePhoto, QuoteSnapshot, SpecialService, StandardArea, SutmBathroom,
};

/// Full set of quote inputs as posted by the calculator form. Every field is
/// optional on the wire; omitted sections contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteInputs {
    pub customer_info: CustomerInfo,
    pub building_type: String,
    pub standard_areas: Vec<StandardArea>,
    pub sutm_bathrooms: Vec<SutmBathroom>,
    pub frequency_rate: FrequencyRate,
    pub special_services: Vec<SpecialService>,
    pub photos: Vec<QuotePhoto>,
    pub initial_clean: Option<Decimal>,
}

impl QuoteInputs {
    /// Seed for a brand-new quote: one blank area, one blank bathroom, the
    /// default service menu.
    pub fn starter() -> Self {
        QuoteInputs {
            standard_areas: vec![StandardArea::new()],
            sutm_bathrooms: vec![SutmBathroom::new()],
            special_services: default_special_services(),
            ..QuoteInputs::default()
        }
    }

    /// Recompute the derived result from the current inputs.
    pub fn compute(&self) -> QuoteCalculationResult {
        compute_quote(
            &self.standard_areas,
            &self.sutm_bathrooms,
            &self.special_services,
            self.initial_clean,
            &self.frequency_rate,
        )
    }

    /// Freeze the inputs plus their derived result into a persistable
    /// snapshot stamped at `now`.
    pub fn into_snapshot(self, now: DateTime<Utc>) -> QuoteSnapshot {
        let calculations = self.compute();
        QuoteSnapshot {
            quote_id: generate_quote_id(now),
            date_created: format_quote_date(now),
            customer_info: self.customer_info,
            building_type: self.building_type,
            standard_areas: self.standard_areas,
            sutm_bathrooms: self.sutm_bathrooms,
            frequency_rate: self.frequency_rate,
            special_services: self.special_services,
            photos: self.photos,
            initial_clean: self.initial_clean,
            calculations,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn starter_quote_has_seed_rows() {
        let inputs = QuoteInputs::starter();
        assert_eq!(inputs.standard_areas.len(), 1);
        assert_eq!(inputs.sutm_bathrooms.len(), 1);
        assert_eq!(inputs.special_services.len(), 3);
        assert!(inputs.special_services.iter().all(|s| !s.checked));
    }

    #[test]
    fn snapshot_carries_inputs_and_derived_result() {
        let mut inputs = QuoteInputs::starter();
        inputs.standard_areas[0].manual_entry = true;
        inputs.standard_areas[0].total_sq_ft = dec!(500);
        inputs.standard_areas[0].run_rate = dec!(1000);

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let snapshot = inputs.clone().into_snapshot(now);

        assert_eq!(snapshot.standard_areas, inputs.standard_areas);
        assert_eq!(snapshot.calculations, inputs.compute());
        assert_eq!(snapshot.timestamp, now);
        assert!(snapshot.quote_id.starts_with("IQ-"));
    }

    #[test]
    fn empty_body_deserializes_to_defaults() {
        let inputs: QuoteInputs = serde_json::from_str("{}").unwrap();
        assert!(inputs.standard_areas.is_empty());
        assert_eq!(inputs.frequency_rate.frequency, 3);
    }
}
