//! Quote domain records.
//!
//! All records are flat serde values owned by a single in-progress quote.
//! Nothing here touches storage or HTTP; the pricing math lives in
//! [`super::calculators`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Building types offered in the calculator form.
pub const BUILDING_TYPES: [&str; 8] = [
    "Office",
    "Medical",
    "Retail",
    "Industrial",
    "School",
    "Church",
    "Restaurant",
    "Other",
];

/// Floor types offered per area.
pub const FLOOR_TYPES: [&str; 7] = [
    "Carpet",
    "Tile",
    "VCT",
    "Concrete",
    "Hardwood",
    "Laminate",
    "Other",
];

pub const SOIL_LEVELS: [&str; 3] = ["Light", "Medium", "Heavy"];

/// Run-rate presets (square feet cleanable per labor hour).
pub const RUN_RATE_PRESETS: [u32; 13] = [
    250, 500, 750, 1000, 1250, 1500, 1750, 2000, 2500, 3000, 4000, 5000, 6000,
];

pub const HOURLY_RATE_PRESETS: [u32; 10] = [20, 22, 25, 27, 30, 32, 35, 40, 45, 50];

pub const MINUTES_PER_FIXTURE_PRESETS: [Decimal; 6] = [
    dec!(2.5),
    dec!(3.0),
    dec!(3.5),
    dec!(4.0),
    dec!(4.5),
    dec!(5.0),
];

/// Customer contact details captured on the calculator form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub business_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
}

impl CustomerInfo {
    /// Contact name, falling back to the business name when blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.business_name.clone()
        } else {
            full.to_string()
        }
    }
}

/// One standard cleanable area (lobby, hallway, office floor, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardArea {
    pub id: String,
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    /// Authoritative square footage when `manual_entry` is set; otherwise the
    /// rectangle dimensions govern and this field is display state only.
    pub total_sq_ft: Decimal,
    pub manual_entry: bool,
    pub floor_type: String,
    pub soil_level: String,
    /// Square feet cleanable per labor hour. Zero means "not yet configured"
    /// and the area contributes zero hours.
    pub run_rate: Decimal,
}

impl Default for StandardArea {
    fn default() -> Self {
        StandardArea {
            id: String::new(),
            name: String::new(),
            length: Decimal::ZERO,
            width: Decimal::ZERO,
            total_sq_ft: Decimal::ZERO,
            manual_entry: false,
            floor_type: String::new(),
            soil_level: String::new(),
            run_rate: dec!(1000),
        }
    }
}

impl StandardArea {
    /// Fresh blank row with a generated id, as seeded on the calculator form.
    pub fn new() -> Self {
        StandardArea {
            id: Uuid::new_v4().to_string(),
            ..StandardArea::default()
        }
    }

    /// Square footage used for costing.
    pub fn effective_sq_ft(&self) -> Decimal {
        if self.manual_entry {
            self.total_sq_ft
        } else {
            self.length * self.width
        }
    }
}

/// A bathroom cleaned under the SUTM discipline: area time plus per-fixture
/// time for sinks, urinals, toilets and mirrors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SutmBathroom {
    pub id: String,
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    pub total_sq_ft: Decimal,
    pub manual_entry: bool,
    pub floor_type: String,
    pub soil_level: String,
    pub run_rate: Decimal,
    pub fixture_count: u32,
    pub minutes_per_fixture: Decimal,
}

impl Default for SutmBathroom {
    fn default() -> Self {
        SutmBathroom {
            id: String::new(),
            name: String::new(),
            length: Decimal::ZERO,
            width: Decimal::ZERO,
            total_sq_ft: Decimal::ZERO,
            manual_entry: false,
            floor_type: String::new(),
            soil_level: String::new(),
            run_rate: dec!(800),
            fixture_count: 0,
            minutes_per_fixture: dec!(3.0),
        }
    }
}

impl SutmBathroom {
    /// Fresh blank row with a generated id.
    pub fn new() -> Self {
        SutmBathroom {
            id: Uuid::new_v4().to_string(),
            ..SutmBathroom::default()
        }
    }

    pub fn effective_sq_ft(&self) -> Decimal {
        if self.manual_entry {
            self.total_sq_ft
        } else {
            self.length * self.width
        }
    }
}

/// Cleaning frequency (visits per week, 1..=7) and labor rate, applied
/// globally to all area and bathroom time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRate {
    pub frequency: u8,
    pub hourly_rate: Decimal,
}

impl Default for FrequencyRate {
    fn default() -> Self {
        FrequencyRate {
            frequency: 3,
            hourly_rate: dec!(30),
        }
    }
}

/// Which total bucket a special service lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillingType {
    /// Recurs every month; counts toward the subtotal and minimum test.
    #[default]
    Monthly,
    /// Charged once; always additive, never minimum- or surcharge-eligible.
    OneTime,
}

/// An optional add-on service (carpet cleaning, window cleaning, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialService {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub checked: bool,
    // Snapshots written before billing types existed omit this field.
    #[serde(default)]
    pub billing_type: BillingType,
}

impl SpecialService {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        SpecialService {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price,
            checked: false,
            billing_type: BillingType::Monthly,
        }
    }
}

/// Default service menu seeded on a fresh quote.
pub fn default_special_services() -> Vec<SpecialService> {
    vec![
        SpecialService::new("Carpet Cleaning", dec!(75)),
        SpecialService::new("Window Cleaning", dec!(150)),
        SpecialService::new("Floor Stripping & Waxing", dec!(200)),
    ]
}

/// A walkthrough photo attached to the quote, carried as a base64 data URL
/// and rendered on the exported document's photo grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotePhoto {
    pub id: String,
    #[serde(default)]
    pub caption: String,
    pub data_url: String,
}

/// A costed standard area: the input record plus its derived figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCostLine {
    #[serde(flatten)]
    pub area: StandardArea,
    pub sq_ft: Decimal,
    pub hours: Decimal,
    pub monthly_cost: Decimal,
}

/// A costed SUTM bathroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BathroomCostLine {
    #[serde(flatten)]
    pub bathroom: SutmBathroom,
    pub sq_ft: Decimal,
    pub area_hours: Decimal,
    pub fixture_hours: Decimal,
    pub total_hours: Decimal,
    pub monthly_cost: Decimal,
}

/// Everything derived from the quote inputs. Wholly recomputed by
/// [`super::calculators::compute_quote`] on every change; never partially
/// mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteCalculationResult {
    pub standard_lines: Vec<AreaCostLine>,
    pub standard_total: Decimal,
    pub standard_hours: Decimal,
    pub standard_sq_ft: Decimal,

    pub sutm_lines: Vec<BathroomCostLine>,
    pub sutm_total: Decimal,
    pub sutm_hours: Decimal,
    pub sutm_sq_ft: Decimal,

    /// Checked, monthly-billed services only.
    pub special_services_total: Decimal,
    /// Checked one-time services plus any initial clean. Additive; excluded
    /// from the minimum-floor test and the surcharge base.
    pub one_time_total: Decimal,

    pub subtotal: Decimal,
    pub minimum_required: Decimal,
    pub minimum_applied: bool,
    pub minimum_difference: Decimal,
    pub final_total: Decimal,
    pub surcharge: Decimal,
    pub final_total_with_surcharge: Decimal,
    /// Recurring monthly total plus one-time charges.
    pub first_month_total: Decimal,

    pub total_hours: Decimal,
    pub total_sq_ft: Decimal,
    /// Single-visit labor cost; independent of frequency and surcharge.
    pub cost_per_clean: Decimal,
}

/// The persisted quote: inputs plus the derived calculation, written as one
/// JSON blob under a single well-known storage key. No schema version field;
/// readers tolerate missing optional fields via serde defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub quote_id: String,
    /// Human-readable creation date, e.g. "August 5, 2026".
    pub date_created: String,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub building_type: String,
    #[serde(default)]
    pub standard_areas: Vec<StandardArea>,
    #[serde(default)]
    pub sutm_bathrooms: Vec<SutmBathroom>,
    #[serde(default)]
    pub frequency_rate: FrequencyRate,
    #[serde(default)]
    pub special_services: Vec<SpecialService>,
    #[serde(default)]
    pub photos: Vec<QuotePhoto>,
    #[serde(default)]
    pub initial_clean: Option<Decimal>,
    #[serde(default)]
    pub calculations: QuoteCalculationResult,
    pub timestamp: DateTime<Utc>,
}

/// Quote identifier: "IQ-" plus the last 8 digits of the unix-millis
/// timestamp.
pub fn generate_quote_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let tail = &millis[millis.len().saturating_sub(8)..];
    format!("IQ-{tail}")
}

/// Long-form creation date shown on summaries and documents.
pub fn format_quote_date(now: DateTime<Utc>) -> String {
    now.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quote_id_uses_last_eight_timestamp_digits() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let id = generate_quote_id(now);
        assert!(id.starts_with("IQ-"));
        assert_eq!(id.len(), 11);
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn quote_date_is_human_readable() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_quote_date(now), "March 1, 2026");
    }

    #[test]
    fn effective_sq_ft_prefers_manual_entry() {
        let mut area = StandardArea::new();
        area.length = dec!(20);
        area.width = dec!(25);
        assert_eq!(area.effective_sq_ft(), dec!(500));

        area.manual_entry = true;
        area.total_sq_ft = dec!(750);
        assert_eq!(area.effective_sq_ft(), dec!(750));
    }

    #[test]
    fn billing_type_round_trips_kebab_case() {
        let json = serde_json::to_string(&BillingType::OneTime).unwrap();
        assert_eq!(json, "\"one-time\"");
        let back: BillingType = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(back, BillingType::Monthly);
    }

    #[test]
    fn service_without_billing_type_defaults_to_monthly() {
        let json = r#"{"id":"1","name":"Window Cleaning","price":"150","checked":true}"#;
        let service: SpecialService = serde_json::from_str(json).unwrap();
        assert_eq!(service.billing_type, BillingType::Monthly);
    }

    #[test]
    fn older_snapshot_without_optional_fields_still_loads() {
        // No photos, no initial_clean, no calculations.
        let json = r#"{
            "quote_id": "IQ-12345678",
            "date_created": "March 1, 2026",
            "frequency_rate": {"frequency": 3, "hourly_rate": "30"},
            "timestamp": "2026-03-01T12:00:00Z"
        }"#;
        let snapshot: QuoteSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.photos.is_empty());
        assert!(snapshot.initial_clean.is_none());
        assert_eq!(snapshot.calculations.subtotal, Decimal::ZERO);
    }
}
