//! Prompt assembly and deterministic fallback copy for sales proposals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::quote::format_money;
use crate::quote::models::{CustomerInfo, QuoteSnapshot};

/// Name the proposal copy is written under.
pub const COMPANY_NAME: &str = "IronClean Services";

/// The facts the proposal is drafted from. Comes either from the client
/// (API) or from the saved snapshot (proposal view).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalInputs {
    pub customer_info: CustomerInfo,
    pub building_type: String,
    pub total_sq_ft: Decimal,
    pub frequency: u8,
    pub monthly_total: Decimal,
    /// Cache key for generated content, when the quote has been saved.
    pub quote_id: Option<String>,
}

impl ProposalInputs {
    pub fn from_snapshot(snapshot: &QuoteSnapshot) -> Self {
        ProposalInputs {
            customer_info: snapshot.customer_info.clone(),
            building_type: snapshot.building_type.clone(),
            total_sq_ft: snapshot.calculations.total_sq_ft,
            frequency: snapshot.frequency_rate.frequency,
            monthly_total: snapshot.calculations.final_total_with_surcharge,
            quote_id: Some(snapshot.quote_id.clone()),
        }
    }

    fn facility(&self) -> String {
        if self.building_type.is_empty() {
            "commercial".to_string()
        } else {
            self.building_type.to_lowercase()
        }
    }

    fn greeting_name(&self) -> String {
        let name = self.customer_info.display_name();
        if name.is_empty() {
            "Valued Customer".to_string()
        } else {
            name
        }
    }
}

/// Build the structured prompt sent to the text-generation API. The model is
/// asked for a JSON object with exactly three string sections.
pub fn build_prompt(inputs: &ProposalInputs) -> String {
    format!(
        r#"You are a professional proposal writer for a commercial cleaning company called {company}.

Generate professional proposal content for the following cleaning project:

Customer: {first} {last}
Business: {business}
Facility Type: {facility}
Total Square Feet: {sq_ft}
Cleaning Frequency: {frequency}x per week
Monthly Investment: {monthly}

Please provide three sections:

1. INTRODUCTION (2-3 sentences): A warm, professional greeting and thank you for considering our services. Mention their specific facility type and our relevant expertise.

2. SERVICE DESCRIPTION (2-3 sentences): Describe the cleaning services we'll provide, emphasizing the frequency, coverage area, and our professional approach. Mention our healthcare cleaning certification if it's a medical facility.

3. VALUE PROPOSITION (2-3 sentences): Explain why they should choose {company} - mention our experience, certifications, quality standards, and commitment to creating healthy environments.

Write in a professional but approachable tone. Be specific about their facility. Keep each section concise and compelling.

Format your response as JSON with these exact keys:
{{
  "introduction": "...",
  "serviceDescription": "...",
  "valueProposition": "..."
}}

IMPORTANT: Respond ONLY with valid JSON. Do not include any text before or after the JSON object."#,
        company = COMPANY_NAME,
        first = inputs.customer_info.first_name,
        last = inputs.customer_info.last_name,
        business = inputs.customer_info.business_name,
        facility = inputs.building_type,
        sq_ft = inputs.total_sq_ft.round_dp(0),
        frequency = inputs.frequency,
        monthly = format_money(inputs.monthly_total),
    )
}

/// The three proposal sections. Field names follow the wire contract of the
/// generation API ("serviceDescription", "valueProposition").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalContent {
    pub introduction: String,
    pub service_description: String,
    pub value_proposition: String,
}

/// Deterministic templated proposal built from the same inputs as the
/// prompt. Used whenever the external call fails so the user-visible
/// proposal is never empty.
pub fn fallback_content(inputs: &ProposalInputs) -> ProposalContent {
    let business = if inputs.customer_info.business_name.is_empty() {
        "your facility".to_string()
    } else {
        inputs.customer_info.business_name.clone()
    };

    let introduction = format!(
        "Dear {name},\n\nThank you for considering {company} for your commercial cleaning \
         needs at {business}. We are pleased to present this comprehensive proposal for \
         professional cleaning services.",
        name = inputs.greeting_name(),
        company = COMPANY_NAME,
        business = business,
    );

    let service_description = format!(
        "Our team will provide thorough cleaning services {frequency} times per week, \
         covering {sq_ft} square feet of your {facility} facility. We use industry-leading \
         techniques and eco-friendly products to ensure a pristine environment.",
        frequency = inputs.frequency,
        sq_ft = inputs.total_sq_ft.round_dp(0),
        facility = inputs.facility(),
    );

    let value_proposition = if inputs.building_type == "Medical" {
        format!(
            "With healthcare cleaning certification and years of experience in medical \
             facilities, {COMPANY_NAME} maintains the highest standards of cleanliness and \
             safety. Our trained professionals follow strict protocols to create a healthy \
             environment for your staff and patients."
        )
    } else {
        format!(
            "With years of experience, trained and vetted crews, and documented quality \
             standards, {COMPANY_NAME} is committed to creating a clean, healthy environment \
             for your staff and visitors. Every visit is backed by our satisfaction guarantee."
        )
    };

    ProposalContent {
        introduction,
        service_description,
        value_proposition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inputs() -> ProposalInputs {
        ProposalInputs {
            customer_info: CustomerInfo {
                first_name: "John".into(),
                last_name: "Smith".into(),
                business_name: "Smith Medical Center".into(),
                ..CustomerInfo::default()
            },
            building_type: "Medical".into(),
            total_sq_ft: dec!(1450),
            frequency: 3,
            monthly_total: dec!(585),
            quote_id: Some("IQ-12345678".into()),
        }
    }

    #[test]
    fn prompt_carries_all_quote_facts() {
        let prompt = build_prompt(&inputs());
        assert!(prompt.contains("John Smith"));
        assert!(prompt.contains("Smith Medical Center"));
        assert!(prompt.contains("Medical"));
        assert!(prompt.contains("1450"));
        assert!(prompt.contains("3x per week"));
        assert!(prompt.contains("$585.00"));
        assert!(prompt.contains("\"serviceDescription\""));
        assert!(prompt.contains("\"valueProposition\""));
    }

    #[test]
    fn fallback_is_deterministic_and_never_empty() {
        let a = fallback_content(&inputs());
        let b = fallback_content(&inputs());
        assert_eq!(a, b);
        assert!(!a.introduction.is_empty());
        assert!(!a.service_description.is_empty());
        assert!(!a.value_proposition.is_empty());
    }

    #[test]
    fn fallback_mentions_the_facility_facts() {
        let content = fallback_content(&inputs());
        assert!(content.introduction.contains("Smith Medical Center"));
        assert!(content.service_description.contains("3 times per week"));
        assert!(content.service_description.contains("1450 square feet"));
        assert!(content.service_description.contains("medical facility"));
    }

    #[test]
    fn fallback_tolerates_blank_customer() {
        let content = fallback_content(&ProposalInputs::default());
        assert!(content.introduction.contains("Valued Customer"));
        assert!(content.introduction.contains("your facility"));
        assert!(content.service_description.contains("commercial facility"));
    }

    #[test]
    fn medical_facilities_get_the_certification_pitch() {
        let medical = fallback_content(&inputs());
        assert!(medical.value_proposition.contains("healthcare"));

        let mut office = inputs();
        office.building_type = "Office".into();
        let general = fallback_content(&office);
        assert!(!general.value_proposition.contains("patients"));
    }
}
