//! Shared test fixtures for this crate's unit tests.

#![cfg(test)]

use chrono::{TimeZone, Utc};
use costsource_core::model::FocusCostRecord;
use costsource_core::vocabulary::{ChargeCategory, PricingCategory, ServiceCategory};
use costsource_core::{Currency, Money};
use std::collections::HashMap;

/// A record that satisfies every mandatory field and every
/// conformance rule — the baseline every negative test mutates one
/// field away from.
pub fn minimal_valid_record() -> FocusCostRecord {
    FocusCostRecord {
        billing_account_id: "123456789012".to_string(),
        billing_account_name: String::new(),
        sub_account_id: String::new(),
        sub_account_name: String::new(),
        invoice_id: String::new(),
        invoice_issuer_name: String::new(),
        service_category: ServiceCategory::Compute,
        service_name: "Amazon EC2".to_string(),
        service_subcategory: String::new(),
        publisher_name: String::new(),
        provider_name: String::new(),
        charge_category: ChargeCategory::Purchase,
        charge_class: Default::default(),
        charge_frequency: Default::default(),
        charge_description: String::new(),
        charge_period_start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        charge_period_end: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        billing_period_start: None,
        billing_period_end: None,
        pricing_unit: String::new(),
        pricing_quantity: 0.0,
        pricing_category: PricingCategory::Standard,
        billing_currency: Some(Currency::new("USD").unwrap()),
        contracted_cost: Money::new(125.50).unwrap(),
        list_cost: None,
        effective_cost: None,
        billed_cost: Money::new(125.50).unwrap(),
        contracted_unit_price: None,
        list_unit_price: None,
        usage_quantity: 0.0,
        usage_unit: String::new(),
        commitment_discount_id: None,
        commitment_discount_status: Default::default(),
        commitment_discount_type: Default::default(),
        commitment_discount_category: Default::default(),
        commitment_discount_quantity: None,
        commitment_discount_unit: None,
        capacity_reservation_id: None,
        capacity_reservation_status: Default::default(),
        contract_applied: None,
        resource_id: String::new(),
        resource_name: String::new(),
        resource_type: String::new(),
        region_id: String::new(),
        region_name: String::new(),
        availability_zone: String::new(),
        tags: HashMap::new(),
        extended_columns: HashMap::new(),
    }
}
