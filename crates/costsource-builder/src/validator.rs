//! Conformance Validator (spec.md §4.3): FOCUS 1.2 business-rule
//! checks beyond the builder's structural presence checks.
//!
//! Unlike the server runtime (spec.md §7, "the runtime does not
//! aggregate"), the validator collects every violation instead of
//! failing fast on the first one, so a caller sees the complete list
//! of problems in one pass.

use chrono::{DateTime, TimeZone, Utc};
use costsource_core::model::{FocusCostRecord, ValidationResult};
use costsource_core::vocabulary::ChargeCategory;

/// Fields a record must supply per spec.md §4.2. `currency` is only
/// mandatory when some cost field is non-zero, so it is checked
/// separately inside [`ConformanceValidator::validate`] rather than
/// listed here.
pub const MANDATORY_FIELDS: &[&str] = &[
    "billing_account_id",
    "charge_period_start",
    "charge_period_end",
    "service_category",
    "service_name",
    "charge_category",
    "pricing_category",
    "billed_cost",
    "contracted_cost",
];

/// Charge categories under which a negative cost is semantically
/// meaningful (spec.md §4.3 rule 5).
const CATEGORIES_ALLOWING_NEGATIVE_COST: &[ChargeCategory] = &[
    ChargeCategory::Credit,
    ChargeCategory::Refund,
    ChargeCategory::Adjustment,
];

fn epoch_floor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).single().unwrap()
}

/// Structural + business-rule checks for a constructed
/// [`FocusCostRecord`] (spec.md §4.3).
#[derive(Debug, Default)]
pub struct ConformanceValidator;

impl ConformanceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Runs all 7 rules from spec.md §4.3 and returns the aggregated
    /// result. Never panics; every violation becomes an entry in
    /// `errors` or `warnings`.
    pub fn validate(&self, record: &FocusCostRecord) -> ValidationResult {
        let mut result = ValidationResult::ok();

        self.check_mandatory_fields(record, &mut result);
        self.check_charge_period(record, &mut result);
        self.check_currency(record, &mut result);
        self.check_usage_quantity(record, &mut result);
        self.check_cost_sign(record, &mut result);
        self.check_enum_unspecified(record, &mut result);
        self.check_commitment_and_capacity_pairs(record, &mut result);

        result
    }

    fn check_mandatory_fields(&self, record: &FocusCostRecord, result: &mut ValidationResult) {
        let mut missing = Vec::new();
        if record.billing_account_id.is_empty() {
            missing.push("billing_account_id");
        }
        if record.service_name.is_empty() {
            missing.push("service_name");
        }
        if record.service_category == Default::default() {
            missing.push("service_category");
        }
        if record.charge_category == Default::default() {
            missing.push("charge_category");
        }
        if record.pricing_category == Default::default() {
            missing.push("pricing_category");
        }
        if !missing.is_empty() {
            result.push_error(format!(
                "missing mandatory field(s): {}",
                missing.join(", ")
            ));
        }
    }

    fn check_charge_period(&self, record: &FocusCostRecord, result: &mut ValidationResult) {
        if record.charge_period_start > record.charge_period_end {
            result.push_error(format!(
                "charge_period_start ({}) must be <= charge_period_end ({})",
                record.charge_period_start, record.charge_period_end
            ));
        }
        let floor = epoch_floor();
        if record.charge_period_start < floor || record.charge_period_end < floor {
            result.push_error("charge period must fall after the Unix epoch (1970-01-01T00:00:00Z)");
        }
    }

    fn check_currency(&self, record: &FocusCostRecord, result: &mut ValidationResult) {
        let any_cost_nonzero = !record.billed_cost.is_zero()
            || !record.contracted_cost.is_zero()
            || record.list_cost.map(|c| !c.is_zero()).unwrap_or(false)
            || record.effective_cost.map(|c| !c.is_zero()).unwrap_or(false);

        if any_cost_nonzero && record.billing_currency.is_none() {
            result.push_error("currency is required whenever any cost field is non-zero");
        }
    }

    fn check_usage_quantity(&self, record: &FocusCostRecord, result: &mut ValidationResult) {
        if record.charge_category == ChargeCategory::Usage && record.usage_quantity <= 0.0 {
            result.push_error("usage_quantity must be > 0 when charge_category is Usage");
        }
    }

    fn check_cost_sign(&self, record: &FocusCostRecord, result: &mut ValidationResult) {
        // Money already guarantees finiteness; only the sign semantics remain to check.
        if record.billed_cost.value() < 0.0
            && !CATEGORIES_ALLOWING_NEGATIVE_COST.contains(&record.charge_category)
        {
            result.push_error(format!(
                "billed_cost is negative ({}) but charge_category ({}) does not permit it",
                record.billed_cost, record.charge_category
            ));
        }
    }

    fn check_enum_unspecified(&self, record: &FocusCostRecord, result: &mut ValidationResult) {
        // Mandatory-slot enums already surface as errors via check_mandatory_fields
        // when left at their zero value; here we only warn for conditional slots.
        if record.commitment_discount_category == Default::default()
            && record.commitment_discount_id.is_some()
        {
            result.push_warning("commitment_discount_category is unspecified on a record with a commitment_discount_id");
        }
    }

    fn check_commitment_and_capacity_pairs(
        &self,
        record: &FocusCostRecord,
        result: &mut ValidationResult,
    ) {
        if record.commitment_discount_id.is_some()
            && record.commitment_discount_status == Default::default()
        {
            result.push_error(
                "commitment_discount_status must be set when commitment_discount_id is present",
            );
        }
        if record.capacity_reservation_id.is_some()
            && record.capacity_reservation_status == Default::default()
        {
            result.push_error(
                "capacity_reservation_status must be set when capacity_reservation_id is present",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::minimal_valid_record;

    #[test]
    fn minimal_valid_record_passes() {
        let record = minimal_valid_record();
        let result = ConformanceValidator::new().validate(&record);
        assert!(result.valid, "errors: {:?}", result.errors);
        assert!(result.bypasses.is_empty());
    }

    #[test]
    fn usage_without_quantity_fails() {
        let mut record = minimal_valid_record();
        record.charge_category = ChargeCategory::Usage;
        record.usage_quantity = 0.0;
        let result = ConformanceValidator::new().validate(&record);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("usage_quantity")));
    }

    #[test]
    fn reversed_charge_period_fails() {
        use chrono::Duration;
        let mut record = minimal_valid_record();
        record.charge_period_end = record.charge_period_start - Duration::days(1);
        let result = ConformanceValidator::new().validate(&record);
        assert!(!result.valid);
    }

    #[test]
    fn negative_cost_allowed_for_credit() {
        let mut record = minimal_valid_record();
        record.charge_category = ChargeCategory::Credit;
        record.billed_cost = costsource_core::Money::new(-10.0).unwrap();
        let result = ConformanceValidator::new().validate(&record);
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn negative_cost_rejected_for_usage() {
        let mut record = minimal_valid_record();
        record.billed_cost = costsource_core::Money::new(-10.0).unwrap();
        let result = ConformanceValidator::new().validate(&record);
        assert!(!result.valid);
    }

    #[test]
    fn commitment_id_without_status_fails() {
        let mut record = minimal_valid_record();
        record.commitment_discount_id = Some("ri-123".to_string());
        let result = ConformanceValidator::new().validate(&record);
        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("commitment_discount_status")));
    }
}
