//! Typed fluent constructor for [`FocusCostRecord`] (spec.md §4.2).
//!
//! Direct construction of [`FocusCostRecord`] by consumers is
//! discouraged by design — this builder is the supported constructor.
//! Every `with_*` method is side-effect-free on its argument and
//! commutative with respect to unrelated fields (they just set a
//! field on an owned, moved-through `self`). [`FocusCostRecordBuilder::build`]
//! enforces the mandatory field set and runs the
//! [`crate::ConformanceValidator`], returning its result alongside the
//! record.

use crate::validator::ConformanceValidator;
use costsource_core::error::ValidationError;
use costsource_core::model::{FocusCostRecord, ValidationResult};
use costsource_core::vocabulary::{
    CapacityReservationStatus, ChargeCategory, ChargeClass, ChargeFrequency,
    CommitmentDiscountCategory, CommitmentDiscountStatus, CommitmentDiscountType,
    PricingCategory, ServiceCategory,
};
use costsource_core::{Currency, Money};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Declares a `pub fn $name(mut self, value: $ty) -> Self` setter that
/// assigns into the like-named field of the in-progress record.
macro_rules! setter {
    ($name:ident: impl Into<$ty:ty>) => {
        pub fn $name(mut self, value: impl Into<$ty>) -> Self {
            self.$name = value.into();
            self
        }
    };
    ($name:ident: $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$name = value;
            self
        }
    };
    (opt $name:ident: $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$name = Some(value);
            self
        }
    };
}

#[derive(Debug, Default)]
pub struct FocusCostRecordBuilder {
    billing_account_id: String,
    billing_account_name: String,
    sub_account_id: String,
    sub_account_name: String,
    invoice_id: String,
    invoice_issuer_name: String,

    service_category: ServiceCategory,
    service_name: String,
    service_subcategory: String,
    publisher_name: String,
    provider_name: String,

    charge_category: ChargeCategory,
    charge_class: ChargeClass,
    charge_frequency: ChargeFrequency,
    charge_description: String,
    charge_period_start: Option<DateTime<Utc>>,
    charge_period_end: Option<DateTime<Utc>>,
    billing_period_start: Option<DateTime<Utc>>,
    billing_period_end: Option<DateTime<Utc>>,

    pricing_unit: String,
    pricing_quantity: f64,
    pricing_category: PricingCategory,
    billing_currency: Option<Currency>,
    contracted_cost: Option<Money>,
    list_cost: Option<Money>,
    effective_cost: Option<Money>,
    billed_cost: Option<Money>,
    contracted_unit_price: Option<Money>,
    list_unit_price: Option<Money>,
    usage_quantity: f64,
    usage_unit: String,

    commitment_discount_id: Option<String>,
    commitment_discount_status: CommitmentDiscountStatus,
    commitment_discount_type: CommitmentDiscountType,
    commitment_discount_category: CommitmentDiscountCategory,
    commitment_discount_quantity: Option<f64>,
    commitment_discount_unit: Option<String>,
    capacity_reservation_id: Option<String>,
    capacity_reservation_status: CapacityReservationStatus,
    contract_applied: Option<String>,

    resource_id: String,
    resource_name: String,
    resource_type: String,
    region_id: String,
    region_name: String,
    availability_zone: String,
    tags: HashMap<String, String>,

    extended_columns: HashMap<String, String>,
}

impl FocusCostRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(billing_account_id: impl Into<String>);
    setter!(billing_account_name: impl Into<String>);
    setter!(sub_account_id: impl Into<String>);
    setter!(sub_account_name: impl Into<String>);
    setter!(invoice_id: impl Into<String>);
    setter!(invoice_issuer_name: impl Into<String>);

    setter!(service_category: ServiceCategory);
    setter!(service_name: impl Into<String>);
    setter!(service_subcategory: impl Into<String>);
    setter!(publisher_name: impl Into<String>);
    setter!(provider_name: impl Into<String>);

    setter!(charge_category: ChargeCategory);
    setter!(charge_class: ChargeClass);
    setter!(charge_frequency: ChargeFrequency);
    setter!(charge_description: impl Into<String>);

    pub fn charge_period_start(mut self, value: DateTime<Utc>) -> Self {
        self.charge_period_start = Some(value);
        self
    }

    pub fn charge_period_end(mut self, value: DateTime<Utc>) -> Self {
        self.charge_period_end = Some(value);
        self
    }

    setter!(opt billing_period_start: DateTime<Utc>);
    setter!(opt billing_period_end: DateTime<Utc>);

    setter!(pricing_unit: impl Into<String>);
    setter!(pricing_quantity: f64);
    setter!(pricing_category: PricingCategory);

    pub fn currency(mut self, value: Currency) -> Self {
        self.billing_currency = Some(value);
        self
    }

    pub fn contracted_cost(mut self, value: Money) -> Self {
        self.contracted_cost = Some(value);
        self
    }

    setter!(opt list_cost: Money);
    setter!(opt effective_cost: Money);

    pub fn billed_cost(mut self, value: Money) -> Self {
        self.billed_cost = Some(value);
        self
    }

    setter!(opt contracted_unit_price: Money);
    setter!(opt list_unit_price: Money);
    setter!(usage_quantity: f64);
    setter!(usage_unit: impl Into<String>);

    setter!(opt commitment_discount_id: String);
    setter!(commitment_discount_status: CommitmentDiscountStatus);
    setter!(commitment_discount_type: CommitmentDiscountType);
    setter!(commitment_discount_category: CommitmentDiscountCategory);
    setter!(opt commitment_discount_quantity: f64);
    setter!(opt commitment_discount_unit: String);
    setter!(opt capacity_reservation_id: String);
    setter!(capacity_reservation_status: CapacityReservationStatus);
    setter!(opt contract_applied: String);

    setter!(resource_id: impl Into<String>);
    setter!(resource_name: impl Into<String>);
    setter!(resource_type: impl Into<String>);
    setter!(region_id: impl Into<String>);
    setter!(region_name: impl Into<String>);
    setter!(availability_zone: impl Into<String>);

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Forward-compatibility escape hatch for provider-specific or
    /// pre-standardized FOCUS fields (spec.md §4.2, §9).
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extended_columns.insert(key.into(), value.into());
        self
    }

    /// Reports every missing mandatory field by name, rather than
    /// failing on the first one found (spec.md §4.2, §8).
    fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.billing_account_id.is_empty() {
            missing.push("billing_account_id");
        }
        if self.charge_period_start.is_none() {
            missing.push("charge_period_start");
        }
        if self.charge_period_end.is_none() {
            missing.push("charge_period_end");
        }
        if self.service_category == Default::default() {
            missing.push("service_category");
        }
        if self.service_name.is_empty() {
            missing.push("service_name");
        }
        if self.charge_category == Default::default() {
            missing.push("charge_category");
        }
        if self.pricing_category == Default::default() {
            missing.push("pricing_category");
        }
        if self.billed_cost.is_none() {
            missing.push("billed_cost");
        }
        if self.contracted_cost.is_none() {
            missing.push("contracted_cost");
        }
        let any_cost_nonzero = self.billed_cost.map(|c| !c.is_zero()).unwrap_or(false)
            || self.contracted_cost.map(|c| !c.is_zero()).unwrap_or(false)
            || self.list_cost.map(|c| !c.is_zero()).unwrap_or(false)
            || self.effective_cost.map(|c| !c.is_zero()).unwrap_or(false);
        if any_cost_nonzero && self.billing_currency.is_none() {
            missing.push("currency");
        }
        missing
    }

    /// Constructs the record, enforcing the mandatory field set and
    /// running the [`ConformanceValidator`]. Missing mandatory fields
    /// are a hard error naming every missing field — no partial record
    /// escapes (spec.md §4.2, §8). Conformance rule violations beyond
    /// the mandatory set do not block construction; they surface in
    /// the returned [`ValidationResult`] for the caller to inspect.
    pub fn build(self) -> Result<(FocusCostRecord, ValidationResult), ValidationError> {
        let missing = self.missing_mandatory_fields();
        if !missing.is_empty() {
            return Err(ValidationError::new(
                "mandatory_fields",
                format!("missing mandatory field(s): {}", missing.join(", ")),
            ));
        }

        let record = FocusCostRecord {
            billing_account_id: self.billing_account_id,
            billing_account_name: self.billing_account_name,
            sub_account_id: self.sub_account_id,
            sub_account_name: self.sub_account_name,
            invoice_id: self.invoice_id,
            invoice_issuer_name: self.invoice_issuer_name,
            service_category: self.service_category,
            service_name: self.service_name,
            service_subcategory: self.service_subcategory,
            publisher_name: self.publisher_name,
            provider_name: self.provider_name,
            charge_category: self.charge_category,
            charge_class: self.charge_class,
            charge_frequency: self.charge_frequency,
            charge_description: self.charge_description,
            charge_period_start: self.charge_period_start.expect("checked above"),
            charge_period_end: self.charge_period_end.expect("checked above"),
            billing_period_start: self.billing_period_start,
            billing_period_end: self.billing_period_end,
            pricing_unit: self.pricing_unit,
            pricing_quantity: self.pricing_quantity,
            pricing_category: self.pricing_category,
            billing_currency: self.billing_currency,
            contracted_cost: self.contracted_cost.expect("checked above"),
            list_cost: self.list_cost,
            effective_cost: self.effective_cost,
            billed_cost: self.billed_cost.expect("checked above"),
            contracted_unit_price: self.contracted_unit_price,
            list_unit_price: self.list_unit_price,
            usage_quantity: self.usage_quantity,
            usage_unit: self.usage_unit,
            commitment_discount_id: self.commitment_discount_id,
            commitment_discount_status: self.commitment_discount_status,
            commitment_discount_type: self.commitment_discount_type,
            commitment_discount_category: self.commitment_discount_category,
            commitment_discount_quantity: self.commitment_discount_quantity,
            commitment_discount_unit: self.commitment_discount_unit,
            capacity_reservation_id: self.capacity_reservation_id,
            capacity_reservation_status: self.capacity_reservation_status,
            contract_applied: self.contract_applied,
            resource_id: self.resource_id,
            resource_name: self.resource_name,
            resource_type: self.resource_type,
            region_id: self.region_id,
            region_name: self.region_name,
            availability_zone: self.availability_zone,
            tags: self.tags,
            extended_columns: self.extended_columns,
        };

        let validation = ConformanceValidator::new().validate(&record);
        Ok((record, validation))
    }
}

/// Re-derives a builder from an existing record (the "Disassemble"
/// half of the idempotence law in spec.md §8:
/// `Build(Disassemble(Build(x))) = Build(x)`).
impl From<&FocusCostRecord> for FocusCostRecordBuilder {
    fn from(record: &FocusCostRecord) -> Self {
        let mut builder = FocusCostRecordBuilder::new()
            .billing_account_id(record.billing_account_id.clone())
            .billing_account_name(record.billing_account_name.clone())
            .sub_account_id(record.sub_account_id.clone())
            .sub_account_name(record.sub_account_name.clone())
            .invoice_id(record.invoice_id.clone())
            .invoice_issuer_name(record.invoice_issuer_name.clone())
            .service_category(record.service_category.clone())
            .service_name(record.service_name.clone())
            .service_subcategory(record.service_subcategory.clone())
            .publisher_name(record.publisher_name.clone())
            .provider_name(record.provider_name.clone())
            .charge_category(record.charge_category.clone())
            .charge_class(record.charge_class.clone())
            .charge_frequency(record.charge_frequency.clone())
            .charge_description(record.charge_description.clone())
            .charge_period_start(record.charge_period_start)
            .charge_period_end(record.charge_period_end)
            .pricing_unit(record.pricing_unit.clone())
            .pricing_quantity(record.pricing_quantity)
            .pricing_category(record.pricing_category.clone())
            .contracted_cost(record.contracted_cost)
            .billed_cost(record.billed_cost)
            .usage_quantity(record.usage_quantity)
            .usage_unit(record.usage_unit.clone())
            .commitment_discount_status(record.commitment_discount_status.clone())
            .commitment_discount_type(record.commitment_discount_type.clone())
            .commitment_discount_category(record.commitment_discount_category.clone())
            .capacity_reservation_status(record.capacity_reservation_status.clone())
            .resource_id(record.resource_id.clone())
            .resource_name(record.resource_name.clone())
            .resource_type(record.resource_type.clone())
            .region_id(record.region_id.clone())
            .region_name(record.region_name.clone())
            .availability_zone(record.availability_zone.clone());

        if let Some(currency) = record.billing_currency.clone() {
            builder = builder.currency(currency);
        }
        if let Some(start) = record.billing_period_start {
            builder = builder.billing_period_start(start);
        }
        if let Some(end) = record.billing_period_end {
            builder = builder.billing_period_end(end);
        }
        if let Some(v) = record.list_cost {
            builder = builder.list_cost(v);
        }
        if let Some(v) = record.effective_cost {
            builder = builder.effective_cost(v);
        }
        if let Some(v) = record.contracted_unit_price {
            builder = builder.contracted_unit_price(v);
        }
        if let Some(v) = record.list_unit_price {
            builder = builder.list_unit_price(v);
        }
        if let Some(v) = record.commitment_discount_id.clone() {
            builder = builder.commitment_discount_id(v);
        }
        if let Some(v) = record.commitment_discount_quantity {
            builder = builder.commitment_discount_quantity(v);
        }
        if let Some(v) = record.commitment_discount_unit.clone() {
            builder = builder.commitment_discount_unit(v);
        }
        if let Some(v) = record.capacity_reservation_id.clone() {
            builder = builder.capacity_reservation_id(v);
        }
        if let Some(v) = record.contract_applied.clone() {
            builder = builder.contract_applied(v);
        }
        for (k, v) in &record.tags {
            builder = builder.tag(k.clone(), v.clone());
        }
        for (k, v) in &record.extended_columns {
            builder = builder.with_extension(k.clone(), v.clone());
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costsource_core::vocabulary::{ChargeCategory, PricingCategory, ServiceCategory};

    fn happy_path_builder() -> FocusCostRecordBuilder {
        FocusCostRecordBuilder::new()
            .billing_account_id("123456789012")
            .charge_period_start(Utc::now())
            .charge_period_end(Utc::now())
            .service_category(ServiceCategory::Compute)
            .service_name("Amazon EC2")
            .charge_category(ChargeCategory::Purchase)
            .pricing_category(PricingCategory::Standard)
            .currency(Currency::new("USD").unwrap())
            .contracted_cost(Money::new(7.30).unwrap())
            .billed_cost(Money::new(7.30).unwrap())
    }

    #[test]
    fn build_succeeds_with_all_mandatory_fields() {
        let (record, validation) = happy_path_builder().build().unwrap();
        assert_eq!(record.billing_account_id, "123456789012");
        assert!(validation.valid);
    }

    #[test]
    fn build_fails_naming_every_missing_field() {
        let err = FocusCostRecordBuilder::new().build().unwrap_err();
        assert!(err.message.contains("billing_account_id"));
        assert!(err.message.contains("charge_period_start"));
        assert!(err.message.contains("service_name"));
    }

    #[test]
    fn with_extension_flows_into_extended_columns() {
        let (record, _) = happy_path_builder()
            .with_extension("aws:cur:lineItemId", "li-123")
            .build()
            .unwrap();
        assert_eq!(
            record.extended_columns.get("aws:cur:lineItemId"),
            Some(&"li-123".to_string())
        );
    }

    #[test]
    fn disassemble_then_build_is_idempotent() {
        let (record, _) = happy_path_builder().build().unwrap();
        let (rebuilt, _) = FocusCostRecordBuilder::from(&record).build().unwrap();
        assert_eq!(record, rebuilt);
    }

    #[test]
    fn currency_required_once_any_cost_is_nonzero() {
        let err = FocusCostRecordBuilder::new()
            .billing_account_id("123456789012")
            .charge_period_start(Utc::now())
            .charge_period_end(Utc::now())
            .service_category(ServiceCategory::Compute)
            .service_name("Amazon EC2")
            .charge_category(ChargeCategory::Purchase)
            .pricing_category(PricingCategory::Standard)
            .contracted_cost(Money::new(7.30).unwrap())
            .billed_cost(Money::new(7.30).unwrap())
            .build()
            .unwrap_err();
        assert!(err.message.contains("currency"));
    }
}
