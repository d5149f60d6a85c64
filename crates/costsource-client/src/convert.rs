//! Proto ⇄ domain conversion for the client's response types
//! (mirrors costsource-server's `convert.rs`, in the opposite
//! direction: decoding responses rather than adapting a handler).

use crate::types::{Budget, ProjectedCost, SupportsOutcome};
use costsource_core::error::{CostSourceError, Result};
use costsource_core::model::{FocusCostRecord, PluginInfo, Recommendation, ResourceDescriptor};
use costsource_core::vocabulary::{
    Capability, CapacityReservationStatus, ChargeCategory, ChargeClass, ChargeFrequency,
    CommitmentDiscountCategory, CommitmentDiscountStatus, CommitmentDiscountType, PricingCategory,
    RecommendationActionType, RecommendationCategory, ServiceCategory,
};
use costsource_core::{Currency, Money};
use costsource_proto::costsource as proto;
use chrono::{DateTime, Utc};

fn parse_rfc3339(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CostSourceError::Internal(format!("server returned a malformed `{field}`: {e}")))
}

fn money(value: f64) -> Result<Money> {
    Money::new(value).map_err(CostSourceError::Validation)
}

pub fn resource_to_proto(r: &ResourceDescriptor) -> proto::ResourceDescriptor {
    proto::ResourceDescriptor {
        provider: r.provider.clone(),
        resource_type: r.resource_type.clone(),
        region: r.region.clone(),
        tags: r.tags.clone(),
        canonical_id: r.canonical_id.clone(),
    }
}

fn resource_from_proto(r: proto::ResourceDescriptor) -> ResourceDescriptor {
    ResourceDescriptor {
        provider: r.provider,
        resource_type: r.resource_type,
        region: r.region,
        tags: r.tags,
        canonical_id: r.canonical_id,
    }
}

pub fn record_from_proto(r: proto::CostRecord) -> Result<FocusCostRecord> {
    Ok(FocusCostRecord {
        billing_account_id: r.billing_account_id,
        billing_account_name: r.billing_account_name,
        sub_account_id: r.sub_account_id,
        sub_account_name: r.sub_account_name,
        invoice_id: r.invoice_id,
        invoice_issuer_name: r.invoice_issuer_name,
        service_category: ServiceCategory::parse(&r.service_category),
        service_name: r.service_name,
        service_subcategory: r.service_subcategory,
        publisher_name: r.publisher_name,
        provider_name: r.provider_name,
        charge_category: ChargeCategory::parse(&r.charge_category),
        charge_class: ChargeClass::parse(&r.charge_class),
        charge_frequency: ChargeFrequency::parse(&r.charge_frequency),
        charge_description: r.charge_description,
        charge_period_start: parse_rfc3339(&r.charge_period_start, "charge_period_start")?,
        charge_period_end: parse_rfc3339(&r.charge_period_end, "charge_period_end")?,
        billing_period_start: r
            .billing_period_start
            .map(|s| parse_rfc3339(&s, "billing_period_start"))
            .transpose()?,
        billing_period_end: r
            .billing_period_end
            .map(|s| parse_rfc3339(&s, "billing_period_end"))
            .transpose()?,
        pricing_unit: r.pricing_unit,
        pricing_quantity: r.pricing_quantity,
        pricing_category: PricingCategory::parse(&r.pricing_category),
        billing_currency: r.billing_currency.map(Currency::new).transpose().map_err(CostSourceError::Validation)?,
        contracted_cost: money(r.contracted_cost)?,
        list_cost: r.list_cost.map(money).transpose()?,
        effective_cost: r.effective_cost.map(money).transpose()?,
        billed_cost: money(r.billed_cost)?,
        contracted_unit_price: r.contracted_unit_price.map(money).transpose()?,
        list_unit_price: r.list_unit_price.map(money).transpose()?,
        usage_quantity: r.usage_quantity,
        usage_unit: r.usage_unit,
        commitment_discount_id: r.commitment_discount_id,
        commitment_discount_status: CommitmentDiscountStatus::parse(&r.commitment_discount_status),
        commitment_discount_type: CommitmentDiscountType::parse(&r.commitment_discount_type),
        commitment_discount_category: CommitmentDiscountCategory::parse(&r.commitment_discount_category),
        commitment_discount_quantity: r.commitment_discount_quantity,
        commitment_discount_unit: r.commitment_discount_unit,
        capacity_reservation_id: r.capacity_reservation_id,
        capacity_reservation_status: CapacityReservationStatus::parse(&r.capacity_reservation_status),
        contract_applied: r.contract_applied,
        resource_id: r.resource_id,
        resource_name: r.resource_name,
        resource_type: r.resource_type,
        region_id: r.region_id,
        region_name: r.region_name,
        availability_zone: r.availability_zone,
        tags: r.tags,
        extended_columns: r.extended_columns,
    })
}

pub fn recommendation_from_proto(r: proto::Recommendation) -> Result<Recommendation> {
    let target = r
        .resource_target
        .ok_or_else(|| CostSourceError::Internal("recommendation missing resource_target".to_string()))?;
    Ok(Recommendation {
        id: r.id,
        category: RecommendationCategory::parse(&r.category),
        action_type: RecommendationActionType::parse(&r.action_type),
        resource_target: resource_from_proto(target),
        estimated_savings: money(r.estimated_savings)?,
        confidence_score: r.confidence_score,
        description: r.description,
        source: r.source,
        metadata: r.metadata,
    })
}

pub fn budget_from_proto(b: proto::Budget) -> Result<Budget> {
    Ok(Budget {
        id: b.id,
        name: b.name,
        amount: money(b.amount)?,
        currency: Currency::new(b.currency).map_err(CostSourceError::Validation)?,
        actual_spend: money(b.actual_spend)?,
    })
}

pub fn projected_cost_from_proto(p: proto::GetProjectedCostResponse) -> Result<ProjectedCost> {
    Ok(ProjectedCost {
        unit_price: money(p.unit_price)?,
        currency: Currency::new(p.currency).map_err(CostSourceError::Validation)?,
        monthly_cost: money(p.monthly_cost)?,
        pricing_category: PricingCategory::parse(&p.pricing_category),
        spot_interruption_risk: p.spot_interruption_risk,
    })
}

pub fn supports_outcome_from_proto(r: proto::SupportsResponse) -> SupportsOutcome {
    SupportsOutcome {
        supported: r.supported,
        reason: r.reason,
        capabilities: r.capabilities.iter().map(|s| Capability::parse(s)).collect(),
        legacy_capability_map: r.legacy_capability_map,
    }
}

pub fn plugin_info_from_proto(r: proto::GetPluginInfoResponse) -> PluginInfo {
    PluginInfo {
        name: r.name,
        implementation_version: r.implementation_version,
        spec_version: r.spec_version,
        providers: r.providers,
        metadata: r.metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_service_category_survives_the_wire() {
        let mut record = proto::CostRecord::default();
        record.billing_account_id = "acct-1".into();
        record.invoice_issuer_name = "Acme".into();
        record.service_category = "quantum-compute".into();
        record.service_name = "Quantum Engine".into();
        record.charge_category = "usage".into();
        record.charge_period_start = "2025-01-01T00:00:00Z".into();
        record.charge_period_end = "2025-01-02T00:00:00Z".into();
        record.pricing_category = "standard".into();
        record.contracted_cost = 10.0;
        record.billed_cost = 10.0;

        let decoded = record_from_proto(record).unwrap();
        assert_eq!(
            decoded.service_category,
            ServiceCategory::Unrecognized("quantum-compute".to_string())
        );
    }

    #[test]
    fn malformed_charge_period_is_an_internal_error_not_a_panic() {
        let mut record = proto::CostRecord::default();
        record.billing_account_id = "acct-1".into();
        record.charge_period_start = "not-a-timestamp".into();
        record.charge_period_end = "2025-01-02T00:00:00Z".into();

        let err = record_from_proto(record).unwrap_err();
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn resource_descriptor_round_trips_through_proto() {
        let original = ResourceDescriptor {
            provider: "aws".into(),
            resource_type: "aws:ec2/instance:Instance".into(),
            region: "us-east-1".into(),
            tags: Default::default(),
            canonical_id: Some("arn:aws:ec2:us-east-1:123:instance/i-1".into()),
        };
        let roundtripped = resource_from_proto(resource_to_proto(&original));
        assert_eq!(roundtripped, original);
    }
}
