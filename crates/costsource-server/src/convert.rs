//! Proto ⇄ domain type conversion for the gRPC/grpc-web transport
//! (spec.md §4.4 field groupings, §4.6 RPC surface).
//!
//! Closed-vocabulary fields cross the wire as their canonical string
//! (spec.md §4.1); [`costsource_core::vocabulary`]'s `parse` already
//! falls back to `Unrecognized` rather than failing, so decoding a
//! proto message into a domain record never rejects a forward-declared
//! value.

use crate::plugin::{Budget, ProjectedCost, SupportsOutcome};
use crate::proto;
use chrono::{DateTime, Utc};
use costsource_core::error::{CostSourceError, Result};
use costsource_core::model::{FocusCostRecord, Recommendation, ResourceDescriptor};
use costsource_core::vocabulary::RecommendationCategory;

fn parse_rfc3339(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CostSourceError::InvalidArgument(format!("`{field}` is not RFC3339: {e}")))
}

fn format_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn resource_from_proto(r: &proto::ResourceDescriptor) -> ResourceDescriptor {
    ResourceDescriptor {
        provider: r.provider.clone(),
        resource_type: r.resource_type.clone(),
        region: r.region.clone(),
        tags: r.tags.clone(),
        canonical_id: r.canonical_id.clone(),
    }
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

pub fn record_to_proto(r: &FocusCostRecord) -> proto::CostRecord {
    proto::CostRecord {
        billing_account_id: r.billing_account_id.clone(),
        billing_account_name: r.billing_account_name.clone(),
        sub_account_id: r.sub_account_id.clone(),
        sub_account_name: r.sub_account_name.clone(),
        invoice_id: r.invoice_id.clone(),
        invoice_issuer_name: r.invoice_issuer_name.clone(),
        service_category: r.service_category.as_str().to_string(),
        service_name: r.service_name.clone(),
        service_subcategory: r.service_subcategory.clone(),
        publisher_name: r.publisher_name.clone(),
        provider_name: r.provider_name.clone(),
        charge_category: r.charge_category.as_str().to_string(),
        charge_class: r.charge_class.as_str().to_string(),
        charge_frequency: r.charge_frequency.as_str().to_string(),
        charge_description: r.charge_description.clone(),
        charge_period_start: format_rfc3339(r.charge_period_start),
        charge_period_end: format_rfc3339(r.charge_period_end),
        billing_period_start: r.billing_period_start.map(format_rfc3339),
        billing_period_end: r.billing_period_end.map(format_rfc3339),
        pricing_unit: r.pricing_unit.clone(),
        pricing_quantity: r.pricing_quantity,
        pricing_category: r.pricing_category.as_str().to_string(),
        billing_currency: r.billing_currency.as_ref().map(|c| c.as_str().to_string()),
        contracted_cost: r.contracted_cost.value(),
        list_cost: r.list_cost.map(|m| m.value()),
        effective_cost: r.effective_cost.map(|m| m.value()),
        billed_cost: r.billed_cost.value(),
        contracted_unit_price: r.contracted_unit_price.map(|m| m.value()),
        list_unit_price: r.list_unit_price.map(|m| m.value()),
        usage_quantity: r.usage_quantity,
        usage_unit: r.usage_unit.clone(),
        commitment_discount_id: r.commitment_discount_id.clone(),
        commitment_discount_status: r.commitment_discount_status.as_str().to_string(),
        commitment_discount_type: r.commitment_discount_type.as_str().to_string(),
        commitment_discount_category: r.commitment_discount_category.as_str().to_string(),
        commitment_discount_quantity: r.commitment_discount_quantity,
        commitment_discount_unit: r.commitment_discount_unit.clone(),
        capacity_reservation_id: r.capacity_reservation_id.clone(),
        capacity_reservation_status: r.capacity_reservation_status.as_str().to_string(),
        contract_applied: r.contract_applied.clone(),
        resource_id: r.resource_id.clone(),
        resource_name: r.resource_name.clone(),
        resource_type: r.resource_type.clone(),
        region_id: r.region_id.clone(),
        region_name: r.region_name.clone(),
        availability_zone: r.availability_zone.clone(),
        tags: r.tags.clone(),
        extended_columns: r.extended_columns.clone(),
    }
}

pub fn recommendation_to_proto(r: &Recommendation) -> proto::Recommendation {
    proto::Recommendation {
        id: r.id.clone(),
        category: r.category.as_str().to_string(),
        action_type: r.action_type.as_str().to_string(),
        resource_target: Some(resource_to_proto(&r.resource_target)),
        estimated_savings: r.estimated_savings.value(),
        confidence_score: r.confidence_score,
        description: r.description.clone(),
        source: r.source.clone(),
        metadata: r.metadata.clone(),
    }
}

pub fn recommendation_filter_from_proto(
    f: &proto::RecommendationFilter,
) -> crate::plugin::RecommendationFilter {
    crate::plugin::RecommendationFilter {
        categories: f
            .categories
            .iter()
            .map(|s| RecommendationCategory::parse(s))
            .collect(),
        resource_id: f.resource_id.clone(),
    }
}

pub fn budget_filter_from_proto(f: &proto::BudgetFilter) -> crate::plugin::BudgetFilter {
    crate::plugin::BudgetFilter {
        account_id: f.account_id.clone(),
    }
}

pub fn budget_to_proto(b: &Budget) -> proto::Budget {
    proto::Budget {
        id: b.id.clone(),
        name: b.name.clone(),
        amount: b.amount.value(),
        currency: b.currency.as_str().to_string(),
        actual_spend: b.actual_spend.value(),
    }
}

pub fn supports_outcome_to_proto(
    outcome: &SupportsOutcome,
    view: &crate::capability::CapabilityView,
) -> proto::SupportsResponse {
    proto::SupportsResponse {
        supported: outcome.supported,
        reason: outcome.reason.clone(),
        capabilities: view.enum_set.iter().map(|c| c.as_str().to_string()).collect(),
        legacy_capability_map: view.legacy_map.clone(),
    }
}

pub fn parse_charge_window(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    Ok((parse_rfc3339(start, "start")?, parse_rfc3339(end, "end")?))
}

pub fn projected_cost_to_proto(p: &ProjectedCost) -> proto::GetProjectedCostResponse {
    proto::GetProjectedCostResponse {
        unit_price: p.unit_price.value(),
        currency: p.currency.as_str().to_string(),
        monthly_cost: p.monthly_cost.value(),
        pricing_category: p.pricing_category.as_str().to_string(),
        spot_interruption_risk: p.spot_interruption_risk,
    }
}

/// `provider:module/resource:Type` per spec.md §4.6 `EstimateCost`.
pub fn require_well_formed_resource_type(resource_type: &str) -> Result<()> {
    if ResourceDescriptor::resource_type_is_well_formed(resource_type) {
        Ok(())
    } else {
        Err(CostSourceError::InvalidArgument(format!(
            "resource_type must follow provider:module/resource:Type format, got: {resource_type}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_window_parses_rfc3339_pair() {
        let (start, end) = parse_charge_window("2025-01-01T00:00:00Z", "2025-01-02T00:00:00Z").unwrap();
        assert!(start < end);
    }

    #[test]
    fn malformed_timestamp_is_invalid_argument() {
        let err = parse_charge_window("not-a-date", "2025-01-02T00:00:00Z").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn resource_type_shape_is_enforced() {
        assert!(require_well_formed_resource_type("aws:ec2/instance:Instance").is_ok());
        let err = require_well_formed_resource_type("aws:ec2:Instance").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        match err {
            CostSourceError::InvalidArgument(message) => assert_eq!(
                message,
                "resource_type must follow provider:module/resource:Type format, got: aws:ec2:Instance"
            ),
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }
}
