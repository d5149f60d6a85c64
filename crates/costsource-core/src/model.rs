//! The FOCUS 1.2 cost record and the other data-model types described
//! in spec.md §3: resource descriptors, contract commitments,
//! recommendations, validation results, the bypass ledger, and plugin
//! info.
//!
//! `FocusCostRecord` fields are grouped exactly as spec.md §3 groups
//! them (identity / service / charge / pricing / resource), with an
//! open `extended_columns` map absorbing any FOCUS 1.2 column this
//! struct does not name explicitly — the sanctioned forward-compatible
//! escape hatch (spec.md §4.2, §9 "Backpack").

use crate::money::{Currency, Money};
use crate::vocabulary::{
    BypassMechanism, BypassSeverity, CapacityReservationStatus, ChargeCategory, ChargeClass,
    ChargeFrequency, CommitmentDiscountCategory, CommitmentDiscountStatus,
    CommitmentDiscountType, PricingCategory, RecommendationActionType, RecommendationCategory,
    ServiceCategory,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies the cloud/Kubernetes resource a record, recommendation,
/// or `Supports` query is about. Identity is owned by the caller, not
/// any subsystem here (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub provider: String,
    /// Canonical form `provider:module/resource:Type`, e.g.
    /// `aws:ec2/instance:Instance`.
    pub resource_type: String,
    pub region: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Canonical cloud identifier (e.g. an ARN), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
}

impl ResourceDescriptor {
    /// `provider:module/resource:Type` — spec.md §4.6 `EstimateCost`
    /// requires rejecting any `resource_type` that doesn't match this.
    pub fn resource_type_is_well_formed(resource_type: &str) -> bool {
        let Some((provider, rest)) = resource_type.split_once(':') else {
            return false;
        };
        let Some((module, rest)) = rest.split_once('/') else {
            return false;
        };
        let Some((resource, kind)) = rest.split_once(':') else {
            return false;
        };
        [provider, module, resource, kind].iter().all(|s| !s.is_empty())
    }
}

/// A contractually agreed usage or spend obligation (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCommitment {
    pub commitment_id: String,
    pub parent_contract_id: String,
    pub category: CommitmentDiscountCategory,
    pub quantity: f64,
    pub cost: Money,
    pub currency: Currency,
    pub lifetime_start: DateTime<Utc>,
    pub lifetime_end: DateTime<Utc>,
}

/// The FOCUS 1.2 cost record. See module docs for the grouping
/// rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusCostRecord {
    // --- Identity ---
    pub billing_account_id: String,
    #[serde(default)]
    pub billing_account_name: String,
    #[serde(default)]
    pub sub_account_id: String,
    #[serde(default)]
    pub sub_account_name: String,
    #[serde(default)]
    pub invoice_id: String,
    #[serde(default)]
    pub invoice_issuer_name: String,

    // --- Service ---
    pub service_category: ServiceCategory,
    pub service_name: String,
    #[serde(default)]
    pub service_subcategory: String,
    /// Deprecated by FOCUS 1.2 in favor of `invoice_issuer_name`;
    /// serialized with `schema:supersededBy` when present (spec.md §4.4).
    #[serde(default)]
    pub publisher_name: String,
    /// Deprecated by FOCUS 1.2 in favor of `invoice_issuer_name`.
    #[serde(default)]
    pub provider_name: String,

    // --- Charge ---
    pub charge_category: ChargeCategory,
    #[serde(default)]
    pub charge_class: ChargeClass,
    #[serde(default)]
    pub charge_frequency: ChargeFrequency,
    #[serde(default)]
    pub charge_description: String,
    pub charge_period_start: DateTime<Utc>,
    pub charge_period_end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period_end: Option<DateTime<Utc>>,

    // --- Pricing ---
    #[serde(default)]
    pub pricing_unit: String,
    #[serde(default)]
    pub pricing_quantity: f64,
    pub pricing_category: PricingCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_currency: Option<Currency>,
    pub contracted_cost: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_cost: Option<Money>,
    pub billed_cost: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracted_unit_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_unit_price: Option<Money>,
    #[serde(default)]
    pub usage_quantity: f64,
    #[serde(default)]
    pub usage_unit: String,

    // --- Commitment / capacity reservation ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment_discount_id: Option<String>,
    #[serde(default)]
    pub commitment_discount_status: CommitmentDiscountStatus,
    #[serde(default)]
    pub commitment_discount_type: CommitmentDiscountType,
    #[serde(default)]
    pub commitment_discount_category: CommitmentDiscountCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment_discount_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment_discount_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_reservation_id: Option<String>,
    #[serde(default)]
    pub capacity_reservation_status: CapacityReservationStatus,
    /// References a [`ContractCommitment::commitment_id`], if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_applied: Option<String>,

    // --- Resource ---
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub region_id: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub availability_zone: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Forward-compatible overflow for provider-specific or
    /// pre-standardized FOCUS fields. Free-form keys, no enforced
    /// namespace (spec.md §4.2).
    #[serde(default)]
    pub extended_columns: HashMap<String, String>,
}

/// A FinOps optimization or anomaly recommendation (spec.md §3).
/// Fields beyond `category`/`action_type` are polymorphic over
/// capabilities a plugin may not implement; absence is expressed by
/// the plugin simply not returning any records of that category, not
/// by `Option` fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub category: RecommendationCategory,
    pub action_type: RecommendationActionType,
    pub resource_target: ResourceDescriptor,
    /// Estimated savings; may be negative to express overspend impact
    /// for an anomaly recommendation.
    pub estimated_savings: Money,
    /// In `[0, 1]`. The normalization of provider-specific confidence
    /// scales into this range is not defined by the protocol — the
    /// declared value is passed through unmodified (spec.md §9).
    pub confidence_score: f64,
    pub description: String,
    pub source: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Recommendation {
    pub fn confidence_in_range(&self) -> bool {
        self.confidence_score.is_finite() && (0.0..=1.0).contains(&self.confidence_score)
    }
}

/// Audit record produced when a validation that would otherwise have
/// failed was deliberately overridden (spec.md §3, §4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BypassRecord {
    pub timestamp: DateTime<Utc>,
    pub validation_name: String,
    pub original_error: String,
    pub reason: String,
    pub operator: String,
    pub severity: BypassSeverity,
    pub mechanism: BypassMechanism,
    pub truncated: bool,
}

const MAX_REASON_LEN: usize = 500;

impl BypassRecord {
    /// Construct a bypass record, truncating `reason` to
    /// [`MAX_REASON_LEN`] characters with a `"…"` suffix and setting
    /// `truncated` accordingly (spec.md §3, §4.9, §8).
    pub fn new(
        validation_name: impl Into<String>,
        original_error: impl Into<String>,
        reason: impl Into<String>,
        severity: BypassSeverity,
        mechanism: BypassMechanism,
        operator: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        let reason = reason.into();
        let (reason, truncated) = truncate_reason(&reason);
        Self {
            timestamp: timestamp.unwrap_or_else(Utc::now),
            validation_name: validation_name.into(),
            original_error: original_error.into(),
            reason,
            operator: operator.unwrap_or_else(|| "unknown".to_string()),
            severity,
            mechanism,
            truncated,
        }
    }
}

fn truncate_reason(reason: &str) -> (String, bool) {
    if reason.chars().count() <= MAX_REASON_LEN {
        return (reason.to_string(), false);
    }
    let truncated: String = reason.chars().take(MAX_REASON_LEN).collect();
    (format!("{truncated}…"), true)
}

/// Outcome of the Conformance Validator (spec.md §4.3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub bypasses: Vec<BypassRecord>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// An in-memory, caller-owned audit trail of bypass records attached
/// to a [`ValidationResult`]. Retention beyond the process lifetime is
/// the caller's responsibility (spec.md §4.9, §9).
#[derive(Debug, Clone, Default)]
pub struct BypassLedger {
    records: Vec<BypassRecord>,
}

impl BypassLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: BypassRecord) {
        self.records.push(record);
    }

    pub fn all(&self) -> &[BypassRecord] {
        &self.records
    }

    pub fn in_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&BypassRecord> {
        self.records
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .collect()
    }

    pub fn by_operator<'a>(&'a self, operator: &'a str) -> Vec<&'a BypassRecord> {
        self.records.iter().filter(|r| r.operator == operator).collect()
    }

    pub fn by_severity(&self, severity: &BypassSeverity) -> Vec<&BypassRecord> {
        self.records.iter().filter(|r| &r.severity == severity).collect()
    }

    pub fn by_mechanism(&self, mechanism: &BypassMechanism) -> Vec<&BypassRecord> {
        self.records.iter().filter(|r| &r.mechanism == mechanism).collect()
    }
}

/// Plugin identity returned by `GetPluginInfo` (spec.md §3, §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub implementation_version: String,
    /// A SemVer `vX.Y.Z` string.
    pub spec_version: String,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PluginInfo {
    /// `true` iff `spec_version` is a well-formed `vMAJOR.MINOR.PATCH`.
    pub fn has_valid_spec_version(&self) -> bool {
        let Some(stripped) = self.spec_version.strip_prefix('v') else {
            return false;
        };
        let parts: Vec<&str> = stripped.split('.').collect();
        parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_validation() {
        assert!(ResourceDescriptor::resource_type_is_well_formed(
            "aws:ec2/instance:Instance"
        ));
        assert!(!ResourceDescriptor::resource_type_is_well_formed(
            "aws:ec2:Instance"
        ));
        assert!(!ResourceDescriptor::resource_type_is_well_formed(""));
    }

    #[test]
    fn bypass_reason_truncates_at_500_chars_with_ellipsis() {
        let long_reason = "a".repeat(600);
        let record = BypassRecord::new(
            "currency_required",
            "currency missing",
            long_reason,
            BypassSeverity::Warning,
            BypassMechanism::Flag,
            None,
            None,
        );
        assert!(record.truncated);
        assert_eq!(record.reason.chars().count(), MAX_REASON_LEN + 1); // + the "…" char
        assert!(record.reason.ends_with('…'));
        assert_eq!(record.operator, "unknown");
    }

    #[test]
    fn bypass_reason_under_limit_is_untouched() {
        let record = BypassRecord::new(
            "x",
            "y",
            "short reason",
            BypassSeverity::Warning,
            BypassMechanism::Flag,
            Some("alice".to_string()),
            None,
        );
        assert!(!record.truncated);
        assert_eq!(record.reason, "short reason");
        assert_eq!(record.operator, "alice");
    }

    #[test]
    fn ledger_filters_compose() {
        let mut ledger = BypassLedger::new();
        ledger.record(BypassRecord::new(
            "a",
            "e1",
            "r1",
            BypassSeverity::Warning,
            BypassMechanism::Flag,
            Some("alice".into()),
            None,
        ));
        ledger.record(BypassRecord::new(
            "b",
            "e2",
            "r2",
            BypassSeverity::Critical,
            BypassMechanism::EnvVar,
            Some("bob".into()),
            None,
        ));
        assert_eq!(ledger.all().len(), 2);
        assert_eq!(ledger.by_operator("alice").len(), 1);
        assert_eq!(ledger.by_severity(&BypassSeverity::Critical).len(), 1);
        assert_eq!(ledger.by_mechanism(&BypassMechanism::Flag).len(), 1);
    }

    #[test]
    fn plugin_info_semver_validation() {
        let mut info = PluginInfo {
            name: "aws-plugin".into(),
            implementation_version: "1.2.3".into(),
            spec_version: "v1.0.0".into(),
            providers: vec!["aws".into()],
            metadata: HashMap::new(),
        };
        assert!(info.has_valid_spec_version());
        info.spec_version = "1.0.0".into();
        assert!(!info.has_valid_spec_version());
        info.spec_version = "v1.0".into();
        assert!(!info.has_valid_spec_version());
    }

    #[test]
    fn recommendation_confidence_bounds() {
        let base = Recommendation {
            id: "r1".into(),
            category: RecommendationCategory::Anomaly,
            action_type: RecommendationActionType::Investigate,
            resource_target: ResourceDescriptor {
                provider: "aws".into(),
                resource_type: "aws:ec2/instance:Instance".into(),
                region: "us-east-1".into(),
                tags: HashMap::new(),
                canonical_id: None,
            },
            estimated_savings: Money::new(-1500.0).unwrap(),
            confidence_score: 0.85,
            description: "spend spike".into(),
            source: "anomaly-detector".into(),
            metadata: HashMap::new(),
        };
        assert!(base.confidence_in_range());
        let mut nan_case = base.clone();
        nan_case.confidence_score = f64::NAN;
        assert!(!nan_case.confidence_in_range());
    }
}
