//! The interface a plugin implementor fulfills; the RPC surface of
//! spec.md §4.6 minus wire framing. [`crate::runtime::PluginServer`]
//! adapts this trait onto gRPC, grpc-web, and Connect-JSON.

use chrono::{DateTime, Utc};
use costsource_core::error::Result;
use costsource_core::model::{FocusCostRecord, PluginInfo, Recommendation, ResourceDescriptor};
use costsource_core::vocabulary::{Capability, PricingCategory, RecommendationCategory};
use costsource_core::{Currency, Money};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct RecommendationFilter {
    pub categories: Vec<RecommendationCategory>,
    pub resource_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: String,
    pub name: String,
    pub amount: Money,
    pub currency: Currency,
    pub actual_spend: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCost {
    pub unit_price: Money,
    pub currency: Currency,
    pub monthly_cost: Money,
    pub pricing_category: PricingCategory,
    /// In `[0, 1]`; semantically meaningful only when `pricing_category`
    /// is `Dynamic` (spec.md §4.6).
    pub spot_interruption_risk: f64,
}

#[derive(Debug, Clone)]
pub struct SupportsOutcome {
    pub supported: bool,
    pub reason: String,
    /// Capabilities this handler is declaring for the queried resource.
    /// An empty set tells the runtime to substitute the global
    /// capability set (spec.md §4.7).
    pub capabilities: HashSet<Capability>,
}

/// Implemented once per cost-source plugin. Methods without a default
/// body are mandatory; the optional capabilities (`GetPluginInfo`,
/// `GetBudgets`, `DismissRecommendation`) default to
/// [`costsource_core::error::CostSourceError::Unimplemented`], which
/// the runtime maps to the transport's unimplemented status
/// (spec.md §4.6).
#[async_trait::async_trait]
pub trait CostSourcePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Declares which optional RPCs and capabilities this plugin
    /// implements; the runtime computes the global capability set from
    /// this once at construction (spec.md §4.7).
    fn declared_capabilities(&self) -> HashSet<Capability> {
        HashSet::new()
    }

    async fn get_plugin_info(&self) -> Result<PluginInfo> {
        Err(costsource_core::error::CostSourceError::Unimplemented(
            "GetPluginInfo is not implemented by this plugin".to_string(),
        ))
    }

    async fn supports(&self, resource: &ResourceDescriptor) -> Result<SupportsOutcome>;

    async fn get_actual_cost(
        &self,
        resource_id: &str,
        window: (DateTime<Utc>, DateTime<Utc>),
        tags: &HashMap<String, String>,
        arn: Option<&str>,
    ) -> Result<Vec<FocusCostRecord>>;

    async fn get_projected_cost(&self, resource: &ResourceDescriptor) -> Result<ProjectedCost>;

    async fn get_pricing_spec(&self, resource: &ResourceDescriptor) -> Result<serde_json::Value>;

    /// `resource_type` is validated by the runtime before this is
    /// called; an implementor never sees a malformed shape
    /// (spec.md §4.6).
    async fn estimate_cost(
        &self,
        resource_type: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<(Money, Currency)>;

    async fn get_recommendations(&self, filter: Option<&RecommendationFilter>) -> Result<Vec<Recommendation>>;

    async fn get_budgets(&self, _filter: Option<&BudgetFilter>) -> Result<Vec<Budget>> {
        Err(costsource_core::error::CostSourceError::Unimplemented(
            "GetBudgets is not implemented by this plugin".to_string(),
        ))
    }

    async fn dismiss_recommendation(&self, _id: &str, _reason: Option<&str>) -> Result<()> {
        Err(costsource_core::error::CostSourceError::Unimplemented(
            "DismissRecommendation is not implemented by this plugin".to_string(),
        ))
    }
}
