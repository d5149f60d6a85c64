//! Response shapes that have no corresponding type in
//! [`costsource_core::model`] because they only ever travel over the
//! RPC surface (spec.md §4.6).

use costsource_core::vocabulary::{Capability, PricingCategory};
use costsource_core::{Currency, Money};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCost {
    pub unit_price: Money,
    pub currency: Currency,
    pub monthly_cost: Money,
    pub pricing_category: PricingCategory,
    pub spot_interruption_risk: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: String,
    pub name: String,
    pub amount: Money,
    pub currency: Currency,
    pub actual_spend: Money,
}

#[derive(Debug, Clone)]
pub struct SupportsOutcome {
    pub supported: bool,
    pub reason: String,
    pub capabilities: HashSet<Capability>,
    pub legacy_capability_map: std::collections::HashMap<String, bool>,
}
