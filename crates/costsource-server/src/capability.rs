//! Capability discovery: a global view (what a plugin can ever do) and
//! a per-resource view (what it can do for one descriptor), with a
//! synthesized legacy string map for older clients (spec.md §4.7).

use costsource_core::vocabulary::Capability;
use std::collections::{HashMap, HashSet};

/// Canonical enum-to-legacy-string-key mapping (spec.md §4.7).
fn legacy_key(cap: &Capability) -> Option<&'static str> {
    match cap {
        Capability::ActualCosts => Some("actual-costs"),
        Capability::ProjectedCosts => Some("projected-costs"),
        Capability::PricingSpec => Some("pricing-spec"),
        Capability::EstimateCost => Some("estimate-cost"),
        Capability::Recommendations => Some("recommendations"),
        Capability::Budgets => Some("budgets"),
        Capability::DismissRecommendations => Some("dismiss-recommendations"),
        Capability::DryRun => Some("dry-run"),
        Capability::Unspecified | Capability::Unrecognized(_) => None,
    }
}

/// Both representations of a capability set, always returned together
/// (spec.md §4.7).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityView {
    pub enum_set: HashSet<Capability>,
    pub legacy_map: HashMap<String, bool>,
}

impl CapabilityView {
    pub fn new(enum_set: HashSet<Capability>) -> Self {
        let mut legacy_map = HashMap::new();
        for cap in &enum_set {
            if let Some(key) = legacy_key(cap) {
                legacy_map.insert(key.to_string(), true);
            }
        }
        Self { enum_set, legacy_map }
    }

    pub fn is_empty(&self) -> bool {
        self.enum_set.is_empty()
    }
}

/// Tracks the plugin's global capability set, computed once at server
/// construction, and resolves a per-resource view that inherits the
/// global set whenever a `Supports` handler reports none of its own
/// (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    global: CapabilityView,
}

impl CapabilityRegistry {
    pub fn new(global: HashSet<Capability>) -> Self {
        Self {
            global: CapabilityView::new(global),
        }
    }

    pub fn global(&self) -> &CapabilityView {
        &self.global
    }

    /// Resolves the view returned from a `Supports` call: if the
    /// handler-reported set is empty, substitute the global set
    /// instead of returning an empty answer (spec.md §4.7
    /// "inherit global").
    pub fn resolve_for_resource(&self, reported: HashSet<Capability>) -> CapabilityView {
        if reported.is_empty() {
            self.global.clone()
        } else {
            CapabilityView::new(reported)
        }
    }
}
