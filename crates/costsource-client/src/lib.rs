//! Typed gRPC client for CostSource plugins (spec.md §4.6, §5).

mod client;
mod convert;
mod types;

pub use client::{
    BatchActualCostRequest, BatchItem, BudgetFilter, ClientConfig, CostSourceClient,
    RecommendationFilter, BUILT_IN_DEFAULT_TIMEOUT,
};
pub use types::{Budget, ProjectedCost, SupportsOutcome};

pub use costsource_proto::costsource as proto;
