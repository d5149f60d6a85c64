//! Plugin server runtime: native gRPC, grpc-web, and Connect-style JSON
//! multiplexed on one port behind a single [`CostSourcePlugin`]
//! implementation (spec.md §4.6).

pub mod capability;
pub mod config;
pub mod convert;
pub mod health;
pub mod plugin;
pub mod runtime;
pub mod state;

pub use costsource_proto::costsource as proto;

pub use capability::{CapabilityRegistry, CapabilityView};
pub use config::{CorsPolicy, ServerConfig};
pub use health::{HealthChecker, HealthStatus};
pub use plugin::{Budget, BudgetFilter, CostSourcePlugin, ProjectedCost, RecommendationFilter, SupportsOutcome};
pub use runtime::PluginServer;
pub use state::{LifecyclePhase, LifecycleTracker};
