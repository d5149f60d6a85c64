//! CostSource: a cloud-cost observability protocol and plugin framework.
//!
//! This crate is a thin facade over the workspace members. Most callers
//! want one of:
//!
//! - [`costsource_core`] — vocabulary, the FOCUS cost record model, and
//!   the error/result types shared across the workspace.
//! - [`costsource_builder`] — the typed record builder and conformance
//!   validator.
//! - [`costsource_serializer`] — JSON-LD serialization and the bounded
//!   streaming batch emitter.
//! - [`costsource_server`] — the multi-protocol plugin server runtime.
//! - [`costsource_client`] — the typed, connection-managed plugin client.

pub use costsource_builder as builder;
pub use costsource_client as client;
pub use costsource_core as core;
pub use costsource_serializer as serializer;
pub use costsource_server as server;

pub use costsource_core::{
    error::{CostSourceError, Result, ValidationError},
    model::{
        BypassLedger, BypassRecord, ContractCommitment, FocusCostRecord, PluginInfo,
        Recommendation, ResourceDescriptor, ValidationResult,
    },
    vocabulary::{self, BypassMechanism, BypassSeverity},
};
pub use costsource_builder::{ConformanceValidator, FocusCostRecordBuilder};
pub use costsource_serializer::{
    jsonld::{JsonLdContext, JsonLdSerializer},
    streaming::{CancellationHandle, StreamingEmitter, StreamingLimits, StreamingResult},
};
