//! Vocabulary, FOCUS cost record model, and error types shared across
//! the CostSource workspace (spec.md §3, §4.1).

pub mod error;
pub mod model;
pub mod money;
pub mod vocabulary;

pub use error::{CostSourceError, Result, ValidationError};
pub use model::{
    BypassLedger, BypassRecord, ContractCommitment, FocusCostRecord, PluginInfo, Recommendation,
    ResourceDescriptor, ValidationResult,
};
pub use money::{Currency, Money};
