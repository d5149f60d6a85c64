//! JSON-LD cost record serialization and bounded-memory streaming
//! (spec.md §4.4, §4.5).

pub mod buffer_pool;
pub mod jsonld;
pub mod streaming;

pub use jsonld::{EnumMode, JsonLdContext, JsonLdSerializer};
pub use streaming::{CancellationHandle, StreamingEmitter, StreamingLimits, StreamingResult};
