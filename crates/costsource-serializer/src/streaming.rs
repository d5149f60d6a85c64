//! Bounded-memory streaming batch emitter (spec.md §4.5).
//!
//! Converts a producer of records into one well-formed JSON array
//! document on a sink, holding at most one record plus one pooled
//! buffer in memory at a time. Errors — per-record serialization
//! failures, oversize records, sink write failures — are collected by
//! index rather than aborting the stream; only cancellation and
//! `MaxRecords` stop it early.

use crate::buffer_pool::BufferPool;
use crate::jsonld::JsonLdSerializer;
use costsource_core::model::FocusCostRecord;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Cooperative cancellation signal shared between a caller and an
/// in-flight [`StreamingEmitter::emit`] call.
#[derive(Debug, Clone)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional caps on a single `emit` invocation (spec.md §4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingLimits {
    pub max_records: Option<usize>,
    pub max_record_size: Option<usize>,
}

impl StreamingLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_records(mut self, n: usize) -> Self {
        self.max_records = Some(n);
        self
    }

    pub fn with_max_record_size(mut self, bytes: usize) -> Self {
        self.max_record_size = Some(bytes);
        self
    }
}

/// Outcome of an `emit` invocation (spec.md §4.5).
#[derive(Debug, Clone, Default)]
pub struct StreamingResult {
    pub records_written: usize,
    /// `(record_index, message)` pairs, in the order encountered.
    pub errors: Vec<(usize, String)>,
    /// Set whenever at least one record had already been written to
    /// the sink before cancellation fired — the array close was
    /// attempted, but an interrupted write may have torn a record.
    pub corrupted_on_cancel: bool,
    pub max_records_exceeded: bool,
}

/// Streams [`FocusCostRecord`]s to a sink as a single JSON-LD array
/// document (spec.md §4.5).
pub struct StreamingEmitter {
    serializer: JsonLdSerializer,
    limits: StreamingLimits,
    pool: BufferPool,
}

impl StreamingEmitter {
    pub fn new(serializer: JsonLdSerializer, limits: StreamingLimits) -> Self {
        Self {
            serializer,
            limits,
            pool: BufferPool::new(),
        }
    }

    /// Consumes `records` until exhausted, `cancellation` fires, or
    /// `MaxRecords` is reached, writing a JSON array document to
    /// `sink`. Safe to call concurrently on independent sinks sharing
    /// the same emitter instance — state mutated per call lives on the
    /// stack plus the shared, internally-synchronized buffer pool.
    pub fn emit<W: Write>(
        &self,
        cancellation: &CancellationHandle,
        records: Receiver<FocusCostRecord>,
        sink: &mut W,
    ) -> StreamingResult {
        let mut result = StreamingResult::default();
        let mut wrote_any = false;

        if let Err(e) = sink.write_all(b"[\n") {
            result.errors.push((0, format!("failed writing array open: {e}")));
            return result;
        }

        for (index, record) in records.iter().enumerate() {
            if cancellation.is_cancelled() {
                result.corrupted_on_cancel = wrote_any;
                let _ = sink.write_all(b"\n]");
                return result;
            }

            if let Some(max) = self.limits.max_records {
                if result.records_written >= max {
                    result.max_records_exceeded = true;
                    result.errors.push((index, "MaxRecordsExceeded".to_string()));
                    break;
                }
            }

            let value = match self.serializer.serialize_record(&record) {
                Ok(v) => v,
                Err(e) => {
                    result.errors.push((index, e.to_string()));
                    continue;
                }
            };

            let mut buf = self.pool.acquire();
            if let Err(e) = serde_json::to_writer(buf.as_mut(), &value) {
                result.errors.push((index, format!("serialization failed: {e}")));
                continue;
            }

            if let Some(max_size) = self.limits.max_record_size {
                if buf.as_slice().len() > max_size {
                    result.errors.push((
                        index,
                        format!("record exceeds MaxRecordSize ({} > {max_size} bytes)", buf.as_slice().len()),
                    ));
                    continue;
                }
            }

            let prefix: &[u8] = if wrote_any { b",\n" } else { b"" };
            if let Err(e) = sink.write_all(prefix).and_then(|_| sink.write_all(buf.as_slice())) {
                result.errors.push((index, format!("sink write failed: {e}")));
                continue;
            }

            wrote_any = true;
            result.records_written += 1;
        }

        if let Err(e) = sink.write_all(b"\n]") {
            result.errors.push((result.records_written, format!("failed writing array close: {e}")));
        }

        result
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::jsonld::JsonLdContext;
    use chrono::{TimeZone, Utc};
    use costsource_core::vocabulary::{ChargeCategory, PricingCategory, ServiceCategory};
    use costsource_core::{Currency, Money};
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::mpsc;

    fn record(resource_id: &str) -> FocusCostRecord {
        FocusCostRecord {
            billing_account_id: "123456789012".into(),
            billing_account_name: String::new(),
            sub_account_id: String::new(),
            sub_account_name: String::new(),
            invoice_id: String::new(),
            invoice_issuer_name: String::new(),
            service_category: ServiceCategory::Compute,
            service_name: "Amazon EC2".into(),
            service_subcategory: String::new(),
            publisher_name: String::new(),
            provider_name: String::new(),
            charge_category: ChargeCategory::Usage,
            charge_class: Default::default(),
            charge_frequency: Default::default(),
            charge_description: String::new(),
            charge_period_start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            charge_period_end: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            billing_period_start: None,
            billing_period_end: None,
            pricing_unit: String::new(),
            pricing_quantity: 0.0,
            pricing_category: PricingCategory::Standard,
            billing_currency: Some(Currency::new("USD").unwrap()),
            contracted_cost: Money::new(1.0).unwrap(),
            list_cost: None,
            effective_cost: None,
            billed_cost: Money::new(1.0).unwrap(),
            contracted_unit_price: None,
            list_unit_price: None,
            usage_quantity: 1.0,
            usage_unit: "hours".into(),
            commitment_discount_id: None,
            commitment_discount_status: Default::default(),
            commitment_discount_type: Default::default(),
            commitment_discount_category: Default::default(),
            commitment_discount_quantity: None,
            commitment_discount_unit: None,
            capacity_reservation_id: None,
            capacity_reservation_status: Default::default(),
            contract_applied: None,
            resource_id: resource_id.to_string(),
            resource_name: String::new(),
            resource_type: String::new(),
            region_id: String::new(),
            region_name: String::new(),
            availability_zone: String::new(),
            tags: HashMap::new(),
            extended_columns: HashMap::new(),
        }
    }

    proptest! {
        /// For the emitter over a sequence s: on graceful completion,
        /// `RecordsWritten = len(s)` and the output parses as a JSON
        /// array of that length (spec.md §8).
        #[test]
        fn records_written_matches_input_length(count in 0usize..20) {
            let (tx, rx) = mpsc::channel();
            for i in 0..count {
                tx.send(record(&format!("i-{i}"))).unwrap();
            }
            drop(tx);

            let emitter = StreamingEmitter::new(JsonLdSerializer::new(JsonLdContext::new()), StreamingLimits::new());
            let mut out = Vec::new();
            let result = emitter.emit(&CancellationHandle::new(), rx, &mut out);

            prop_assert_eq!(result.records_written, count);
            prop_assert!(result.errors.is_empty());
            let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
            prop_assert_eq!(parsed.as_array().unwrap().len(), count);
        }
    }
}
