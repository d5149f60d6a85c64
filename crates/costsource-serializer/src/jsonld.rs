//! Single-record JSON-LD 1.1 serialization (spec.md §4.4, §6).
//!
//! The derivation of `@id` and the Schema.org/FOCUS namespace split are
//! part of the wire contract — round-tripping a record through this
//! serializer must produce the same `@id` every time, not merely a
//! valid one.
//!
//! Document keys are the prefixed term form (`schema:billed_cost`,
//! `schema:charge_period_start`), not a bare camelCase alias
//! (`billedCost`): the prefix is what makes the Schema.org/FOCUS split
//! legible without consulting `@context` first, and an external JSON-LD
//! processor still resolves either form to the same IRI and recovers
//! the same values (spec.md §4.4).

use chrono::{DateTime, Utc};
use costsource_core::error::ValidationError;
use costsource_core::model::{ContractCommitment, FocusCostRecord};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// Fields the default context maps to a `schema:` IRI rather than
/// `focus:` (spec.md §4.4).
const SCHEMA_ORG_FIELDS: &[&str] = &[
    "billed_cost",
    "list_cost",
    "effective_cost",
    "contracted_cost",
    "charge_period_start",
    "charge_period_end",
    "billing_period_start",
    "billing_period_end",
    "service_name",
    "resource_name",
    "region_name",
];

/// Fields declared with an `xsd:dateTime` type coercion in the
/// default `@context`, so their document values stay bare RFC-3339
/// strings instead of expanded `@type`/`@value` objects (spec.md §4.4).
const TIMESTAMP_FIELDS: &[&str] =
    &["charge_period_start", "charge_period_end", "billing_period_start", "billing_period_end"];

/// Fields FOCUS 1.2 deprecated in favor of another field. Serialized
/// with a `schema:supersededBy` annotation when present (spec.md §4.4).
const DEPRECATED_FIELDS: &[(&str, &str)] = &[
    ("provider_name", "invoice_issuer_name"),
    ("publisher_name", "invoice_issuer_name"),
];

/// How enum values are rendered: their bare wire string, or a
/// fully-qualified IRI under the `focus:` namespace (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumMode {
    #[default]
    StringName,
    Iri,
}

/// Configurable JSON-LD `@context` plus rendering options
/// (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct JsonLdContext {
    entries: Map<String, Value>,
    remote_contexts: Vec<String>,
    enum_mode: EnumMode,
    /// Name of a record field whose value, when non-empty, overrides
    /// the hash-derived `@id`.
    user_id_field: Option<String>,
}

impl Default for JsonLdContext {
    fn default() -> Self {
        let mut entries = Map::new();
        entries.insert("schema".into(), json!("https://schema.org/"));
        entries.insert("focus".into(), json!("https://focus.finops.org/v1#"));
        entries.insert(
            "xsd".into(),
            json!("http://www.w3.org/2001/XMLSchema#"),
        );
        for field in TIMESTAMP_FIELDS {
            let ns = if SCHEMA_ORG_FIELDS.contains(field) { "schema" } else { "focus" };
            entries.insert(
                format!("{ns}:{field}"),
                json!({ "@id": format!("{ns}:{field}"), "@type": "xsd:dateTime" }),
            );
        }
        Self {
            entries,
            remote_contexts: Vec::new(),
            enum_mode: EnumMode::StringName,
            user_id_field: None,
        }
    }
}

impl JsonLdContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overrides a prefix-to-IRI mapping in the local context.
    /// Rejects malformed IRIs up front rather than writing a
    /// self-inconsistent document (spec.md §4.4).
    pub fn with_prefix(
        mut self,
        prefix: impl Into<String>,
        iri: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let iri = iri.into();
        if !is_well_formed_iri(&iri) {
            return Err(ValidationError::new(
                "context",
                format!("`{iri}` is not a well-formed absolute IRI"),
            ));
        }
        self.entries.insert(prefix.into(), json!(iri));
        Ok(self)
    }

    /// Adds a remote `@context` URL, validated the same way as a local
    /// prefix mapping.
    pub fn with_remote_context(mut self, url: impl Into<String>) -> Result<Self, ValidationError> {
        let url = url.into();
        if !is_well_formed_iri(&url) {
            return Err(ValidationError::new(
                "context",
                format!("`{url}` is not a well-formed absolute URL"),
            ));
        }
        self.remote_contexts.push(url);
        Ok(self)
    }

    pub fn with_enum_mode(mut self, mode: EnumMode) -> Self {
        self.enum_mode = mode;
        self
    }

    /// Field whose value, if present and non-empty on a record, is
    /// used verbatim (prefixed) as `@id` instead of the hash-derived
    /// default.
    pub fn with_user_id_field(mut self, field: impl Into<String>) -> Self {
        self.user_id_field = Some(field.into());
        self
    }

    fn to_context_value(&self) -> Value {
        if self.remote_contexts.is_empty() {
            Value::Object(self.entries.clone())
        } else {
            let mut items: Vec<Value> = self
                .remote_contexts
                .iter()
                .map(|url| json!(url))
                .collect();
            items.push(Value::Object(self.entries.clone()));
            Value::Array(items)
        }
    }
}

fn is_well_formed_iri(s: &str) -> bool {
    s.split_once("://").map(|(scheme, rest)| !scheme.is_empty() && !rest.is_empty()).unwrap_or(false)
}

fn field_namespace(field: &str) -> &'static str {
    if SCHEMA_ORG_FIELDS.contains(&field) {
        "schema"
    } else {
        "focus"
    }
}

fn money_value(namespace: &str, amount: f64, currency: Option<&str>) -> Value {
    let mut obj = json!({
        "@type": "schema:MonetaryAmount",
        "schema:value": amount,
    });
    if let Some(currency) = currency {
        obj["schema:currency"] = json!(currency);
    }
    let _ = namespace;
    obj
}

/// Timestamps are plain RFC-3339 strings in the document body; the
/// `xsd:dateTime` coercion is declared once in `@context`, not
/// repeated per value as an expanded `@type`/`@value` object
/// (spec.md §4.4, §6).
fn timestamp_value(ts: DateTime<Utc>) -> Value {
    json!(ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
}

fn property_values(map: &std::collections::HashMap<String, String>) -> Value {
    let mut entries: Vec<&String> = map.keys().collect();
    entries.sort();
    Value::Array(
        entries
            .into_iter()
            .map(|k| {
                json!({
                    "@type": "schema:PropertyValue",
                    "schema:name": k,
                    "schema:value": map[k],
                })
            })
            .collect(),
    )
}

fn enum_value(namespace: &str, field: &str, wire_value: &str, mode: EnumMode) -> Value {
    match mode {
        EnumMode::StringName => json!(wire_value),
        EnumMode::Iri => json!(format!(
            "https://focus.finops.org/v1#{namespace}/{field}/{wire_value}"
        )),
    }
}

/// Computes the default, hash-derived `@id` body (without the
/// `urn:focus:` prefix) for a cost record per spec.md §4.4:
/// `SHA256(billing_account_id | "|" | charge_period_start_iso | "|" |
/// resource_id)`, first 16 bytes hex-encoded.
fn hashed_id_body(billing_account_id: &str, charge_period_start: DateTime<Utc>, resource_id: &str) -> String {
    let iso = charge_period_start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let input = format!("{billing_account_id}|{iso}|{resource_id}");
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..16])
}

/// Serializes FOCUS cost records and contract commitments to canonical
/// JSON-LD documents (spec.md §4.4).
#[derive(Debug, Clone, Default)]
pub struct JsonLdSerializer {
    context: JsonLdContext,
}

impl JsonLdSerializer {
    pub fn new(context: JsonLdContext) -> Self {
        Self { context }
    }

    /// Serializes a single cost record. Returns a `ValidationError` if
    /// a string field is not valid UTF-8 — unreachable for any record
    /// built from Rust `String`s, but kept as a guard against a future
    /// caller deserializing raw bytes ahead of this call.
    pub fn serialize_record(&self, record: &FocusCostRecord) -> Result<Value, ValidationError> {
        let mut doc = Map::new();
        doc.insert("@context".into(), self.context.to_context_value());
        doc.insert("@type".into(), json!("FocusCostRecord"));
        doc.insert("@id".into(), json!(self.record_id(record)));

        self.put_string(&mut doc, "billing_account_id", &record.billing_account_id);
        self.put_string(&mut doc, "billing_account_name", &record.billing_account_name);
        self.put_string(&mut doc, "sub_account_id", &record.sub_account_id);
        self.put_string(&mut doc, "sub_account_name", &record.sub_account_name);
        self.put_string(&mut doc, "invoice_id", &record.invoice_id);
        self.put_string(&mut doc, "invoice_issuer_name", &record.invoice_issuer_name);
        self.put_deprecated_string(&mut doc, "provider_name", &record.provider_name);
        self.put_deprecated_string(&mut doc, "publisher_name", &record.publisher_name);

        self.put_enum(&mut doc, "service_category", record.service_category.as_str());
        self.put_string(&mut doc, "service_name", &record.service_name);
        self.put_string(&mut doc, "service_subcategory", &record.service_subcategory);

        self.put_enum(&mut doc, "charge_category", record.charge_category.as_str());
        self.put_enum(&mut doc, "charge_class", record.charge_class.as_str());
        self.put_enum(&mut doc, "charge_frequency", record.charge_frequency.as_str());
        self.put_string(&mut doc, "charge_description", &record.charge_description);
        self.put_timestamp(&mut doc, "charge_period_start", Some(record.charge_period_start));
        self.put_timestamp(&mut doc, "charge_period_end", Some(record.charge_period_end));
        self.put_timestamp(&mut doc, "billing_period_start", record.billing_period_start);
        self.put_timestamp(&mut doc, "billing_period_end", record.billing_period_end);

        self.put_string(&mut doc, "pricing_unit", &record.pricing_unit);
        self.put_number(&mut doc, "pricing_quantity", record.pricing_quantity);
        self.put_enum(&mut doc, "pricing_category", record.pricing_category.as_str());

        let currency = record.billing_currency.as_ref().map(|c| c.as_str());
        self.put_money(&mut doc, "contracted_cost", record.contracted_cost.value(), currency);
        self.put_money(&mut doc, "billed_cost", record.billed_cost.value(), currency);
        if let Some(v) = record.list_cost {
            self.put_money(&mut doc, "list_cost", v.value(), currency);
        }
        if let Some(v) = record.effective_cost {
            self.put_money(&mut doc, "effective_cost", v.value(), currency);
        }
        if let Some(v) = record.contracted_unit_price {
            self.put_money(&mut doc, "contracted_unit_price", v.value(), currency);
        }
        if let Some(v) = record.list_unit_price {
            self.put_money(&mut doc, "list_unit_price", v.value(), currency);
        }
        self.put_number(&mut doc, "usage_quantity", record.usage_quantity);
        self.put_string(&mut doc, "usage_unit", &record.usage_unit);

        if let Some(id) = &record.commitment_discount_id {
            self.put_string(&mut doc, "commitment_discount_id", id);
        }
        self.put_enum(&mut doc, "commitment_discount_status", record.commitment_discount_status.as_str());
        self.put_enum(&mut doc, "commitment_discount_type", record.commitment_discount_type.as_str());
        self.put_enum(&mut doc, "commitment_discount_category", record.commitment_discount_category.as_str());
        if let Some(id) = &record.capacity_reservation_id {
            self.put_string(&mut doc, "capacity_reservation_id", id);
        }
        self.put_enum(&mut doc, "capacity_reservation_status", record.capacity_reservation_status.as_str());

        self.put_string(&mut doc, "resource_id", &record.resource_id);
        self.put_string(&mut doc, "resource_name", &record.resource_name);
        self.put_string(&mut doc, "resource_type", &record.resource_type);
        self.put_string(&mut doc, "region_id", &record.region_id);
        self.put_string(&mut doc, "region_name", &record.region_name);
        self.put_string(&mut doc, "availability_zone", &record.availability_zone);

        if !record.tags.is_empty() {
            doc.insert("focus:tags".into(), property_values(&record.tags));
        }
        if !record.extended_columns.is_empty() {
            doc.insert(
                "focus:extended_columns".into(),
                property_values(&record.extended_columns),
            );
        }

        Ok(Value::Object(doc))
    }

    pub fn serialize_commitment(&self, commitment: &ContractCommitment) -> Result<Value, ValidationError> {
        let mut doc = Map::new();
        doc.insert("@context".into(), self.context.to_context_value());
        doc.insert("@type".into(), json!("ContractCommitment"));
        let id_body = hashed_id_body(&commitment.commitment_id, commitment.lifetime_start, &commitment.parent_contract_id);
        doc.insert("@id".into(), json!(format!("urn:focus:commitment:{id_body}")));

        self.put_string(&mut doc, "commitment_id", &commitment.commitment_id);
        self.put_string(&mut doc, "parent_contract_id", &commitment.parent_contract_id);
        self.put_enum(&mut doc, "category", commitment.category.as_str());
        self.put_number(&mut doc, "quantity", commitment.quantity);
        self.put_money(&mut doc, "cost", commitment.cost.value(), Some(commitment.currency.as_str()));
        self.put_timestamp(&mut doc, "lifetime_start", Some(commitment.lifetime_start));
        self.put_timestamp(&mut doc, "lifetime_end", Some(commitment.lifetime_end));

        Ok(Value::Object(doc))
    }

    fn record_id(&self, record: &FocusCostRecord) -> String {
        if let Some(field) = &self.context.user_id_field {
            if let Some(value) = self.extract_user_id_field(record, field) {
                if !value.is_empty() {
                    return format!("urn:focus:cost:{value}");
                }
            }
        }
        let body = hashed_id_body(
            &record.billing_account_id,
            record.charge_period_start,
            &record.resource_id,
        );
        format!("urn:focus:cost:{body}")
    }

    fn extract_user_id_field(&self, record: &FocusCostRecord, field: &str) -> Option<String> {
        match field {
            "billing_account_id" => Some(record.billing_account_id.clone()),
            "resource_id" => Some(record.resource_id.clone()),
            "invoice_id" => Some(record.invoice_id.clone()),
            other => record.extended_columns.get(other).cloned(),
        }
    }

    fn put_string(&self, doc: &mut Map<String, Value>, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let ns = field_namespace(field);
        doc.insert(format!("{ns}:{field}"), json!(value));
    }

    fn put_deprecated_string(&self, doc: &mut Map<String, Value>, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let superseded_by = DEPRECATED_FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, target)| *target)
            .unwrap_or(field);
        doc.insert(
            format!("focus:{field}"),
            json!({
                "@value": value,
                "schema:supersededBy": format!("focus:{superseded_by}"),
            }),
        );
    }

    fn put_number(&self, doc: &mut Map<String, Value>, field: &str, value: f64) {
        if value == 0.0 {
            return;
        }
        let ns = field_namespace(field);
        doc.insert(format!("{ns}:{field}"), json!(value));
    }

    fn put_enum(&self, doc: &mut Map<String, Value>, field: &str, wire_value: &str) {
        if wire_value == "unspecified" {
            return;
        }
        let ns = field_namespace(field);
        doc.insert(
            format!("{ns}:{field}"),
            enum_value(ns, field, wire_value, self.context.enum_mode),
        );
    }

    fn put_timestamp(&self, doc: &mut Map<String, Value>, field: &str, value: Option<DateTime<Utc>>) {
        let Some(value) = value else { return };
        let ns = field_namespace(field);
        doc.insert(format!("{ns}:{field}"), timestamp_value(value));
    }

    fn put_money(&self, doc: &mut Map<String, Value>, field: &str, amount: f64, currency: Option<&str>) {
        if amount == 0.0 {
            return;
        }
        let ns = field_namespace(field);
        doc.insert(format!("{ns}:{field}"), money_value(ns, amount, currency));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use costsource_core::vocabulary::{ChargeCategory, PricingCategory, ServiceCategory};
    use costsource_core::{Currency, Money};
    use std::collections::HashMap;

    fn sample_record() -> FocusCostRecord {
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
            contracted_cost: Money::new(125.50).unwrap(),
            list_cost: None,
            effective_cost: None,
            billed_cost: Money::new(125.50).unwrap(),
            contracted_unit_price: None,
            list_unit_price: None,
            usage_quantity: 720.0,
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
            resource_id: "i-0abcd1234".into(),
            resource_name: String::new(),
            resource_type: String::new(),
            region_id: String::new(),
            region_name: String::new(),
            availability_zone: String::new(),
            tags: HashMap::new(),
            extended_columns: HashMap::new(),
        }
    }

    #[test]
    fn id_derivation_is_deterministic() {
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let record = sample_record();
        let a = serializer.serialize_record(&record).unwrap();
        let b = serializer.serialize_record(&record).unwrap();
        assert_eq!(a["@id"], b["@id"]);
        assert!(a["@id"].as_str().unwrap().starts_with("urn:focus:cost:"));
    }

    #[test]
    fn user_id_field_overrides_hash_derivation() {
        let context = JsonLdContext::new().with_user_id_field("resource_id");
        let serializer = JsonLdSerializer::new(context);
        let doc = serializer.serialize_record(&sample_record()).unwrap();
        assert_eq!(doc["@id"], json!("urn:focus:cost:i-0abcd1234"));
    }

    #[test]
    fn cost_fields_use_schema_monetary_amount() {
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&sample_record()).unwrap();
        assert_eq!(doc["schema:billed_cost"]["@type"], json!("schema:MonetaryAmount"));
        assert_eq!(doc["schema:billed_cost"]["schema:value"], json!(125.50));
        assert_eq!(doc["schema:billed_cost"]["schema:currency"], json!("USD"));
    }

    #[test]
    fn zero_cost_is_omitted_even_for_mandatory_fields() {
        let mut record = sample_record();
        record.contracted_cost = Money::new(0.0).unwrap();
        record.billed_cost = Money::new(0.0).unwrap();
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&record).unwrap();
        assert!(doc.get("schema:contracted_cost").is_none());
        assert!(doc.get("schema:billed_cost").is_none());
    }

    #[test]
    fn empty_fields_are_omitted() {
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&sample_record()).unwrap();
        assert!(doc.get("focus:resource_name").is_none());
        assert!(doc.get("focus:tags").is_none());
    }

    #[test]
    fn timestamps_are_bare_rfc3339_strings() {
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&sample_record()).unwrap();
        assert_eq!(doc["schema:charge_period_start"], json!("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn unspecified_enum_is_omitted_but_set_enum_appears() {
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&sample_record()).unwrap();
        assert!(doc.get("focus:charge_class").is_none());
        assert_eq!(doc["focus:charge_category"], json!("usage"));
    }

    #[test]
    fn iri_enum_mode_qualifies_the_value() {
        let context = JsonLdContext::new().with_enum_mode(EnumMode::Iri);
        let serializer = JsonLdSerializer::new(context);
        let doc = serializer.serialize_record(&sample_record()).unwrap();
        assert!(doc["focus:charge_category"]
            .as_str()
            .unwrap()
            .starts_with("https://focus.finops.org/v1#"));
    }

    #[test]
    fn deprecated_field_carries_superseded_by_annotation() {
        let mut record = sample_record();
        record.provider_name = "Amazon Web Services".into();
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&record).unwrap();
        assert_eq!(
            doc["focus:provider_name"]["schema:supersededBy"],
            json!("focus:invoice_issuer_name")
        );
    }

    #[test]
    fn malformed_iri_is_rejected_before_any_output() {
        let result = JsonLdContext::new().with_prefix("bad", "not-a-url");
        assert!(result.is_err());
    }

    #[test]
    fn tags_serialize_as_property_value_array() {
        let mut record = sample_record();
        record.tags.insert("env".into(), "prod".into());
        let serializer = JsonLdSerializer::new(JsonLdContext::new());
        let doc = serializer.serialize_record(&record).unwrap();
        let tags = doc["focus:tags"].as_array().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0]["schema:name"], json!("env"));
        assert_eq!(tags[0]["schema:value"], json!("prod"));
    }
}
