//! End-to-end coverage of [`costsource_server::PluginServer`]: the same
//! handler answering native gRPC (via `costsource-client`) and
//! Connect-style JSON (via a plain HTTP client) on one port
//! (spec.md §4.6).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use costsource_core::error::{CostSourceError, Result};
use costsource_core::model::{FocusCostRecord, PluginInfo, Recommendation, ResourceDescriptor};
use costsource_core::vocabulary::{ChargeCategory, PricingCategory, ServiceCategory};
use costsource_core::{Currency, Money};
use costsource_server::{CostSourcePlugin, ProjectedCost, RecommendationFilter, ServerConfig, SupportsOutcome};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;

struct FakePlugin;

fn sample_record() -> FocusCostRecord {
    FocusCostRecord {
        billing_account_id: "acct-1".into(),
        billing_account_name: String::new(),
        sub_account_id: String::new(),
        sub_account_name: String::new(),
        invoice_id: String::new(),
        invoice_issuer_name: "Acme Cloud".into(),
        service_category: ServiceCategory::Compute,
        service_name: "Elastic Compute".into(),
        service_subcategory: String::new(),
        publisher_name: String::new(),
        provider_name: String::new(),
        charge_category: ChargeCategory::Usage,
        charge_class: Default::default(),
        charge_frequency: Default::default(),
        charge_description: String::new(),
        charge_period_start: Utc::now(),
        charge_period_end: Utc::now(),
        billing_period_start: None,
        billing_period_end: None,
        pricing_unit: "hour".into(),
        pricing_quantity: 1.0,
        pricing_category: PricingCategory::Standard,
        billing_currency: Some(Currency::new("USD").unwrap()),
        contracted_cost: Money::new(12.5).unwrap(),
        list_cost: None,
        effective_cost: None,
        billed_cost: Money::new(12.5).unwrap(),
        contracted_unit_price: None,
        list_unit_price: None,
        usage_quantity: 24.0,
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
        resource_id: "i-abc123".into(),
        resource_name: String::new(),
        resource_type: "aws:ec2/instance:Instance".into(),
        region_id: "us-east-1".into(),
        region_name: String::new(),
        availability_zone: String::new(),
        tags: HashMap::new(),
        extended_columns: HashMap::new(),
    }
}

#[async_trait]
impl CostSourcePlugin for FakePlugin {
    fn name(&self) -> &str {
        "fake-plugin"
    }

    async fn supports(&self, _resource: &ResourceDescriptor) -> Result<SupportsOutcome> {
        Ok(SupportsOutcome {
            supported: true,
            reason: String::new(),
            capabilities: Default::default(),
        })
    }

    async fn get_actual_cost(
        &self,
        _resource_id: &str,
        _window: (DateTime<Utc>, DateTime<Utc>),
        _tags: &HashMap<String, String>,
        _arn: Option<&str>,
    ) -> Result<Vec<FocusCostRecord>> {
        Ok(vec![sample_record()])
    }

    async fn get_projected_cost(&self, _resource: &ResourceDescriptor) -> Result<ProjectedCost> {
        Ok(ProjectedCost {
            unit_price: Money::new(0.05).unwrap(),
            currency: Currency::new("USD").unwrap(),
            monthly_cost: Money::new(36.0).unwrap(),
            pricing_category: PricingCategory::Standard,
            spot_interruption_risk: 0.0,
        })
    }

    async fn get_pricing_spec(&self, _resource: &ResourceDescriptor) -> Result<serde_json::Value> {
        Ok(serde_json::json!({ "unit": "hour", "rate": 0.05 }))
    }

    async fn estimate_cost(
        &self,
        _resource_type: &str,
        _attributes: &HashMap<String, String>,
    ) -> Result<(Money, Currency)> {
        Ok((Money::new(36.0).unwrap(), Currency::new("USD").unwrap()))
    }

    async fn get_recommendations(&self, _filter: Option<&RecommendationFilter>) -> Result<Vec<Recommendation>> {
        Ok(Vec::new())
    }

    async fn get_plugin_info(&self) -> Result<PluginInfo> {
        Ok(PluginInfo {
            name: self.name().to_string(),
            implementation_version: "0.1.0".into(),
            spec_version: "v1.0.0".into(),
            providers: vec!["aws".into()],
            metadata: HashMap::new(),
        })
    }
}

async fn spawn_server(port: u16) -> (oneshot::Sender<()>, tokio::task::JoinHandle<std::io::Result<()>>) {
    let server = costsource_server::PluginServer::new(FakePlugin, ServerConfig::new().with_port(port));
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(server.serve_until(async move {
        let _ = rx.await;
    }));
    // Give the listener a moment to bind before the test sends traffic.
    tokio::time::sleep(Duration::from_millis(100)).await;
    (tx, handle)
}

#[tokio::test]
async fn grpc_client_round_trips_name_and_actual_cost() {
    let (shutdown, handle) = spawn_server(19081).await;

    let client = costsource_client::CostSourceClient::connect(
        "http://127.0.0.1:19081",
        costsource_client::ClientConfig::default(),
    )
    .await
    .expect("client connects to the freshly bound port");

    let name = client.name(None).await.expect("Name succeeds");
    assert_eq!(name, "fake-plugin");

    let records = client
        .get_actual_cost("i-abc123", (Utc::now(), Utc::now()), &HashMap::new(), None, None)
        .await
        .expect("GetActualCost succeeds");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resource_id, "i-abc123");

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn healthz_reports_default_healthy_without_a_health_checker() {
    let (shutdown, handle) = spawn_server(19082).await;

    let resp = reqwest::get("http://127.0.0.1:19082/healthz").await.expect("healthz is reachable");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.expect("healthz returns JSON");
    assert_eq!(body["healthy"], serde_json::Value::Bool(true));

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn connect_json_name_call_matches_grpc_name() {
    let (shutdown, handle) = spawn_server(19083).await;

    let client = reqwest::Client::new();
    let resp = client
        .post("http://127.0.0.1:19083/costsource.v1.CostSource/Name")
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .expect("Connect-JSON Name call succeeds");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "fake-plugin");

    let _ = shutdown.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn connect_json_unimplemented_rpc_reports_not_implemented() {
    let (shutdown, handle) = spawn_server(19084).await;

    let client = reqwest::Client::new();
    let resp = client
        .post("http://127.0.0.1:19084/costsource.v1.CostSource/DismissRecommendation")
        .header("content-type", "application/json")
        .body(r#"{"id":"rec-1"}"#)
        .send()
        .await
        .expect("Connect-JSON DismissRecommendation call completes");
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_IMPLEMENTED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "unimplemented");

    let _ = shutdown.send(());
    let _ = handle.await;
}
