//! Typed wrapper over the generated gRPC client: resolves a deadline
//! per call, maps `tonic::Status` back onto [`CostSourceError`], and
//! decodes every response into the domain types from
//! `costsource-core` (spec.md §4.6, §5).

use crate::convert;
use crate::types::{Budget, ProjectedCost, SupportsOutcome};
use costsource_core::error::{CostSourceError, Result};
use costsource_core::model::{FocusCostRecord, PluginInfo, Recommendation, ResourceDescriptor};
use costsource_core::vocabulary::RecommendationCategory;
use costsource_core::Money;
use costsource_proto::costsource as proto;
use proto::cost_source_client::CostSourceClient as GeneratedClient;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

/// The built-in fallback when neither a call-level deadline nor
/// [`ClientConfig::default_timeout`] is set (spec.md §5 "Timeouts").
pub const BUILT_IN_DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct RecommendationFilter {
    pub categories: Vec<RecommendationCategory>,
    pub resource_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub account_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub default_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { default_timeout: BUILT_IN_DEFAULT_TIMEOUT }
    }
}

fn status_to_error(status: Status) -> CostSourceError {
    match status.code() {
        tonic::Code::InvalidArgument => CostSourceError::InvalidArgument(status.message().to_string()),
        tonic::Code::NotFound => CostSourceError::NotFound(status.message().to_string()),
        tonic::Code::Unimplemented => CostSourceError::Unimplemented(status.message().to_string()),
        tonic::Code::Unavailable => CostSourceError::Unavailable(status.message().to_string()),
        tonic::Code::ResourceExhausted => CostSourceError::ResourceExhausted(status.message().to_string()),
        tonic::Code::Cancelled | tonic::Code::DeadlineExceeded => {
            CostSourceError::Cancelled(status.message().to_string())
        }
        _ => CostSourceError::Internal(status.message().to_string()),
    }
}

/// A typed RPC client for one CostSource plugin endpoint.
///
/// Deadline precedence per call: the `deadline` argument, if given,
/// wins; otherwise [`ClientConfig::default_timeout`]; otherwise
/// [`BUILT_IN_DEFAULT_TIMEOUT`] (spec.md §5).
#[derive(Clone)]
pub struct CostSourceClient {
    inner: GeneratedClient<Channel>,
    config: ClientConfig,
}

impl CostSourceClient {
    pub async fn connect(endpoint: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let endpoint = Endpoint::from_shared(endpoint.into())
            .map_err(|e| CostSourceError::InvalidArgument(e.to_string()))?;
        let channel = endpoint.connect().await.map_err(|e| CostSourceError::Unavailable(e.to_string()))?;
        Ok(Self { inner: GeneratedClient::new(channel), config })
    }

    /// Wraps an already-connected channel, e.g. one built with custom
    /// TLS settings that [`Self::connect`] does not expose.
    pub fn from_channel(channel: Channel, config: ClientConfig) -> Self {
        Self { inner: GeneratedClient::new(channel), config }
    }

    fn resolve_timeout(&self, deadline: Option<Duration>) -> Duration {
        deadline.unwrap_or(self.config.default_timeout)
    }

    async fn call<Req, Resp, F, Fut>(&self, deadline: Option<Duration>, request: Req, f: F) -> Result<Resp>
    where
        F: FnOnce(GeneratedClient<Channel>, tonic::Request<Req>) -> Fut,
        Fut: Future<Output = std::result::Result<tonic::Response<Resp>, Status>>,
    {
        let timeout = self.resolve_timeout(deadline);
        let client = self.inner.clone();
        match tokio::time::timeout(timeout, f(client, tonic::Request::new(request))).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => Err(status_to_error(status)),
            Err(_) => Err(CostSourceError::Cancelled(format!("RPC exceeded the {timeout:?} deadline"))),
        }
    }

    pub async fn name(&self, deadline: Option<Duration>) -> Result<String> {
        let resp = self
            .call(deadline, proto::NameRequest {}, |mut c, r| async move { c.name(r).await })
            .await?;
        Ok(resp.name)
    }

    pub async fn get_plugin_info(&self, deadline: Option<Duration>) -> Result<PluginInfo> {
        let resp = self
            .call(deadline, proto::GetPluginInfoRequest {}, |mut c, r| async move { c.get_plugin_info(r).await })
            .await?;
        Ok(convert::plugin_info_from_proto(resp))
    }

    pub async fn supports(
        &self,
        resource: &ResourceDescriptor,
        deadline: Option<Duration>,
    ) -> Result<SupportsOutcome> {
        let req = proto::SupportsRequest { resource: Some(convert::resource_to_proto(resource)) };
        let resp = self.call(deadline, req, |mut c, r| async move { c.supports(r).await }).await?;
        Ok(convert::supports_outcome_from_proto(resp))
    }

    pub async fn get_actual_cost(
        &self,
        resource_id: &str,
        window: (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>),
        tags: &HashMap<String, String>,
        arn: Option<&str>,
        deadline: Option<Duration>,
    ) -> Result<Vec<FocusCostRecord>> {
        let req = proto::GetActualCostRequest {
            resource_id: resource_id.to_string(),
            start: window.0.to_rfc3339(),
            end: window.1.to_rfc3339(),
            tags: tags.clone(),
            arn: arn.map(str::to_string),
        };
        let resp = self.call(deadline, req, |mut c, r| async move { c.get_actual_cost(r).await }).await?;
        resp.records.into_iter().map(convert::record_from_proto).collect()
    }

    pub async fn get_projected_cost(
        &self,
        resource: &ResourceDescriptor,
        deadline: Option<Duration>,
    ) -> Result<ProjectedCost> {
        let req = proto::GetProjectedCostRequest { resource: Some(convert::resource_to_proto(resource)) };
        let resp = self.call(deadline, req, |mut c, r| async move { c.get_projected_cost(r).await }).await?;
        convert::projected_cost_from_proto(resp)
    }

    pub async fn get_pricing_spec(
        &self,
        resource: &ResourceDescriptor,
        deadline: Option<Duration>,
    ) -> Result<serde_json::Value> {
        let req = proto::GetPricingSpecRequest { resource: Some(convert::resource_to_proto(resource)) };
        let resp = self.call(deadline, req, |mut c, r| async move { c.get_pricing_spec(r).await }).await?;
        serde_json::from_str(&resp.pricing_spec_json)
            .map_err(|e| CostSourceError::Internal(format!("server returned malformed pricing spec JSON: {e}")))
    }

    pub async fn estimate_cost(
        &self,
        resource_type: &str,
        attributes: &HashMap<String, String>,
        deadline: Option<Duration>,
    ) -> Result<(Money, costsource_core::Currency)> {
        let req = proto::EstimateCostRequest { resource_type: resource_type.to_string(), attributes: attributes.clone() };
        let resp = self.call(deadline, req, |mut c, r| async move { c.estimate_cost(r).await }).await?;
        let currency = costsource_core::Currency::new(resp.currency).map_err(CostSourceError::Validation)?;
        Ok((Money::new(resp.monthly_cost).map_err(CostSourceError::Validation)?, currency))
    }

    pub async fn get_recommendations(
        &self,
        filter: Option<&RecommendationFilter>,
        deadline: Option<Duration>,
    ) -> Result<Vec<Recommendation>> {
        let req = proto::GetRecommendationsRequest {
            filter: filter.map(|f| proto::RecommendationFilter {
                categories: f.categories.iter().map(|c| c.as_str().to_string()).collect(),
                resource_id: f.resource_id.clone(),
            }),
        };
        let resp = self.call(deadline, req, |mut c, r| async move { c.get_recommendations(r).await }).await?;
        resp.recommendations.into_iter().map(convert::recommendation_from_proto).collect()
    }

    pub async fn get_budgets(&self, filter: Option<&BudgetFilter>, deadline: Option<Duration>) -> Result<Vec<Budget>> {
        let req = proto::GetBudgetsRequest {
            filter: filter.map(|f| proto::BudgetFilter { account_id: f.account_id.clone() }),
        };
        let resp = self.call(deadline, req, |mut c, r| async move { c.get_budgets(r).await }).await?;
        resp.budgets.into_iter().map(convert::budget_from_proto).collect()
    }

    pub async fn dismiss_recommendation(
        &self,
        id: &str,
        reason: Option<&str>,
        deadline: Option<Duration>,
    ) -> Result<()> {
        let req = proto::DismissRecommendationRequest { id: id.to_string(), reason: reason.map(str::to_string) };
        self.call(deadline, req, |mut c, r| async move { c.dismiss_recommendation(r).await }).await?;
        Ok(())
    }

    /// Fans `get_actual_cost` out across `resources` with at most
    /// `max_concurrency` requests in flight, preserving input order in
    /// the result (spec.md §5 "batch fan-out").
    pub async fn get_actual_cost_batch(
        &self,
        resources: &[BatchActualCostRequest<'_>],
        max_concurrency: usize,
        deadline: Option<Duration>,
    ) -> Vec<BatchItem> {
        use futures::stream::StreamExt;

        futures::stream::iter(resources.iter().cloned())
            .map(|item| async move {
                let result = self
                    .get_actual_cost(item.resource_id, item.window, item.tags, item.arn, deadline)
                    .await;
                BatchItem { resource_id: item.resource_id.to_string(), records: None, error: None }
                    .with_result(result)
            })
            .buffered(max_concurrency.max(1))
            .collect()
            .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchActualCostRequest<'a> {
    pub resource_id: &'a str,
    pub window: (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>),
    pub tags: &'a HashMap<String, String>,
    pub arn: Option<&'a str>,
}

/// One slot of a batch result: exactly one of `records`/`error` is
/// `Some`, and slots stay in the order `resources` was given in.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub resource_id: String,
    pub records: Option<Vec<FocusCostRecord>>,
    pub error: Option<String>,
}

impl BatchItem {
    fn with_result(mut self, result: Result<Vec<FocusCostRecord>>) -> Self {
        match result {
            Ok(records) => self.records = Some(records),
            Err(e) => self.error = Some(e.to_string()),
        }
        self
    }
}
