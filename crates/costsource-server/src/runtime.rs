//! Binds one port and answers native gRPC, grpc-web, and Connect-style
//! JSON against a single [`CostSourcePlugin`] (spec.md §4.6).
//!
//! The three transports share one listener because all three speak the
//! same RPC paths (`/costsource.v1.CostSource/<Method>`); what differs
//! is `Content-Type`. The fallback handler below inspects it once per
//! request and either forwards into the embedded tonic service
//! unchanged (native gRPC, grpc-web) or decodes/encodes the same
//! generated message types as JSON itself (Connect).

use crate::capability::CapabilityRegistry;
use crate::config::{CorsPolicy, ServerConfig};
use crate::convert;
use crate::health::{HealthChecker, HealthStatus};
use crate::plugin::CostSourcePlugin;
use crate::proto;
use crate::proto::cost_source_server::{CostSource, CostSourceServer};
use crate::state::LifecycleTracker;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::FutureExt;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tonic::{Request as TonicRequest, Response as TonicResponse, Status};
use tower::util::BoxCloneService;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

fn status_from_error(err: costsource_core::error::CostSourceError) -> Status {
    use costsource_core::error::CostSourceError as E;
    match err {
        E::InvalidArgument(m) => Status::invalid_argument(m),
        E::NotFound(m) => Status::not_found(m),
        E::Unimplemented(m) => Status::unimplemented(m),
        E::Unavailable(m) => Status::unavailable(m),
        E::ResourceExhausted(m) => Status::resource_exhausted(m),
        E::Internal(m) => Status::internal(m),
        E::Cancelled(m) => Status::cancelled(m),
        E::Validation(v) => Status::invalid_argument(v.message),
    }
}

/// Adapts [`CostSourcePlugin`] onto the tonic-generated `CostSource`
/// trait; also called directly by the Connect-JSON handlers so both
/// transports run the exact same request path.
pub struct GrpcAdapter<P: CostSourcePlugin + 'static> {
    plugin: Arc<P>,
    capabilities: Arc<CapabilityRegistry>,
    lifecycle: Arc<LifecycleTracker>,
}

impl<P: CostSourcePlugin + 'static> Clone for GrpcAdapter<P> {
    fn clone(&self) -> Self {
        Self {
            plugin: self.plugin.clone(),
            capabilities: self.capabilities.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

impl<P: CostSourcePlugin + 'static> GrpcAdapter<P> {
    fn new(plugin: Arc<P>, capabilities: Arc<CapabilityRegistry>, lifecycle: Arc<LifecycleTracker>) -> Self {
        Self { plugin, capabilities, lifecycle }
    }
}

#[tonic::async_trait]
impl<P: CostSourcePlugin + 'static> CostSource for GrpcAdapter<P> {
    async fn name(
        &self,
        _request: TonicRequest<proto::NameRequest>,
    ) -> Result<TonicResponse<proto::NameResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        Ok(TonicResponse::new(proto::NameResponse { name: self.plugin.name().to_string() }))
    }

    async fn get_plugin_info(
        &self,
        _request: TonicRequest<proto::GetPluginInfoRequest>,
    ) -> Result<TonicResponse<proto::GetPluginInfoResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let info = self.plugin.get_plugin_info().await.map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::GetPluginInfoResponse {
            name: info.name,
            implementation_version: info.implementation_version,
            spec_version: info.spec_version,
            providers: info.providers,
            metadata: info.metadata,
        }))
    }

    async fn supports(
        &self,
        request: TonicRequest<proto::SupportsRequest>,
    ) -> Result<TonicResponse<proto::SupportsResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        let resource = req.resource.ok_or_else(|| Status::invalid_argument("`resource` is required"))?;
        let resource = convert::resource_from_proto(&resource);
        let outcome = self.plugin.supports(&resource).await.map_err(status_from_error)?;
        let view = self.capabilities.resolve_for_resource(outcome.capabilities.clone());
        Ok(TonicResponse::new(convert::supports_outcome_to_proto(&outcome, &view)))
    }

    async fn get_actual_cost(
        &self,
        request: TonicRequest<proto::GetActualCostRequest>,
    ) -> Result<TonicResponse<proto::GetActualCostResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        let window = convert::parse_charge_window(&req.start, &req.end).map_err(status_from_error)?;
        let records = self
            .plugin
            .get_actual_cost(&req.resource_id, window, &req.tags, req.arn.as_deref())
            .await
            .map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::GetActualCostResponse {
            records: records.iter().map(convert::record_to_proto).collect(),
        }))
    }

    async fn get_projected_cost(
        &self,
        request: TonicRequest<proto::GetProjectedCostRequest>,
    ) -> Result<TonicResponse<proto::GetProjectedCostResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        let resource = req.resource.ok_or_else(|| Status::invalid_argument("`resource` is required"))?;
        let resource = convert::resource_from_proto(&resource);
        let projected = self.plugin.get_projected_cost(&resource).await.map_err(status_from_error)?;
        Ok(TonicResponse::new(convert::projected_cost_to_proto(&projected)))
    }

    async fn get_pricing_spec(
        &self,
        request: TonicRequest<proto::GetPricingSpecRequest>,
    ) -> Result<TonicResponse<proto::GetPricingSpecResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        let resource = req.resource.ok_or_else(|| Status::invalid_argument("`resource` is required"))?;
        let resource = convert::resource_from_proto(&resource);
        let spec = self.plugin.get_pricing_spec(&resource).await.map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::GetPricingSpecResponse { pricing_spec_json: spec.to_string() }))
    }

    async fn estimate_cost(
        &self,
        request: TonicRequest<proto::EstimateCostRequest>,
    ) -> Result<TonicResponse<proto::EstimateCostResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        convert::require_well_formed_resource_type(&req.resource_type).map_err(status_from_error)?;
        let (cost, currency) = self
            .plugin
            .estimate_cost(&req.resource_type, &req.attributes)
            .await
            .map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::EstimateCostResponse {
            monthly_cost: cost.value(),
            currency: currency.as_str().to_string(),
        }))
    }

    async fn get_recommendations(
        &self,
        request: TonicRequest<proto::GetRecommendationsRequest>,
    ) -> Result<TonicResponse<proto::GetRecommendationsResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        let filter = req.filter.as_ref().map(convert::recommendation_filter_from_proto);
        let recs = self.plugin.get_recommendations(filter.as_ref()).await.map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::GetRecommendationsResponse {
            recommendations: recs.iter().map(convert::recommendation_to_proto).collect(),
        }))
    }

    async fn get_budgets(
        &self,
        request: TonicRequest<proto::GetBudgetsRequest>,
    ) -> Result<TonicResponse<proto::GetBudgetsResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        let filter = req.filter.as_ref().map(convert::budget_filter_from_proto);
        let budgets = self.plugin.get_budgets(filter.as_ref()).await.map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::GetBudgetsResponse {
            budgets: budgets.iter().map(convert::budget_to_proto).collect(),
        }))
    }

    async fn dismiss_recommendation(
        &self,
        request: TonicRequest<proto::DismissRecommendationRequest>,
    ) -> Result<TonicResponse<proto::DismissRecommendationResponse>, Status> {
        let _guard = self.lifecycle.enter_rpc();
        let req = request.into_inner();
        self.plugin
            .dismiss_recommendation(&req.id, req.reason.as_deref())
            .await
            .map_err(status_from_error)?;
        Ok(TonicResponse::new(proto::DismissRecommendationResponse {}))
    }
}

type BoxedHttpService = BoxCloneService<Request, Response, Infallible>;

struct RuntimeState<P: CostSourcePlugin + 'static> {
    adapter: GrpcAdapter<P>,
    grpc_service: std::sync::Mutex<BoxedHttpService>,
    health_checker: Option<Arc<dyn HealthChecker>>,
    lifecycle: Arc<LifecycleTracker>,
    config: ServerConfig,
}

fn build_grpc_service<P: CostSourcePlugin + 'static>(adapter: GrpcAdapter<P>) -> BoxedHttpService {
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    tokio::spawn(async move {
        health_reporter
            .set_serving::<CostSourceServer<GrpcAdapter<P>>>()
            .await;
    });

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build_v1()
        .expect("file descriptor set embedded at build time is well-formed");

    let routes = tonic::service::Routes::new(CostSourceServer::new(adapter))
        .add_service(health_service)
        .add_service(reflection_service);

    let grpc_web = tonic_web::enable(routes)
        .map_request(|req: Request| req.map(tonic::body::boxed))
        .map_response(|res: axum::http::Response<tonic::body::BoxBody>| res.map(axum::body::Body::new))
        .map_err(|_: Box<dyn std::error::Error + Send + Sync>| -> Infallible {
            unreachable!("tonic Routes service never produces an error")
        });

    BoxCloneService::new(grpc_web)
}

fn is_grpc_content_type(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/grpc"))
        .unwrap_or(false)
}

async fn dispatch<P: CostSourcePlugin + 'static>(
    State(state): State<Arc<RuntimeState<P>>>,
    req: Request,
) -> Response {
    if is_grpc_content_type(&req) {
        let _guard = state.lifecycle.enter_rpc();
        let svc = state.grpc_service.lock().unwrap().clone();
        return match svc.oneshot(req).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        };
    }

    let _guard = state.lifecycle.enter_rpc();
    connect_json::dispatch(&state.adapter, req).await
}

async fn health_handler<P: CostSourcePlugin + 'static>(State(state): State<Arc<RuntimeState<P>>>) -> Response {
    let status = match &state.health_checker {
        Some(checker) => match tokio::time::timeout(state.config.health_check_timeout, checker.check()).await {
            Ok(status) => status,
            Err(_) => HealthStatus::unhealthy("health check timed out"),
        },
        None => HealthStatus::default_healthy(),
    };
    let code = if status.healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status)).into_response()
}

fn build_cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Disabled => CorsLayer::new(),
        CorsPolicy::AllowOrigins(origins) => {
            let parsed = origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect::<Vec<_>>();
            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
    }
}

/// Connect-style JSON: same RPC paths and same generated message types
/// as gRPC, encoded as JSON instead of protobuf (spec.md §4.6).
mod connect_json {
    use super::*;

    fn error_response(status: Status) -> Response {
        let http_code = match status.code() {
            tonic::Code::InvalidArgument => StatusCode::BAD_REQUEST,
            tonic::Code::NotFound => StatusCode::NOT_FOUND,
            tonic::Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            tonic::Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            tonic::Code::ResourceExhausted => StatusCode::PAYLOAD_TOO_LARGE,
            tonic::Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let code_name = match status.code() {
            tonic::Code::InvalidArgument => "invalid_argument",
            tonic::Code::NotFound => "not_found",
            tonic::Code::Unimplemented => "unimplemented",
            tonic::Code::Unavailable => "unavailable",
            tonic::Code::ResourceExhausted => "resource_exhausted",
            tonic::Code::Cancelled => "cancelled",
            _ => "internal",
        };
        (http_code, Json(serde_json::json!({ "code": code_name, "message": status.message() }))).into_response()
    }

    async fn read_json<T: serde::de::DeserializeOwned + Default>(req: Request) -> Result<T, Response> {
        let bytes = match axum::body::to_bytes(req.into_body(), 1024 * 1024 * 8).await {
            Ok(b) => b,
            Err(e) => return Err(error_response(Status::invalid_argument(e.to_string()))),
        };
        if bytes.is_empty() {
            return Ok(T::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| error_response(Status::invalid_argument(e.to_string())))
    }

    fn ok_json<T: serde::Serialize>(value: T) -> Response {
        Json(value).into_response()
    }

    pub async fn dispatch<P: CostSourcePlugin + 'static>(adapter: &GrpcAdapter<P>, req: Request) -> Response {
        let method = req.uri().path().rsplit('/').next().unwrap_or_default().to_string();
        macro_rules! call {
            ($req_ty:ty, $method:ident) => {{
                let body: $req_ty = match read_json(req).await {
                    Ok(b) => b,
                    Err(resp) => return resp,
                };
                match adapter.$method(tonic::Request::new(body)).await {
                    Ok(resp) => ok_json(resp.into_inner()),
                    Err(status) => error_response(status),
                }
            }};
        }

        match method.as_str() {
            "Name" => call!(proto::NameRequest, name),
            "GetPluginInfo" => call!(proto::GetPluginInfoRequest, get_plugin_info),
            "Supports" => call!(proto::SupportsRequest, supports),
            "GetActualCost" => call!(proto::GetActualCostRequest, get_actual_cost),
            "GetProjectedCost" => call!(proto::GetProjectedCostRequest, get_projected_cost),
            "GetPricingSpec" => call!(proto::GetPricingSpecRequest, get_pricing_spec),
            "EstimateCost" => call!(proto::EstimateCostRequest, estimate_cost),
            "GetRecommendations" => call!(proto::GetRecommendationsRequest, get_recommendations),
            "GetBudgets" => call!(proto::GetBudgetsRequest, get_budgets),
            "DismissRecommendation" => call!(proto::DismissRecommendationRequest, dismiss_recommendation),
            other => error_response(Status::not_found(format!("unknown method `{other}`"))),
        }
    }
}

/// Owns a bound listener for exactly one [`CostSourcePlugin`]
/// implementation and drives it through its full lifecycle
/// (spec.md §4.6).
pub struct PluginServer<P: CostSourcePlugin + 'static> {
    plugin: Arc<P>,
    config: ServerConfig,
    health_checker: Option<Arc<dyn HealthChecker>>,
    lifecycle: Arc<LifecycleTracker>,
}

impl<P: CostSourcePlugin + 'static> PluginServer<P> {
    pub fn new(plugin: P, config: ServerConfig) -> Self {
        Self {
            plugin: Arc::new(plugin),
            config,
            health_checker: None,
            lifecycle: Arc::new(LifecycleTracker::new()),
        }
    }

    pub fn with_health_checker(mut self, checker: Arc<dyn HealthChecker>) -> Self {
        self.health_checker = Some(checker);
        self
    }

    pub fn lifecycle(&self) -> Arc<LifecycleTracker> {
        self.lifecycle.clone()
    }

    /// Binds the configured port and serves until `ctrl_c`.
    pub async fn serve(self) -> std::io::Result<()> {
        self.serve_until(tokio::signal::ctrl_c().map(|_| ())).await
    }

    /// Binds the configured port and serves until `shutdown` resolves,
    /// then drains in-flight RPCs for up to `shutdown_deadline` before
    /// closing (spec.md §4.6 lifecycle).
    pub async fn serve_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let port = self.config.resolved_port();
        if port == 0 {
            self.lifecycle.mark_terminated();
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "no listen port configured: set one of {:?}_PLUGIN_PORT or pass ServerConfig::with_port",
                    crate::config::ENV_PREFIXES
                ),
            ));
        }

        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let bound_port = listener.local_addr()?.port();
        self.lifecycle.mark_listening(bound_port);

        // Stable single-line stdout announcement a parent process reads
        // to learn which port this plugin bound, as a key=value pair
        // keyed on the canonical env prefix (spec.md §4.6, §6).
        println!("{}_PLUGIN_PORT={bound_port}", crate::config::ENV_PREFIXES[0]);

        let capabilities = Arc::new(CapabilityRegistry::new(self.plugin.declared_capabilities()));
        let adapter = GrpcAdapter::new(self.plugin.clone(), capabilities, self.lifecycle.clone());
        let grpc_service = build_grpc_service(adapter.clone());

        let state = Arc::new(RuntimeState {
            adapter,
            grpc_service: std::sync::Mutex::new(grpc_service),
            health_checker: self.health_checker.clone(),
            lifecycle: self.lifecycle.clone(),
            config: self.config.clone(),
        });

        let app = Router::new()
            .route("/healthz", get(health_handler::<P>))
            .fallback(dispatch::<P>)
            .layer(build_cors_layer(&self.config.cors))
            .layer(RequestBodyLimitLayer::new(self.config.max_payload_bytes))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        self.lifecycle.mark_serving();

        let lifecycle = self.lifecycle.clone();
        let shutdown_deadline = self.config.shutdown_deadline;
        let shutdown_with_drain = async move {
            shutdown.await;
            lifecycle.mark_draining();
            let started = tokio::time::Instant::now();
            while lifecycle.in_flight() > 0 && started.elapsed() < shutdown_deadline {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_with_drain)
            .await?;

        self.lifecycle.mark_terminated();
        Ok(())
    }
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "recovered panic in RPC handler");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "code": "internal", "message": "internal error" })),
    )
        .into_response()
}
