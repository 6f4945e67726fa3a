use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use cnpg_broker_models::{
    BindingResponse, EmptyResponse, ErrorResponse, InstanceResponse, ProvisionRequest,
    ProvisionResponse, UpdateRequest,
};
use cnpg_broker_orchestrations::{BrokerError, Catalog, InstanceOrchestrator, ProvisionOutcome};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, BasicAuth};
use crate::metrics::{metrics_handler, track_metrics, BrokerMetrics};

/// Shared API state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<InstanceOrchestrator>,
    /// Basic auth for `/v2`; `None` leaves the API open
    pub auth: Option<Arc<BasicAuth>>,
    pub metrics: Arc<BrokerMetrics>,
}

impl FromRef<AppState> for Arc<BrokerMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let mut broker = Router::new()
        .route("/v2/catalog", get(get_catalog))
        .route(
            "/v2/service_instances/:instance_id",
            put(provision_instance)
                .get(get_instance)
                .delete(deprovision_instance)
                .patch(update_instance),
        )
        .route(
            "/v2/service_instances/:instance_id/service_bindings/:binding_id",
            put(bind_instance).get(get_binding).delete(unbind_instance),
        );

    if let Some(auth) = state.auth.clone() {
        broker = broker.route_layer(middleware::from_fn_with_state(auth, auth_middleware));
    }

    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics_handler))
        .merge(broker)
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server and run until Ctrl+C
pub async fn start_server(port: u16, state: AppState) -> Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("✓ Broker listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down...");
}

// ============================================================================
// Health Check
// ============================================================================

async fn health_check(State(state): State<AppState>) -> Response {
    match state.orchestrator.health().await {
        Ok(()) => Json(serde_json::json!({
            "status": "healthy",
            "service": "cnpg-broker",
            "version": env!("CARGO_PKG_VERSION")
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

async fn get_catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.orchestrator.catalog().clone())
}

// ============================================================================
// Service Instances
// ============================================================================

async fn provision_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProvisionResponse>), AppError> {
    let Json(req) = body?;

    let outcome = state
        .orchestrator
        .provision_instance(&instance_id, &req.service_id, &req.plan_id, req.context.as_ref())
        .await?;

    let status = match outcome {
        ProvisionOutcome::Created => StatusCode::CREATED,
        ProvisionOutcome::AlreadyProvisioned => StatusCode::OK,
    };
    Ok((status, Json(ProvisionResponse { instance_id })))
}

async fn get_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<InstanceResponse>, AppError> {
    Ok(Json(state.orchestrator.get_instance(&instance_id).await?))
}

async fn deprovision_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<EmptyResponse>, AppError> {
    state.orchestrator.deprovision_instance(&instance_id).await?;
    Ok(Json(EmptyResponse {}))
}

async fn update_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, AppError> {
    let Json(req) = body?;

    state
        .orchestrator
        .update_instance(&instance_id, &req.service_id, req.plan_id.as_deref())
        .await?;
    Ok(Json(EmptyResponse {}))
}

// ============================================================================
// Service Bindings
// ============================================================================

async fn bind_instance(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<BindingResponse>), AppError> {
    let credentials = state
        .orchestrator
        .bind_instance(&instance_id, &binding_id)
        .await?;
    Ok((StatusCode::CREATED, Json(BindingResponse { credentials })))
}

async fn get_binding(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> Result<Json<BindingResponse>, AppError> {
    let credentials = state
        .orchestrator
        .get_binding(&instance_id, &binding_id)
        .await?;
    Ok(Json(BindingResponse { credentials }))
}

async fn unbind_instance(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> Result<Json<EmptyResponse>, AppError> {
    state
        .orchestrator
        .unbind_instance(&instance_id, &binding_id)
        .await?;
    Ok(Json(EmptyResponse {}))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Validation(e) => AppError::BadRequest(e.to_string()),
            BrokerError::NotFound(msg) => AppError::NotFound(msg),
            BrokerError::Conflict(msg) => AppError::Conflict(msg),
            BrokerError::Unprocessable(msg) => AppError::Unprocessable(msg),
            BrokerError::Platform(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, description) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            description,
        });

        (status, body).into_response()
    }
}
