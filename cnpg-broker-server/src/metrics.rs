//! Prometheus metrics for the broker API

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Request metrics, registered on a registry owned by the broker
pub struct BrokerMetrics {
    registry: Registry,

    /// Requests by method, route template and status code
    pub requests_total: IntCounterVec,

    pub request_duration_seconds: HistogramVec,
}

impl BrokerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("cnpg_broker".to_string()), None)?;

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests handled"),
            &["method", "route", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method", "route"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
        })
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        self.requests_total
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[method, route])
            .observe(duration_secs);
    }

    /// Metrics in Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(metrics): State<Arc<BrokerMetrics>>) -> Response {
    match metrics.export() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Count and time every routed request, labelled by its route template
pub async fn track_metrics(
    State(metrics): State<Arc<BrokerMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    metrics.record_request(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
