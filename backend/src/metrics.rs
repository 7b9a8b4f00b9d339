//! Prometheus instruments and the `/metrics` scrape endpoint.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::web_server::AppState;

const LABELS: &[&str] = &["method", "path", "status"];

/// Instruments are registered once, on a registry owned by this value.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("minitwit_http_requests_total", "HTTP requests served"),
            LABELS,
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "minitwit_http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            LABELS,
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency,
        })
    }

    pub fn observe(&self, method: &str, path: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        let labels = [method, path, status.as_str()];
        self.requests.with_label_values(&labels[..]).inc();
        self.latency.with_label_values(&labels[..]).observe(seconds);
    }

    /// Text exposition format, as scraped by Prometheus.
    pub fn render(&self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::InternalServerError(format!("Failed to encode metrics: {e}")))?;
        String::from_utf8(buffer)
            .map_err(|e| AppError::InternalServerError(format!("Metrics are not UTF-8: {e}")))
    }
}

/// Counts and times every routed request, labelled by the route template
/// (`/{username}`) rather than the concrete path.
pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    state.metrics.observe(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
