//! Prometheus metrics for posts-service.
//!
//! Exposes content collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Posts successfully published.
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "posts_created_total",
        "Total posts created"
    )
    .expect("failed to register posts_created_total");

    /// Edit attempts by outcome (success/forbidden/invalid/not_found).
    pub static ref POST_EDITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_edits_total",
        "Post edit attempts segmented by outcome",
        &["result"]
    )
    .expect("failed to register post_edits_total");

    /// Comment submissions by outcome (success/invalid/not_found).
    pub static ref COMMENTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "comments_created_total",
        "Comment submissions segmented by outcome",
        &["result"]
    )
    .expect("failed to register comments_created_total");

    /// HTTP request latency by method.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration segmented by method",
        &["method"]
    )
    .expect("failed to register http_request_duration_seconds");
}

pub fn observe_request(method: &str, seconds: f64) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(seconds);
}

pub fn record_edit(result: &str) {
    POST_EDITS_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_comment(result: &str) {
    COMMENTS_CREATED_TOTAL.with_label_values(&[result]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
