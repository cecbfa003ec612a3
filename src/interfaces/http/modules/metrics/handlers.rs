//! Prometheus scrape endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// `GET /metrics`, Prometheus text exposition format
pub async fn render_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

/// Register help text for the booking and waiting room series.
pub fn describe_booking_metrics() {
    metrics::describe_counter!(
        "reservations_created_total",
        "Seat holds successfully placed"
    );
    metrics::describe_counter!(
        "reservations_expired_total",
        "Holds that lapsed and returned their seats"
    );
    metrics::describe_counter!(
        "seat_conflicts_total",
        "Hold attempts rejected because a seat was taken"
    );
    metrics::describe_counter!(
        "purchases_completed_total",
        "Checkouts that issued tickets"
    );
    metrics::describe_counter!(
        "waiting_room_promotions_total",
        "Users moved from a waiting room queue into a session"
    );
    metrics::describe_gauge!("waiting_room_queued", "Users queued per event");
    metrics::describe_gauge!("waiting_room_active", "Live sessions per event");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency by route"
    );
}
