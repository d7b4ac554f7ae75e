//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_access_denied, record_activity_dropped,
    record_api_key_validation, record_http_request, PrometheusMetrics,
};
