use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Installs the global Prometheus recorder and returns the handle `/metrics` renders.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full("prediction_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )?
        .install_recorder()?;

    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    metrics::describe_counter!("predictions_total", "Classifications by outcome");
    metrics::describe_histogram!(
        "prediction_duration_seconds",
        "Time spent decoding, preprocessing and running the network"
    );

    tracing::info!("Prometheus metrics initialized");
    Ok(handle)
}
