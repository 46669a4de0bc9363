use crate::error::ErrorReport;
use axum::{extract::MatchedPath, extract::Request, middleware::Next, response::Response};
use std::time::Instant;

fn redact_bearer(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while let Some(pos) = input[i..].find("Bearer ") {
        let abs = i + pos;
        out.push_str(&input[i..abs]);
        out.push_str("Bearer [REDACTED]");
        let token_start = abs + "Bearer ".len();
        let token_end = input[token_start..]
            .find(|c: char| c.is_whitespace())
            .map(|p| token_start + p)
            .unwrap_or(input.len());
        i = token_end;
    }
    out.push_str(&input[i..]);
    out
}

/// Counts requests per route and status, times them, and logs any error report
/// attached to the response.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(started.elapsed().as_secs_f64());

    if let Some(report) = response.extensions().get::<ErrorReport>() {
        tracing::error!(
            error_id = %report.id,
            status = report.status_code,
            code = %report.public_code,
            summary = %redact_bearer(&report.summary),
            "Request failed"
        );
    }

    response
}
