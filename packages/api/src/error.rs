use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// Attached to the extensions of reported error responses.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub id: String,
    pub status_code: u16,
    pub public_code: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: &'static str,
    public_message: Option<String>,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
}

impl ApiError {
    fn new(
        status: StatusCode,
        public_code: &'static str,
        public_message: Option<String>,
        report_policy: ReportPolicy,
    ) -> Self {
        Self {
            status,
            public_code,
            public_message,
            report_policy,
            report_summary: None,
        }
    }

    fn with_report(mut self, summary: impl Into<String>) -> Self {
        self.report_summary = Some(summary.into());
        self
    }

    /// 500 whose message is meant for the client.
    pub fn failed(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Request failed: {}", msg);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "FAILED",
            Some(msg.clone()),
            ReportPolicy::Report,
        )
        .with_report(msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Not found: {}", msg);
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    /// Text the client would see in `error`.
    pub fn message(&self) -> &str {
        self.public_message.as_deref().unwrap_or(self.public_code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            success: bool,
            error: &'a str,
            code: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<&'a str>,
        }

        let public_message = self
            .public_message
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or("Error"));

        let error_id = (self.report_policy == ReportPolicy::Report)
            .then(|| uuid::Uuid::new_v4().simple().to_string());

        let mut response = (
            self.status,
            Json(ErrorBody {
                success: false,
                error: public_message,
                code: self.public_code,
                id: error_id.as_deref(),
            }),
        )
            .into_response();

        if let Some(id) = error_id {
            if let Ok(v) = HeaderValue::from_str(&id) {
                response.headers_mut().insert("x-error-id", v);
            }

            let report = ErrorReport {
                id,
                status_code: self.status.as_u16(),
                public_code: self.public_code.to_string(),
                summary: self
                    .report_summary
                    .clone()
                    .unwrap_or_else(|| public_message.to_string()),
            };
            response.extensions_mut().insert(report);
        }

        response
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!("JSON error: {:?}", err);
        Self::bad_request(format!("JSON error: {}", err))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!("Multipart error: {:?}", err);
        let status = err.status();
        let message = format!("Invalid multipart body: {}", err.body_text());
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, "PAYLOAD_TOO_LARGE", Some(message), ReportPolicy::Ignore)
        } else {
            Self::bad_request(message)
        }
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.public_message {
            Some(msg) => write!(f, "{}: {}", self.status, msg),
            None => write!(f, "{}: {}", self.status, self.public_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_errors_carry_an_id() {
        let response = ApiError::failed("Failed to create image. Please try again.").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let id = response.headers().get("x-error-id").unwrap().to_str().unwrap().to_string();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.id, id);
        assert_eq!(report.public_code, "FAILED");
    }

    #[test]
    fn client_errors_are_not_reported() {
        let response = ApiError::bad_request("Image name is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("x-error-id").is_none());
        assert!(response.extensions().get::<ErrorReport>().is_none());
    }

    #[test]
    fn message_is_the_public_text() {
        let err = ApiError::failed("Prediction failed: bad bytes");
        assert_eq!(err.message(), "Prediction failed: bad bytes");
        assert_eq!(err.to_string(), "500 Internal Server Error: Prediction failed: bad bytes");
    }
}
