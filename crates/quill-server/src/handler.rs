use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use quill_commit::{BuildStatus, SubmissionError, SubmissionReceipt, SubmissionService};
use serde::Serialize;

/// Seconds a client should wait before resubmitting after a 503.
pub const RETRY_AFTER_SECS: u64 = 2;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SubmissionService>,
    pub site_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub resume_id: String,
    pub path: String,
    pub commit: String,
    pub attempts: u32,
    pub build_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub edit_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
}

impl SubmitResponse {
    pub fn new(receipt: SubmissionReceipt, site_url: Option<&str>) -> Self {
        let id = receipt.document_id.as_str().to_string();
        let (build_triggered, warning) = match receipt.build {
            BuildStatus::Triggered => (true, None),
            BuildStatus::Degraded { reason } => (
                false,
                Some(format!(
                    "Resume saved, but the site build could not be triggered: {reason}"
                )),
            ),
        };
        Self {
            success: true,
            resume_url: site_url.map(|site| format!("{site}/resumes/{id}")),
            edit_url: site_url
                .map(|site| format!("{site}/edit/{id}?token={}", receipt.edit_token)),
            resume_id: id,
            path: receipt.path,
            commit: receipt.commit.to_string(),
            attempts: receipt.attempts,
            build_triggered,
            warning,
            edit_token: receipt.edit_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Accept one resume submission.
pub async fn submit_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match state.service.submit_bytes(&body).await {
        Ok(receipt) => {
            Json(SubmitResponse::new(receipt, state.site_url.as_deref())).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: SubmissionError) -> Response {
    match err {
        SubmissionError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
                code: Some(e.code()),
            }),
        )
            .into_response(),
        SubmissionError::ConcurrencyExhausted { .. } | SubmissionError::Timeout { .. } => {
            tracing::warn!(error = %err, "submission not accepted, asking client to retry");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                Json(ErrorResponse {
                    error: "The service is busy, please try again shortly".into(),
                    code: Some("retry_later"),
                }),
            )
                .into_response()
        }
        SubmissionError::Remote(e) => {
            tracing::error!(error = %e, "submission failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Could not store the resume".into(),
                    code: None,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use quill_types::{DocumentId, ObjectId};

    use super::*;

    fn receipt(build: BuildStatus) -> SubmissionReceipt {
        SubmissionReceipt {
            document_id: DocumentId::parse("r1").unwrap(),
            path: "_data/resumes/r1.json".into(),
            commit: ObjectId::from_hex(&"a".repeat(40)).unwrap(),
            attempts: 1,
            build,
            edit_token: "r1.1.ff".into(),
        }
    }

    #[test]
    fn success_body_uses_client_field_names() {
        let body = SubmitResponse::new(
            receipt(BuildStatus::Triggered),
            Some("https://acme.github.io/site"),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["resumeId"], "r1");
        assert_eq!(json["buildTriggered"], true);
        assert_eq!(json["resumeUrl"], "https://acme.github.io/site/resumes/r1");
        assert_eq!(
            json["editUrl"],
            "https://acme.github.io/site/edit/r1?token=r1.1.ff"
        );
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn degraded_build_carries_warning() {
        let body = SubmitResponse::new(
            receipt(BuildStatus::Degraded {
                reason: "403".into(),
            }),
            None,
        );
        assert!(!body.build_triggered);
        assert!(body.warning.unwrap().contains("403"));
        assert!(body.resume_url.is_none());
    }

    #[test]
    fn exhaustion_maps_to_503_with_retry_after() {
        let resp = error_response(SubmissionError::ConcurrencyExhausted { attempts: 5 });
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "2");
    }
}
