use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    aws::PresignedPost,
    web::{ApiError, AppState, body::json_object, json_error},
};

const MISSING_FIELDS: &str = "fileName and fileType are required";
const PRESIGN_FAILED: &str = "Failed to generate presigned POST";

#[derive(Debug, Serialize)]
pub struct UploadAuthorization {
    #[serde(flatten)]
    pub post: PresignedPost,
    /// Generated storage key the caller must reference later.
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// `{uuid}-{name}`: unique per call even for identical names.
pub fn storage_key(file_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), file_name)
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

/// `POST /api/generate-presigned-url`
pub async fn generate_presigned_url(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadAuthorization>, ApiError> {
    let payload = json_object(&body).unwrap_or_default();

    let (Some(file_name), Some(file_type)) = (
        non_empty(payload.get("fileName")),
        non_empty(payload.get("fileType")),
    ) else {
        warn!("upload authorization requested without fileName or fileType");
        return Err(json_error(StatusCode::BAD_REQUEST, MISSING_FIELDS));
    };

    let key = storage_key(file_name);
    let post = state
        .uploads()
        .presign(&key, file_type, Utc::now())
        .await
        .map_err(|err| {
            error!(?err, key = %key, "failed to build presigned POST");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, PRESIGN_FAILED)
        })?;

    info!(
        key = %key,
        content_type = file_type,
        bucket = state.uploads().bucket(),
        "issued upload authorization"
    );
    Ok(Json(UploadAuthorization {
        post,
        file_name: key,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
        response::Response,
    };
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use chrono::FixedOffset;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        aws::{
            S3PostPresigner,
            s3_post::tests::{missing_credentials, presigner},
        },
        captcha::{CaptchaVerification, CaptchaVerifier},
        secrets::tests::MemorySecrets,
        sheets::tests::RecordingSheets,
        web::{router::build_router, state::FormSettings},
    };

    struct PanickingCaptcha;

    #[async_trait::async_trait]
    impl CaptchaVerifier for PanickingCaptcha {
        async fn verify(&self, _secret: &str, _token: &str) -> anyhow::Result<CaptchaVerification> {
            panic!("upload handler must not verify CAPTCHA tokens");
        }
    }

    fn state_with(uploads: S3PostPresigner) -> AppState {
        AppState::new(
            Arc::new(MemorySecrets::default()),
            Arc::new(PanickingCaptcha),
            Arc::new(RecordingSheets::default()),
            uploads,
            FormSettings {
                registration_range: "Sheet1".into(),
                submission_range: "Sheet2".into(),
                timestamp_offset: FixedOffset::east_opt(0).unwrap(),
                recaptcha_secret_id: "RECAPTCHA_SECRET_KEY".into(),
                google_credentials_secret_id: "GOOGLE_SERVICE_ACCOUNT".into(),
                min_captcha_score: 0.5,
            },
        )
    }

    async fn call(state: AppState, method: Method, body: Body) -> Response {
        build_router(state, "*")
            .unwrap()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/api/generate-presigned-url")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(file_name: &str, file_type: &str) -> Body {
        Body::from(json!({ "fileName": file_name, "fileType": file_type }).to_string())
    }

    #[tokio::test]
    async fn issues_prefixed_key_and_size_bounded_policy() {
        let response =
            call(state_with(presigner()), Method::POST, request("a.png", "image/png")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = json_body(response).await;
        let key = body["fileName"].as_str().unwrap();
        assert_ne!(key, "a.png");
        assert!(key.ends_with("-a.png"));
        assert_eq!(body["fields"]["key"], key);
        assert_eq!(body["fields"]["Content-Type"], "image/png");
        assert_eq!(body["url"], "https://mosip-create-uploads.s3.ap-south-1.amazonaws.com");

        let policy = BASE64.decode(body["fields"]["Policy"].as_str().unwrap()).unwrap();
        let policy: Value = serde_json::from_slice(&policy).unwrap();
        let conditions = policy["conditions"].as_array().unwrap();
        let length_range = conditions
            .iter()
            .find(|c| c.get(0) == Some(&json!("content-length-range")))
            .unwrap();
        assert_eq!(length_range, &json!(["content-length-range", 0, 10_485_760]));
        assert!(conditions.contains(&json!(["eq", "$Content-Type", "image/png"])));
    }

    #[tokio::test]
    async fn identical_requests_get_distinct_keys() {
        let state = state_with(presigner());
        let first = call(state.clone(), Method::POST, request("a.png", "image/png")).await;
        let second = call(state, Method::POST, request("a.png", "image/png")).await;
        let (first, second) = (json_body(first).await, json_body(second).await);
        assert_ne!(first["fileName"], second["fileName"]);
    }

    #[tokio::test]
    async fn missing_inputs_are_400() {
        for body in [
            json!({ "fileName": "a.png" }),
            json!({ "fileType": "image/png" }),
            json!({ "fileName": "", "fileType": "image/png" }),
            json!({}),
        ] {
            let response =
                call(state_with(presigner()), Method::POST, Body::from(body.to_string())).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(response).await,
                json!({ "error": "fileName and fileType are required" })
            );
        }
    }

    #[tokio::test]
    async fn non_object_body_reports_missing_inputs() {
        for body in ["[\"a.png\",\"image/png\"]", "not json", ""] {
            let response = call(state_with(presigner()), Method::POST, Body::from(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(response).await,
                json!({ "error": "fileName and fileType are required" })
            );
        }
    }

    #[tokio::test]
    async fn credential_failure_is_500() {
        let uploads = S3PostPresigner::new("bucket", "us-east-1", missing_credentials());
        let response = call(state_with(uploads), Method::POST, request("a.png", "image/png")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to generate presigned POST" })
        );
    }

    #[tokio::test]
    async fn preflight_returns_cors_message() {
        let uploads = S3PostPresigner::new("bucket", "us-east-1", missing_credentials());
        let response = call(state_with(uploads), Method::OPTIONS, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS,POST,GET");
        assert_eq!(json_body(response).await, json!({ "message": "CORS preflight OK" }));
    }

    #[test]
    fn storage_key_keeps_literal_name() {
        let key = storage_key("deck final.pdf");
        let (prefix, rest) = key.split_at(36);
        assert!(Uuid::parse_str(prefix).is_ok());
        assert_eq!(rest, "-deck final.pdf");
    }
}
