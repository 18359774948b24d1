use anyhow::Result;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::web::{AppState, cors, submit, upload_url};

pub fn build_router(state: AppState, allowed_origin: &str) -> Result<Router> {
    let api: Router<AppState> = Router::new()
        .route(
            "/api/submit-form",
            post(submit::submit_form).options(cors::preflight),
        )
        .route(
            "/api/generate-presigned-url",
            post(upload_url::generate_presigned_url).options(cors::preflight),
        );
    let api = cors::with_cors_headers(api, allowed_origin)?;

    Ok(Router::new()
        .route("/healthz", get(healthz))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
