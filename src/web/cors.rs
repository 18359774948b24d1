use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::{HeaderValue, header},
};
use tower_http::set_header::SetResponseHeaderLayer;

use super::ApiMessage;

pub const ALLOWED_HEADERS: &str = "Content-Type";
pub const ALLOWED_METHODS: &str = "OPTIONS,POST,GET";

/// Attach the fixed CORS headers to every response of `router`.
pub fn with_cors_headers<S>(router: Router<S>, allowed_origin: &str) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("ALLOWED_ORIGIN `{allowed_origin}` is not a valid header value"))?;

    Ok(router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            origin,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        )))
}

/// OPTIONS handler shared by both endpoints. Touches no dependencies.
pub async fn preflight() -> Json<ApiMessage> {
    Json(ApiMessage::new("CORS preflight OK"))
}
