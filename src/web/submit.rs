use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    forms::{FormKind, SubmissionRequest, format_timestamp, sheet_row},
    secrets::resolve_secret,
    sheets::ServiceAccountKey,
    web::{ApiError, AppState, SuccessBody, body::json_object, json_error},
};

const CAPTCHA_UNAVAILABLE: &str = "Failed to verify reCAPTCHA. Try again later.";
const CAPTCHA_REJECTED: &str = "Failed reCAPTCHA validation";
const NOT_AN_OBJECT: &str = "Request body must be a JSON object";

/// `POST /api/submit-form`
///
/// Validate, verify the CAPTCHA token, then append exactly one row. Every
/// check precedes the append, so a rejected request writes nothing.
pub async fn submit_form(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessBody>, ApiError> {
    let payload = json_object(&body)
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, NOT_AN_OBJECT))?;

    let request = SubmissionRequest::from_payload(&payload).map_err(|rejection| {
        let message = rejection.message();
        warn!(%message, "rejected form payload");
        json_error(StatusCode::BAD_REQUEST, message)
    })?;
    let kind = request.kind();
    let settings = state.forms();

    let captcha_secret = resolve_secret(state.secrets(), &settings.recaptcha_secret_id).await?;
    let verification = state
        .captcha()
        .verify(&captcha_secret, request.recaptcha_token())
        .await
        .map_err(|err| {
            error!(?err, "reCAPTCHA verification request failed");
            json_error(StatusCode::BAD_GATEWAY, CAPTCHA_UNAVAILABLE)
        })?;
    if !verification.passes(settings.min_captcha_score) {
        warn!(
            success = verification.success,
            score = verification.score,
            form = %kind,
            "reCAPTCHA rejected submission"
        );
        return Err(json_error(StatusCode::FORBIDDEN, CAPTCHA_REJECTED));
    }

    let raw_credentials =
        resolve_secret(state.secrets(), &settings.google_credentials_secret_id).await?;
    let credentials = ServiceAccountKey::from_json(&raw_credentials)?;

    let range = match kind {
        FormKind::Registration => settings.registration_range.as_str(),
        FormKind::Submission => settings.submission_range.as_str(),
    };
    let row = sheet_row(
        &request,
        format_timestamp(Utc::now(), settings.timestamp_offset),
    );

    state
        .sheets()
        .append_row(&credentials, range, row)
        .await
        .map_err(|err| {
            error!(?err, form = %kind, range, "failed to append spreadsheet row");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to write {kind} data to Google Sheets"),
            )
        })?;

    info!(form = %kind, range, "recorded form submission");
    Ok(Json(SuccessBody::ok()))
}
