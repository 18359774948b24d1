use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Outcome of a siteverify call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptchaVerification {
    pub success: bool,
    pub score: f64,
}

impl CaptchaVerification {
    /// Accepted only on success with a score at or above `min_score`.
    pub fn passes(&self, min_score: f64) -> bool {
        self.success && self.score >= min_score
    }
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Transport or decoding failures are errors. A rejected token is an `Ok`
    /// verification with `success == false`.
    async fn verify(&self, secret: &str, token: &str) -> Result<CaptchaVerification>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// reCAPTCHA v3 siteverify client.
#[derive(Clone)]
pub struct RecaptchaClient {
    http: Client,
    verify_url: String,
}

impl RecaptchaClient {
    pub fn new(http: Client, verify_url: impl Into<String>) -> Self {
        Self {
            http,
            verify_url: verify_url.into(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaClient {
    async fn verify(&self, secret: &str, token: &str) -> Result<CaptchaVerification> {
        let response = self
            .http
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .context("failed to reach reCAPTCHA siteverify")?;

        let status = response.status();
        if !status.is_success() {
            bail!("reCAPTCHA siteverify returned status {status}");
        }

        let body: SiteVerifyResponse = response
            .json()
            .await
            .context("failed to parse reCAPTCHA siteverify response")?;

        if !body.error_codes.is_empty() {
            tracing::debug!(error_codes = ?body.error_codes, "reCAPTCHA reported error codes");
        }

        Ok(CaptchaVerification {
            success: body.success,
            score: body.score.unwrap_or(0.0),
        })
    }
}
