use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use reqwest::Client;
use tracing::info;

use crate::{
    aws::{AwsSecretsManager, S3PostPresigner, load_sdk_config},
    captcha::{CaptchaVerifier, RecaptchaClient},
    config::{AppConfig, FormConfig, SecretsBackend},
    secrets::{EnvSecretStore, SecretStore},
    sheets::{GoogleSheetsClient, SpreadsheetService},
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Process-scoped dependencies handed to every request. Holds no mutable state.
#[derive(Clone)]
pub struct AppState {
    secrets: Arc<dyn SecretStore>,
    captcha: Arc<dyn CaptchaVerifier>,
    sheets: Arc<dyn SpreadsheetService>,
    uploads: Arc<S3PostPresigner>,
    forms: Arc<FormSettings>,
}

/// Form handler settings resolved from `FormConfig`.
#[derive(Clone, Debug)]
pub struct FormSettings {
    pub registration_range: String,
    pub submission_range: String,
    pub timestamp_offset: FixedOffset,
    pub recaptcha_secret_id: String,
    pub google_credentials_secret_id: String,
    pub min_captcha_score: f64,
}

impl FormSettings {
    pub fn from_config(config: &FormConfig) -> Result<Self> {
        let timestamp_offset = FixedOffset::east_opt(config.timestamp_offset_minutes * 60)
            .ok_or_else(|| {
                anyhow!(
                    "SHEET_TIMESTAMP_OFFSET_MINUTES {} is out of range",
                    config.timestamp_offset_minutes
                )
            })?;

        Ok(Self {
            registration_range: config.registration_range.clone(),
            submission_range: config.submission_range.clone(),
            timestamp_offset,
            recaptcha_secret_id: config.recaptcha_secret_id.clone(),
            google_credentials_secret_id: config.google_credentials_secret_id.clone(),
            min_captcha_score: config.min_captcha_score,
        })
    }
}

impl AppState {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        captcha: Arc<dyn CaptchaVerifier>,
        sheets: Arc<dyn SpreadsheetService>,
        uploads: S3PostPresigner,
        forms: FormSettings,
    ) -> Self {
        Self {
            secrets,
            captcha,
            sheets,
            uploads: Arc::new(uploads),
            forms: Arc::new(forms),
        }
    }

    /// Wire the production clients described by `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        let sdk_config = load_sdk_config(&config.uploads.region).await;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or_else(|| anyhow!("no AWS credentials provider is configured"))?;

        let secrets: Arc<dyn SecretStore> = match config.secrets_backend {
            SecretsBackend::Env => Arc::new(EnvSecretStore),
            SecretsBackend::Aws => Arc::new(AwsSecretsManager::new(&sdk_config)),
        };
        info!(backend = ?config.secrets_backend, "secret store configured");

        let captcha = Arc::new(RecaptchaClient::new(
            http.clone(),
            config.forms.recaptcha_verify_url.clone(),
        ));
        let sheets = Arc::new(GoogleSheetsClient::new(
            http,
            config.forms.spreadsheet_id.clone(),
        ));

        let uploads = S3PostPresigner::new(
            config.uploads.bucket.clone(),
            config.uploads.region.clone(),
            credentials,
        )
        .with_endpoint(config.uploads.endpoint.clone())
        .with_max_bytes(config.uploads.max_bytes)
        .with_expiry(Duration::from_secs(config.uploads.expiry_secs));

        Ok(Self::new(
            secrets,
            captcha,
            sheets,
            uploads,
            FormSettings::from_config(&config.forms)?,
        ))
    }

    pub fn secrets(&self) -> &dyn SecretStore {
        self.secrets.as_ref()
    }

    pub fn captcha(&self) -> &dyn CaptchaVerifier {
        self.captcha.as_ref()
    }

    pub fn sheets(&self) -> &dyn SpreadsheetService {
        self.sheets.as_ref()
    }

    pub fn uploads(&self) -> &S3PostPresigner {
        &self.uploads
    }

    pub fn forms(&self) -> &FormSettings {
        &self.forms
    }
}
