use std::env;

use anyhow::{Context, Result, anyhow, bail};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REGISTRATION_RANGE: &str = "Sheet1";
const DEFAULT_SUBMISSION_RANGE: &str = "Sheet2";
const DEFAULT_RECAPTCHA_SECRET_ID: &str = "RECAPTCHA_SECRET_KEY";
const DEFAULT_GOOGLE_CREDENTIALS_SECRET_ID: &str = "GOOGLE_SERVICE_ACCOUNT";
const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Minimum reCAPTCHA score accepted for a submission (inclusive).
pub const DEFAULT_MIN_CAPTCHA_SCORE: f64 = 0.5;
/// Upper bound of the content-length-range condition (10 MiB).
pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;
/// Lifetime of an issued pre-signed POST.
pub const DEFAULT_UPLOAD_EXPIRY_SECS: u64 = 300;

/// Where secrets are read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SecretsBackend {
    Env,
    Aws,
}

impl SecretsBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(SecretsBackend::Env),
            "aws" => Ok(SecretsBackend::Aws),
            other => bail!("unsupported SECRETS_BACKEND `{other}`, expected `env` or `aws`"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormConfig {
    pub spreadsheet_id: String,
    pub registration_range: String,
    pub submission_range: String,
    pub timestamp_offset_minutes: i32,
    pub recaptcha_secret_id: String,
    pub google_credentials_secret_id: String,
    pub recaptcha_verify_url: String,
    pub min_captcha_score: f64,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub max_bytes: u64,
    pub expiry_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub allowed_origin: String,
    pub secrets_backend: SecretsBackend,
    pub forms: FormConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{key} env var is missing"));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let secrets_backend = match get("SECRETS_BACKEND") {
            Some(value) => SecretsBackend::parse(&value)?,
            None => SecretsBackend::Env,
        };

        let min_captcha_score =
            parse_or(get("RECAPTCHA_MIN_SCORE"), "RECAPTCHA_MIN_SCORE", DEFAULT_MIN_CAPTCHA_SCORE)?;
        if !(0.0..=1.0).contains(&min_captcha_score) {
            bail!("RECAPTCHA_MIN_SCORE must be between 0 and 1, got {min_captcha_score}");
        }

        let forms = FormConfig {
            spreadsheet_id: required("SPREADSHEET_ID")?,
            registration_range: or_default("REGISTRATION_RANGE", DEFAULT_REGISTRATION_RANGE),
            submission_range: or_default("SUBMISSION_RANGE", DEFAULT_SUBMISSION_RANGE),
            timestamp_offset_minutes: parse_or(
                get("SHEET_TIMESTAMP_OFFSET_MINUTES"),
                "SHEET_TIMESTAMP_OFFSET_MINUTES",
                0,
            )?,
            recaptcha_secret_id: or_default("RECAPTCHA_SECRET_ID", DEFAULT_RECAPTCHA_SECRET_ID),
            google_credentials_secret_id: or_default(
                "GOOGLE_CREDENTIALS_SECRET_ID",
                DEFAULT_GOOGLE_CREDENTIALS_SECRET_ID,
            ),
            recaptcha_verify_url: or_default("RECAPTCHA_VERIFY_URL", DEFAULT_RECAPTCHA_VERIFY_URL),
            min_captcha_score,
        };

        let uploads = UploadConfig {
            bucket: required("UPLOAD_BUCKET")?,
            region: or_default("AWS_REGION", DEFAULT_AWS_REGION),
            endpoint: get("S3_ENDPOINT").map(|value| value.trim_end_matches('/').to_string()),
            max_bytes: parse_or(
                get("UPLOAD_MAX_BYTES"),
                "UPLOAD_MAX_BYTES",
                DEFAULT_UPLOAD_MAX_BYTES,
            )?,
            expiry_secs: parse_or(
                get("UPLOAD_EXPIRY_SECS"),
                "UPLOAD_EXPIRY_SECS",
                DEFAULT_UPLOAD_EXPIRY_SECS,
            )?,
        };

        Ok(Self {
            port,
            allowed_origin: or_default("ALLOWED_ORIGIN", "*"),
            secrets_backend,
            forms,
            uploads,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}
