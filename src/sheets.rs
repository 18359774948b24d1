use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The subset of a Google service-account key file needed to mint tokens.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(raw)
            .context("spreadsheet credentials are not a valid service-account key")?;
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            bail!("spreadsheet credentials are missing client_email or private_key");
        }
        Ok(key)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Append-only access to a spreadsheet.
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Cells are stored as given; formula-like text is never evaluated.
    async fn append_row(
        &self,
        credentials: &ServiceAccountKey,
        range: &str,
        row: Vec<Value>,
    ) -> Result<()>;
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google Sheets v4 client authenticated as a service account with the
/// spreadsheets scope.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    http: Client,
    spreadsheet_id: String,
    api_base: String,
}

impl GoogleSheetsClient {
    pub fn new(http: Client, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            http,
            spreadsheet_id: spreadsheet_id.into(),
            api_base: SHEETS_API_BASE.to_string(),
        }
    }

    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("service-account private key is not a valid RSA PEM")?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("failed to sign service-account assertion")?;

        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("failed to reach Google OAuth token endpoint")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("token exchange failed with status {status}: {body}");
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("failed to parse Google OAuth token response")?;
        Ok(token.access_token)
    }

    fn append_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).context("invalid Sheets API base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sheets API base URL cannot hold path segments"))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{range}:append"));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    async fn append_row(
        &self,
        credentials: &ServiceAccountKey,
        range: &str,
        row: Vec<Value>,
    ) -> Result<()> {
        let token = self.access_token(credentials).await?;
        let url = self.append_url(range)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .context("failed to reach Google Sheets")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Sheets append to `{range}` failed with status {status}: {body}");
        }
        Ok(())
    }
}
