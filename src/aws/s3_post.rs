use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};

use super::sigv4;

const SERVICE: &str = "s3";

/// Browser-ready upload authorization: POST every field in `fields` as
/// multipart form data to `url`, followed by the `file` part.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// Builds SigV4 POST policies for a single bucket.
#[derive(Clone)]
pub struct S3PostPresigner {
    bucket: String,
    region: String,
    endpoint: Option<String>,
    max_bytes: u64,
    expires_in: Duration,
    credentials: SharedCredentialsProvider,
}

impl S3PostPresigner {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: SharedCredentialsProvider,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            max_bytes: crate::config::DEFAULT_UPLOAD_MAX_BYTES,
            expires_in: Duration::from_secs(crate::config::DEFAULT_UPLOAD_EXPIRY_SECS),
            credentials,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_expiry(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{endpoint}/{}", self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }

    /// Authorize one upload of `key` with an exact `Content-Type` and the
    /// configured size range. The storage service enforces both conditions.
    pub async fn presign(
        &self,
        key: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> Result<PresignedPost> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .context("failed to resolve storage credentials")?;

        let expires_in = chrono::Duration::from_std(self.expires_in)
            .context("upload expiry is out of range")?;
        let expiration = (now + expires_in).to_rfc3339_opts(SecondsFormat::Millis, true);

        let amz_date = sigv4::amz_date(now);
        let credential = format!(
            "{}/{}",
            credentials.access_key_id(),
            sigv4::credential_scope(now, &self.region, SERVICE)
        );

        let mut fields = BTreeMap::new();
        fields.insert("bucket".to_string(), self.bucket.clone());
        fields.insert("key".to_string(), key.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
        fields.insert("X-Amz-Algorithm".to_string(), sigv4::ALGORITHM.to_string());
        fields.insert("X-Amz-Credential".to_string(), credential);
        fields.insert("X-Amz-Date".to_string(), amz_date);
        if let Some(token) = credentials.session_token() {
            fields.insert("X-Amz-Security-Token".to_string(), token.to_string());
        }

        let mut conditions: Vec<Value> = fields
            .iter()
            .map(|(name, value)| json!({ name: value }))
            .collect();
        conditions.push(json!(["content-length-range", 0, self.max_bytes]));
        conditions.push(json!(["eq", "$Content-Type", content_type]));

        let policy = json!({
            "expiration": expiration,
            "conditions": conditions,
        });
        let encoded_policy = BASE64.encode(serde_json::to_vec(&policy)?);

        let signature = sigv4::sign_hex(
            credentials.secret_access_key(),
            now,
            &self.region,
            SERVICE,
            &encoded_policy,
        );

        fields.insert("Policy".to_string(), encoded_policy);
        fields.insert("X-Amz-Signature".to_string(), signature);

        Ok(PresignedPost {
            url: self.upload_url(),
            fields,
        })
    }
}
