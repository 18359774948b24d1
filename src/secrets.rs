use std::env;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

/// Backing store for the CAPTCHA secret and spreadsheet credentials.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Return the raw secret string stored under `id`.
    async fn get_secret(&self, id: &str) -> Result<String>;
}

/// Reads secrets from environment variables named by the secret id.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, id: &str) -> Result<String> {
        env::var(id).map_err(|_| anyhow!("secret `{id}` is not set in the environment"))
    }
}

/// Resolve a secret reference of the form `name` or `name#field`.
///
/// With a `#field` suffix the secret is parsed as a JSON object and the string
/// value of `field` is returned.
pub async fn resolve_secret(store: &dyn SecretStore, reference: &str) -> Result<String> {
    let (name, field) = match reference.split_once('#') {
        Some((name, field)) => (name, Some(field)),
        None => (reference, None),
    };

    let raw = store
        .get_secret(name)
        .await
        .with_context(|| format!("failed to retrieve secret `{name}`"))?;

    let Some(field) = field else {
        return Ok(raw);
    };

    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("secret `{name}` is not a JSON object"))?;
    parsed
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("secret `{name}` has no string field `{field}`"))
}
