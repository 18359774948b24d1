use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;

use crate::secrets::SecretStore;

/// Secrets Manager backed store. Only `SecretString` values are supported.
#[derive(Clone, Debug)]
pub struct AwsSecretsManager {
    client: Client,
}

impl AwsSecretsManager {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManager {
    async fn get_secret(&self, id: &str) -> Result<String> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(id)
            .send()
            .await
            .with_context(|| format!("GetSecretValue for `{id}` failed"))?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("secret `{id}` has no SecretString value"))
    }
}
