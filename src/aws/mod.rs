pub mod s3_post;
pub mod secrets_manager;
pub mod sigv4;

use aws_config::{BehaviorVersion, Region, SdkConfig};

pub use s3_post::{PresignedPost, S3PostPresigner};
pub use secrets_manager::AwsSecretsManager;

/// Shared SDK configuration: the default credential chain (env, profile,
/// SSO, container and instance roles) pinned to `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
