//! Shared AWS SDK configuration.

use tracing::debug;

/// Loads the AWS SDK configuration from the environment, optionally pinning the region.
pub async fn load_sdk_config(region: Option<&str>) -> aws_config::SdkConfig {
    if let Some(region_str) = region {
        debug!("Connecting to AWS in region: {region_str}");
        aws_config::from_env()
            .region(aws_config::Region::new(region_str.to_string()))
            .load()
            .await
    } else {
        debug!("Connecting to AWS in the default region");
        aws_config::load_from_env().await
    }
}
