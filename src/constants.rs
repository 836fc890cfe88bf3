use std::{env, path::PathBuf, time::Duration};

use dirs;

/// Environment variable overriding the metadata service endpoint
pub const METADATA_URL_ENV_VAR: &str = "AWS_METADATA_URL";

/// Environment variable overriding the metadata probe timeout (duration string)
pub const METADATA_TIMEOUT_ENV_VAR: &str = "AWS_METADATA_TIMEOUT";

/// Environment variable carrying the container credentials path on the ECS endpoint
pub const CONTAINER_CREDENTIALS_RELATIVE_URI_ENV_VAR: &str =
    "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI";

/// Environment variable carrying a complete container credentials URL
pub const CONTAINER_CREDENTIALS_FULL_URI_ENV_VAR: &str = "AWS_CONTAINER_CREDENTIALS_FULL_URI";

/// Default instance metadata service endpoint
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";

/// Host serving container credentials for relative URIs
pub const CONTAINER_CREDENTIALS_HOST: &str = "http://169.254.170.2";

/// Default metadata probe timeout, kept low so non-cloud environments don't stall
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_millis(100);

/// Default AWS region for identity operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_shared_credentials_path() -> Option<PathBuf> {
    // Check environment variable first
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Use default AWS credentials location
    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CREDENTIALS_FILE_NAME))
}
