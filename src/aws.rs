use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_iam::Client as IamClient;
use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sts::Client as StsClient;
use tracing::debug;

use crate::account::{ApiError, IdentityApi, TokenApi};
use crate::constants::DEFAULT_AWS_REGION;
use crate::creds::Credentials;

/// Identity-provider client backed by `aws-sdk-iam`
#[derive(Debug, Clone)]
pub struct IamApi {
    client: IamClient,
}

impl IamApi {
    pub fn new(credentials: &Credentials, region: Option<&str>) -> Self {
        let config = aws_sdk_iam::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(resolve_region(region))
            .credentials_provider(sdk_credentials(credentials))
            .build();
        Self {
            client: IamClient::from_conf(config),
        }
    }
}

#[async_trait]
impl IdentityApi for IamApi {
    async fn current_user_arn(&self) -> Result<String, ApiError> {
        let output = self
            .client
            .get_user()
            .send()
            .await
            .map_err(api_error)?;
        output
            .user()
            .map(|user| user.arn().to_string())
            .ok_or_else(|| ApiError::new("iam:GetUser returned no user record"))
    }

    async fn first_role_arn(&self) -> Result<Option<String>, ApiError> {
        let output = self
            .client
            .list_roles()
            .max_items(1)
            .send()
            .await
            .map_err(api_error)?;
        Ok(output.roles().first().map(|role| role.arn().to_string()))
    }
}

/// Security-token-service client backed by `aws-sdk-sts`
#[derive(Debug, Clone)]
pub struct StsApi {
    client: StsClient,
}

impl StsApi {
    pub fn new(credentials: &Credentials, region: Option<&str>) -> Self {
        let config = aws_sdk_sts::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(resolve_region(region))
            .credentials_provider(sts_sdk_credentials(credentials))
            .build();
        Self {
            client: StsClient::from_conf(config),
        }
    }
}

#[async_trait]
impl TokenApi for StsApi {
    async fn caller_identity_arn(&self) -> Result<String, ApiError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(api_error)?;
        output
            .arn()
            .map(String::from)
            .ok_or_else(|| ApiError::new("sts:GetCallerIdentity returned no ARN"))
    }
}

fn resolve_region(region: Option<&str>) -> Region {
    match region {
        Some(region) if !region.is_empty() => Region::new(region.to_string()),
        _ => {
            debug!("no region configured, using {DEFAULT_AWS_REGION} for identity calls");
            Region::new(DEFAULT_AWS_REGION)
        }
    }
}

fn sdk_credentials(credentials: &Credentials) -> aws_sdk_iam::config::Credentials {
    aws_sdk_iam::config::Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.clone(),
        credentials.session_token.clone(),
        None,
        "whoaws-chain",
    )
}

fn sts_sdk_credentials(credentials: &Credentials) -> aws_sdk_sts::config::Credentials {
    aws_sdk_sts::config::Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.clone(),
        credentials.session_token.clone(),
        None,
        "whoaws-chain",
    )
}

/// Map an SDK error onto the capability error, keeping the service error
/// code so the resolver can distinguish federated-credential rejections from
/// real failures
fn api_error<E, R>(err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    ApiError {
        code: err.code().map(String::from),
        message: DisplayErrorContext(&err).to_string(),
    }
}
