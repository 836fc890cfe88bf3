use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::creds::providers::InstanceRoleProvider;
use crate::metadata::MetadataClient;

/// Error from an identity or security-token API call, with the service error
/// code when the service supplied one
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Identity-provider operations consumed by account resolution
#[async_trait]
pub trait IdentityApi {
    /// ARN of the current user (`iam:GetUser`)
    async fn current_user_arn(&self) -> Result<String, ApiError>;

    /// ARN of the first listed role, if any (`iam:ListRoles`, max 1)
    async fn first_role_arn(&self) -> Result<Option<String>, ApiError>;
}

/// Security-token-service operations consumed by account resolution
#[async_trait]
pub trait TokenApi {
    /// ARN of the calling identity (`sts:GetCallerIdentity`)
    async fn caller_identity_arn(&self) -> Result<String, ApiError>;
}

/// Accumulates the failure of every attempted strategy; surfaced to the
/// caller only when all of them fail
#[derive(Debug, Default)]
pub struct ErrorStack {
    causes: Vec<String>,
}

impl ErrorStack {
    pub fn push(&mut self, cause: impl fmt::Display) {
        self.causes.push(cause.to_string());
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) occurred: ", self.causes.len())?;
        for (index, cause) in self.causes.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{cause}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("unable to parse account ID from invalid ARN: {0:?}")]
    MalformedArn(String),
    #[error("failed getting account ID via 'iam:GetUser': {0}")]
    GetUser(ApiError),
    #[error("failed getting account ID via all available methods: {0}")]
    Exhausted(ErrorStack),
}

/// The owning account of a session, parsed from an ARN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub partition: String,
    pub account_id: String,
}

impl AccountInfo {
    /// Parse `arn:<partition>:<service>:<region>:<accountID>:<resource>`.
    /// Anything with fewer than five colon-delimited segments is rejected.
    pub fn from_arn(arn: &str) -> Result<Self, AccountError> {
        let parts: Vec<&str> = arn.split(':').collect();
        if parts.len() < 5 {
            return Err(AccountError::MalformedArn(arn.to_string()));
        }
        Ok(Self {
            partition: parts[1].to_string(),
            account_id: parts[4].to_string(),
        })
    }
}

/// What a single discovery strategy decided
enum Outcome {
    Resolved(AccountInfo),
    /// Not applicable to these credentials; try the next strategy
    Continue(String),
    Fail(AccountError),
}

fn parse_outcome(arn: &str) -> Outcome {
    match AccountInfo::from_arn(arn) {
        Ok(info) => Outcome::Resolved(info),
        Err(err) => Outcome::Fail(err),
    }
}

/// Resolve the partition and account ID owning the current credentials.
///
/// Strategies are tried strictly in sequence, each failure accumulating until
/// one succeeds or all are exhausted. Credentials that came from the instance
/// metadata role skip `iam:GetUser` entirely: an instance profile is not an
/// IAM user, the metadata document and the later strategies are the only
/// meaningful sources for it.
pub async fn get_account_info<I, T>(
    identity: &I,
    tokens: &T,
    metadata: &MetadataClient,
    auth_provider_name: &str,
) -> Result<AccountInfo, AccountError>
where
    I: IdentityApi + Sync,
    T: TokenApi + Sync,
{
    let mut failures = ErrorStack::default();

    let first = if auth_provider_name == InstanceRoleProvider::NAME {
        via_instance_metadata(metadata).await
    } else {
        via_get_user(identity).await
    };
    match first {
        Outcome::Resolved(info) => return Ok(info),
        Outcome::Fail(err) => return Err(err),
        Outcome::Continue(cause) => failures.push(cause),
    }

    match via_caller_identity(tokens).await {
        Outcome::Resolved(info) => return Ok(info),
        Outcome::Fail(err) => return Err(err),
        Outcome::Continue(cause) => failures.push(cause),
    }

    match via_list_roles(identity).await {
        Outcome::Resolved(info) => Ok(info),
        Outcome::Fail(err) => Err(err),
        Outcome::Continue(cause) => {
            failures.push(cause);
            Err(AccountError::Exhausted(failures))
        }
    }
}

async fn via_instance_metadata(metadata: &MetadataClient) -> Outcome {
    debug!("trying to resolve the account ID via the instance metadata service");
    match metadata.iam_info().await {
        Ok(info) => parse_outcome(&info.instance_profile_arn),
        // The metadata service can be flaky, or serve an IAM info document
        // that doesn't carry a profile. The credentials may still identify
        // themselves through the remaining strategies.
        Err(err) => {
            debug!("no account info from the metadata service: {err:#}");
            Outcome::Continue(format!("{err:#}"))
        }
    }
}

async fn via_get_user<I: IdentityApi + Sync>(identity: &I) -> Outcome {
    debug!("trying to resolve the account ID via iam:GetUser");
    match identity.current_user_arn().await {
        Ok(arn) => parse_outcome(&arn),
        Err(err) if is_federated_credential_code(err.code.as_deref()) => {
            // Raised when the credentials belong to a federated profile
            // rather than an IAM user; not a real failure
            debug!("iam:GetUser does not apply to these credentials: {err}");
            Outcome::Continue(err.to_string())
        }
        Err(err) => Outcome::Fail(AccountError::GetUser(err)),
    }
}

async fn via_caller_identity<T: TokenApi + Sync>(tokens: &T) -> Outcome {
    debug!("trying to resolve the account ID via sts:GetCallerIdentity");
    match tokens.caller_identity_arn().await {
        Ok(arn) => parse_outcome(&arn),
        Err(err) => {
            debug!("sts:GetCallerIdentity failed: {err}");
            Outcome::Continue(err.to_string())
        }
    }
}

async fn via_list_roles<I: IdentityApi + Sync>(identity: &I) -> Outcome {
    debug!("trying to resolve the account ID via iam:ListRoles");
    match identity.first_role_arn().await {
        Ok(Some(arn)) => parse_outcome(&arn),
        Ok(None) => Outcome::Continue("iam:ListRoles returned no roles".to_string()),
        Err(err) => {
            debug!("iam:ListRoles failed: {err}");
            Outcome::Continue(err.to_string())
        }
    }
}

fn is_federated_credential_code(code: Option<&str>) -> bool {
    matches!(
        code,
        Some("AccessDenied" | "ValidationError" | "InvalidClientTokenId")
    )
}
