use anyhow::Result;
use chrono::{DateTime, Utc};

pub mod chain;
pub mod providers;

use self::providers::{
    ContainerProvider, EnvProvider, InstanceRoleProvider, SharedFileProvider, StaticProvider,
};

/// Resolved credentials, produced by exactly one provider
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    /// Name of the provider that produced these credentials
    pub source: &'static str,
}

impl Credentials {
    pub fn is_expired(&self) -> bool {
        self.expiration.is_some_and(|when| when <= Utc::now())
    }
}

/// Credential provider enum using composition pattern
/// Each variant contains a provider-specific struct with its own retrieval
/// logic; the chain holds them in explicit priority order
#[derive(Debug, Clone)]
pub enum CredentialProvider {
    Static(StaticProvider),
    Environment(EnvProvider),
    SharedFile(SharedFileProvider),
    ContainerRole(ContainerProvider),
    InstanceRole(InstanceRoleProvider),
}

impl CredentialProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static(_) => StaticProvider::NAME,
            Self::Environment(_) => EnvProvider::NAME,
            Self::SharedFile(_) => SharedFileProvider::NAME,
            Self::ContainerRole(_) => ContainerProvider::NAME,
            Self::InstanceRole(_) => InstanceRoleProvider::NAME,
        }
    }

    /// Try to produce credentials from this provider's source
    pub async fn retrieve(&self) -> Result<Credentials> {
        match self {
            Self::Static(provider) => provider.retrieve(),
            Self::Environment(provider) => provider.retrieve(),
            Self::SharedFile(provider) => provider.retrieve().await,
            Self::ContainerRole(provider) => provider.retrieve().await,
            Self::InstanceRole(provider) => provider.retrieve().await,
        }
    }
}

pub use chain::{CredentialChain, build_chain};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credentials(expiration: Option<DateTime<Utc>>) -> Credentials {
        Credentials {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            expiration,
            source: StaticProvider::NAME,
        }
    }

    #[test]
    fn test_credentials_without_expiration_never_expire() {
        assert!(!credentials(None).is_expired());
    }

    #[test]
    fn test_credentials_expire_at_deadline() {
        let expired = credentials(Some(Utc::now() - Duration::minutes(1)));
        assert!(expired.is_expired());

        let live = credentials(Some(Utc::now() + Duration::hours(1)));
        assert!(!live.is_expired());
    }
}
