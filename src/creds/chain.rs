use anyhow::{Result, bail};
use tracing::{debug, info};

use super::providers::{
    ContainerProvider, EnvProvider, InstanceRoleProvider, SharedFileProvider, StaticProvider,
};
use super::{CredentialProvider, Credentials};
use crate::config::Config;
use crate::constants::CONTAINER_CREDENTIALS_HOST;
use crate::environment::EnvSnapshot;
use crate::metadata::MetadataClient;

/// Ordered, lazily-evaluated credential provider chain.
///
/// No provider is invoked until credentials are requested; evaluation stops
/// at the first provider that succeeds, and the result is cached until it
/// expires or is invalidated.
#[derive(Debug)]
pub struct CredentialChain {
    providers: Vec<CredentialProvider>,
    cached: Option<Credentials>,
}

impl CredentialChain {
    pub fn new(providers: Vec<CredentialProvider>) -> Self {
        Self {
            providers,
            cached: None,
        }
    }

    /// Provider names in evaluation order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(CredentialProvider::name).collect()
    }

    /// Walk the chain until a provider yields credentials
    pub async fn resolve(&mut self) -> Result<Credentials> {
        if let Some(stale) = self.cached.take_if(|cached| cached.is_expired()) {
            debug!("cached credentials from the {} provider expired", stale.source);
        }
        if let Some(cached) = &self.cached {
            debug!("reusing cached credentials from the {} provider", cached.source);
            return Ok(cached.clone());
        }

        for provider in &self.providers {
            match provider.retrieve().await {
                Ok(credentials) => {
                    debug!("credentials resolved by the {} provider", provider.name());
                    self.cached = Some(credentials.clone());
                    return Ok(credentials);
                }
                Err(err) => {
                    debug!("the {} provider yielded no credentials: {err:#}", provider.name());
                }
            }
        }

        bail!("no valid credential source found in the provider chain")
    }

    /// Drop any cached credentials so the next resolve walks the chain again
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

/// Assemble the provider chain for this session.
///
/// Static, environment, and shared-file providers are always present, in
/// that order. A container role provider joins when the container
/// credentials environment is set, and an instance role provider joins when
/// the metadata service answers the availability probe. The probe is the
/// only network call made here.
pub async fn build_chain(config: &Config, env: &EnvSnapshot) -> Result<CredentialChain> {
    let mut providers = vec![
        CredentialProvider::Static(StaticProvider::new(config)),
        CredentialProvider::Environment(EnvProvider::from_snapshot(env)),
        CredentialProvider::SharedFile(SharedFileProvider::from_snapshot(env)),
    ];

    let metadata = MetadataClient::new(env)?;

    if let Some(url) = container_credentials_url(env) {
        info!("container credentials endpoint detected, adding the container role provider");
        providers.push(CredentialProvider::ContainerRole(ContainerProvider::new(
            url,
            metadata.http_client(),
        )));
    }

    // A real metadata service must answer with an instance id; something
    // unrelated listening on the same address must not enable the provider.
    if metadata.available().await {
        info!("instance metadata service detected, adding the instance role provider");
        providers.push(CredentialProvider::InstanceRole(InstanceRoleProvider::new(
            metadata,
        )));
    } else {
        info!(
            "ignoring metadata endpoint at {} as it does not answer with an instance id",
            metadata.describe_endpoint()
        );
    }

    Ok(CredentialChain::new(providers))
}

fn container_credentials_url(env: &EnvSnapshot) -> Option<String> {
    if let Some(full) = &env.container_credentials_full_uri {
        return Some(full.clone());
    }
    env.container_credentials_relative_uri
        .as_ref()
        .map(|relative| format!("{CONTAINER_CREDENTIALS_HOST}{relative}"))
}
