use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ini::Ini;
use tokio::fs;
use tracing::debug;

use super::Credentials;
use crate::config::Config;
use crate::constants;
use crate::environment::EnvSnapshot;
use crate::metadata::MetadataClient;

/// Credentials passed explicitly through configuration.
/// Always first in the chain: explicit configuration must win.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    access_key: Option<String>,
    secret_key: Option<String>,
    security_token: Option<String>,
}

impl StaticProvider {
    pub const NAME: &'static str = "static";

    pub fn new(config: &Config) -> Self {
        Self {
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            security_token: config.security_token.clone(),
        }
    }

    pub fn retrieve(&self) -> Result<Credentials> {
        let (Some(access_key), Some(secret_key)) =
            (self.access_key.as_deref(), self.secret_key.as_deref())
        else {
            bail!("static credentials are not configured");
        };
        if access_key.is_empty() || secret_key.is_empty() {
            bail!("static credentials are not configured");
        }

        Ok(Credentials {
            access_key_id: access_key.to_string(),
            secret_access_key: secret_key.to_string(),
            session_token: self.security_token.clone().filter(|token| !token.is_empty()),
            expiration: None,
            source: Self::NAME,
        })
    }
}

/// Credentials from the process environment
#[derive(Debug, Clone)]
pub struct EnvProvider {
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
}

impl EnvProvider {
    pub const NAME: &'static str = "environment";

    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        Self {
            access_key_id: env.access_key_id.clone(),
            secret_access_key: env.secret_access_key.clone(),
            session_token: env.session_token.clone(),
        }
    }

    pub fn retrieve(&self) -> Result<Credentials> {
        let Some(access_key_id) = self.access_key_id.clone() else {
            bail!("AWS_ACCESS_KEY_ID is not set");
        };
        let Some(secret_access_key) = self.secret_access_key.clone() else {
            bail!("AWS_SECRET_ACCESS_KEY is not set");
        };

        Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: self.session_token.clone(),
            expiration: None,
            source: Self::NAME,
        })
    }
}

/// Credentials from the shared credentials file (`~/.aws/credentials`)
#[derive(Debug, Clone)]
pub struct SharedFileProvider {
    path: Option<PathBuf>,
    profile: String,
}

impl SharedFileProvider {
    pub const NAME: &'static str = "shared-file";

    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        Self {
            path: env
                .shared_credentials_file
                .clone()
                .or_else(constants::get_shared_credentials_path),
            profile: env.profile.clone().unwrap_or_else(|| "default".to_string()),
        }
    }

    pub async fn retrieve(&self) -> Result<Credentials> {
        let path = self
            .path
            .as_ref()
            .context("cannot determine the shared credentials file location")?;
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read shared credentials file {}", path.display()))?;
        let ini = Ini::load_from_str(&contents)
            .with_context(|| format!("malformed shared credentials file {}", path.display()))?;

        let section = ini
            .section(Some(self.profile.as_str()))
            .with_context(|| format!("profile '{}' not found in {}", self.profile, path.display()))?;
        let access_key_id = section
            .get("aws_access_key_id")
            .filter(|value| !value.is_empty())
            .with_context(|| format!("profile '{}' has no aws_access_key_id", self.profile))?;
        let secret_access_key = section
            .get("aws_secret_access_key")
            .filter(|value| !value.is_empty())
            .with_context(|| format!("profile '{}' has no aws_secret_access_key", self.profile))?;

        Ok(Credentials {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: section
                .get("aws_session_token")
                .filter(|value| !value.is_empty())
                .map(String::from),
            expiration: None,
            source: Self::NAME,
        })
    }
}

/// Credentials from a container task-role endpoint.
/// Shares the isolated short-timeout client built for metadata probing.
#[derive(Debug, Clone)]
pub struct ContainerProvider {
    url: String,
    http: reqwest::Client,
}

impl ContainerProvider {
    pub const NAME: &'static str = "container-role";

    pub fn new(url: String, http: reqwest::Client) -> Self {
        Self { url, http }
    }

    pub async fn retrieve(&self) -> Result<Credentials> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("container credentials endpoint unreachable")?;
        anyhow::ensure!(
            response.status().is_success(),
            "container credentials endpoint returned {}",
            response.status()
        );

        let document: crate::metadata::SecurityCredentials = response
            .json()
            .await
            .context("malformed credential document from the container endpoint")?;
        let expiration = document.expires_at();
        if document.expiration.is_some() && expiration.is_none() {
            debug!("ignoring unparsable expiration on container credentials");
        }

        Ok(Credentials {
            access_key_id: document.access_key_id,
            secret_access_key: document.secret_access_key,
            session_token: document.token,
            expiration,
            source: Self::NAME,
        })
    }
}

/// Credentials from the instance role exposed by the metadata service
#[derive(Debug, Clone)]
pub struct InstanceRoleProvider {
    metadata: MetadataClient,
}

impl InstanceRoleProvider {
    pub const NAME: &'static str = "instance-metadata";

    pub fn new(metadata: MetadataClient) -> Self {
        Self { metadata }
    }

    pub async fn retrieve(&self) -> Result<Credentials> {
        let document = self.metadata.security_credentials().await?;
        let expiration = document.expires_at();
        if document.expiration.is_some() && expiration.is_none() {
            debug!("ignoring unparsable expiration on instance role credentials");
        }

        Ok(Credentials {
            access_key_id: document.access_key_id,
            secret_access_key: document.secret_access_key,
            session_token: document.token,
            expiration,
            source: Self::NAME,
        })
    }
}
