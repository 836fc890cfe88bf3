use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::constants::{
    DEFAULT_METADATA_ENDPOINT, DEFAULT_METADATA_TIMEOUT, METADATA_TIMEOUT_ENV_VAR,
};
use crate::environment::EnvSnapshot;

/// IAM info document served at /latest/meta-data/iam/info
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamInfo {
    pub code: String,
    pub instance_profile_arn: String,
}

/// Credential document served for an instance role or by a container
/// credentials endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityCredentials {
    #[serde(default)]
    pub code: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

impl SecurityCredentials {
    /// Expiration timestamp, if present and parsable as RFC 3339
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.expiration
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|when| when.with_timezone(&chrono::Utc))
    }
}

/// Client for an instance-metadata-style service.
///
/// Carries its own HTTP client so the short probe timeout never leaks into
/// other outbound calls in the process.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    endpoint: String,
    endpoint_overridden: bool,
}

impl MetadataClient {
    /// Build an isolated client with the probe timeout policy and the
    /// optional endpoint override applied
    pub fn new(env: &EnvSnapshot) -> Result<Self> {
        let timeout = resolve_timeout(env);
        info!("setting metadata service timeout to {timeout:?}");

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to construct the metadata HTTP client")?;

        let (endpoint, endpoint_overridden) = match &env.metadata_url {
            Some(url) => {
                info!("using custom metadata endpoint: {url:?}");
                (url.trim_end_matches('/').to_string(), true)
            }
            None => (DEFAULT_METADATA_ENDPOINT.to_string(), false),
        };

        Ok(Self {
            http,
            endpoint,
            endpoint_overridden,
        })
    }

    /// The endpoint for log messages: the override if one was applied,
    /// otherwise "default location"
    pub fn describe_endpoint(&self) -> &str {
        if self.endpoint_overridden {
            &self.endpoint
        } else {
            "default location"
        }
    }

    /// A clone of the underlying isolated HTTP client, for providers that
    /// must share its timeout policy
    pub fn http_client(&self) -> reqwest::Client {
        self.http.clone()
    }

    /// Whether a real metadata service answers at the endpoint.
    ///
    /// A well-formed instance-id response is required; a bare open port is
    /// not enough, something unrelated may be listening there.
    pub async fn available(&self) -> bool {
        let url = format!("{}/latest/meta-data/instance-id", self.endpoint);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => !body.trim().is_empty(),
                Err(err) => {
                    debug!("metadata instance-id response unreadable: {err}");
                    false
                }
            },
            Ok(response) => {
                debug!("metadata instance-id request returned {}", response.status());
                false
            }
            Err(err) => {
                debug!("metadata instance-id request failed: {err}");
                false
            }
        }
    }

    /// Fetch the IAM info document carrying the instance profile ARN
    pub async fn iam_info(&self) -> Result<IamInfo> {
        let url = format!("{}/latest/meta-data/iam/info", self.endpoint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("metadata service unreachable at {}", self.describe_endpoint()))?;
        ensure!(
            response.status().is_success(),
            "metadata service returned {} for the IAM info document",
            response.status()
        );

        let info: IamInfo = response
            .json()
            .await
            .context("malformed IAM info document from the metadata service")?;
        ensure!(
            info.code == "Success",
            "metadata service reported IAM info status {:?}",
            info.code
        );

        Ok(info)
    }

    /// Fetch credentials for the first role associated with this instance
    pub async fn security_credentials(&self) -> Result<SecurityCredentials> {
        let base = format!("{}/latest/meta-data/iam/security-credentials/", self.endpoint);
        let response = self
            .http
            .get(&base)
            .send()
            .await
            .with_context(|| format!("metadata service unreachable at {}", self.describe_endpoint()))?;
        ensure!(
            response.status().is_success(),
            "metadata service returned {} listing instance roles",
            response.status()
        );

        let listing = response
            .text()
            .await
            .context("unreadable instance role listing from the metadata service")?;
        let role = listing
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| anyhow!("no role is associated with this instance"))?;
        debug!("fetching credentials for instance role {role:?}");

        let response = self
            .http
            .get(format!("{base}{role}"))
            .send()
            .await
            .with_context(|| format!("failed to fetch credentials for instance role {role:?}"))?;
        ensure!(
            response.status().is_success(),
            "metadata service returned {} for instance role {role:?}",
            response.status()
        );

        let credentials: SecurityCredentials = response
            .json()
            .await
            .context("malformed credential document from the metadata service")?;
        if let Some(code) = &credentials.code {
            ensure!(
                code == "Success",
                "metadata service reported credential status {code:?} for role {role:?}"
            );
        }

        Ok(credentials)
    }
}

/// Probe timeout: 100ms unless a positive duration override is set.
/// Unparsable or non-positive overrides are ignored with a warning.
fn resolve_timeout(env: &EnvSnapshot) -> Duration {
    let Some(raw) = env.metadata_timeout.as_deref() else {
        return DEFAULT_METADATA_TIMEOUT;
    };

    match humantime::parse_duration(raw) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        Ok(_) => {
            warn!(
                "non-positive value of {METADATA_TIMEOUT_ENV_VAR} ({raw:?}) is meaningless, \
                 using the {DEFAULT_METADATA_TIMEOUT:?} default"
            );
            DEFAULT_METADATA_TIMEOUT
        }
        Err(err) => {
            warn!(
                "cannot parse {METADATA_TIMEOUT_ENV_VAR} ({raw:?}) as a duration: {err}, \
                 using the {DEFAULT_METADATA_TIMEOUT:?} default"
            );
            DEFAULT_METADATA_TIMEOUT
        }
    }
}
