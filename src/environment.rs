use std::{env, path::PathBuf};

use crate::constants::{
    CONTAINER_CREDENTIALS_FULL_URI_ENV_VAR, CONTAINER_CREDENTIALS_RELATIVE_URI_ENV_VAR,
    METADATA_TIMEOUT_ENV_VAR, METADATA_URL_ENV_VAR,
};

/// One-shot snapshot of every environment variable the credential core
/// consumes. Captured once at chain-build time so the rest of the code never
/// touches the process environment, and tests can construct snapshots
/// directly.
///
/// Empty values are treated the same as unset ones.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    /// AWS_ACCESS_KEY_ID, falling back to AWS_ACCESS_KEY
    pub access_key_id: Option<String>,
    /// AWS_SECRET_ACCESS_KEY, falling back to AWS_SECRET_KEY
    pub secret_access_key: Option<String>,
    /// AWS_SESSION_TOKEN
    pub session_token: Option<String>,
    /// AWS_METADATA_URL
    pub metadata_url: Option<String>,
    /// AWS_METADATA_TIMEOUT, unparsed duration string
    pub metadata_timeout: Option<String>,
    /// AWS_CONTAINER_CREDENTIALS_RELATIVE_URI
    pub container_credentials_relative_uri: Option<String>,
    /// AWS_CONTAINER_CREDENTIALS_FULL_URI
    pub container_credentials_full_uri: Option<String>,
    /// AWS_SHARED_CREDENTIALS_FILE
    pub shared_credentials_file: Option<PathBuf>,
    /// AWS_PROFILE
    pub profile: Option<String>,
}

impl EnvSnapshot {
    /// Capture the current process environment
    pub fn capture() -> Self {
        Self {
            access_key_id: non_empty("AWS_ACCESS_KEY_ID").or_else(|| non_empty("AWS_ACCESS_KEY")),
            secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY")
                .or_else(|| non_empty("AWS_SECRET_KEY")),
            session_token: non_empty("AWS_SESSION_TOKEN"),
            metadata_url: non_empty(METADATA_URL_ENV_VAR),
            metadata_timeout: non_empty(METADATA_TIMEOUT_ENV_VAR),
            container_credentials_relative_uri: non_empty(
                CONTAINER_CREDENTIALS_RELATIVE_URI_ENV_VAR,
            ),
            container_credentials_full_uri: non_empty(CONTAINER_CREDENTIALS_FULL_URI_ENV_VAR),
            shared_credentials_file: non_empty("AWS_SHARED_CREDENTIALS_FILE").map(PathBuf::from),
            profile: non_empty("AWS_PROFILE"),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_vars<const N: usize>(vars: [(&str, Option<&str>); N], f: impl FnOnce()) {
        let originals: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| ((*key).to_string(), env::var(key).ok()))
            .collect();

        unsafe {
            for (key, value) in vars {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }

        f();

        unsafe {
            for (key, original) in originals {
                match original {
                    Some(val) => env::set_var(&key, val),
                    None => env::remove_var(&key),
                }
            }
        }
    }

    #[test]
    #[serial]
    fn test_capture_reads_primary_credential_vars() {
        with_vars(
            [
                ("AWS_ACCESS_KEY_ID", Some("AKIAEXAMPLE")),
                ("AWS_ACCESS_KEY", None),
                ("AWS_SECRET_ACCESS_KEY", Some("secret")),
                ("AWS_SECRET_KEY", None),
                ("AWS_SESSION_TOKEN", Some("token")),
            ],
            || {
                let snapshot = EnvSnapshot::capture();
                assert_eq!(snapshot.access_key_id.as_deref(), Some("AKIAEXAMPLE"));
                assert_eq!(snapshot.secret_access_key.as_deref(), Some("secret"));
                assert_eq!(snapshot.session_token.as_deref(), Some("token"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_capture_falls_back_to_legacy_credential_vars() {
        with_vars(
            [
                ("AWS_ACCESS_KEY_ID", None),
                ("AWS_ACCESS_KEY", Some("AKIALEGACY")),
                ("AWS_SECRET_ACCESS_KEY", None),
                ("AWS_SECRET_KEY", Some("legacy-secret")),
            ],
            || {
                let snapshot = EnvSnapshot::capture();
                assert_eq!(snapshot.access_key_id.as_deref(), Some("AKIALEGACY"));
                assert_eq!(snapshot.secret_access_key.as_deref(), Some("legacy-secret"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_capture_treats_empty_values_as_unset() {
        with_vars(
            [
                (METADATA_URL_ENV_VAR, Some("")),
                (CONTAINER_CREDENTIALS_RELATIVE_URI_ENV_VAR, Some("")),
            ],
            || {
                let snapshot = EnvSnapshot::capture();
                assert_eq!(snapshot.metadata_url, None);
                assert_eq!(snapshot.container_credentials_relative_uri, None);
            },
        );
    }

    #[test]
    #[serial]
    fn test_capture_reads_metadata_overrides() {
        with_vars(
            [
                (METADATA_URL_ENV_VAR, Some("http://127.0.0.1:8080")),
                (METADATA_TIMEOUT_ENV_VAR, Some("5s")),
            ],
            || {
                let snapshot = EnvSnapshot::capture();
                assert_eq!(snapshot.metadata_url.as_deref(), Some("http://127.0.0.1:8080"));
                assert_eq!(snapshot.metadata_timeout.as_deref(), Some("5s"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_capture_reads_container_uris() {
        with_vars(
            [
                (
                    CONTAINER_CREDENTIALS_RELATIVE_URI_ENV_VAR,
                    Some("/v2/credentials/uuid"),
                ),
                (CONTAINER_CREDENTIALS_FULL_URI_ENV_VAR, None),
            ],
            || {
                let snapshot = EnvSnapshot::capture();
                assert_eq!(
                    snapshot.container_credentials_relative_uri.as_deref(),
                    Some("/v2/credentials/uuid")
                );
                assert_eq!(snapshot.container_credentials_full_uri, None);
            },
        );
    }
}
