/// Configuration handed to the credential core by the CLI layer.
///
/// Static credentials set here take priority over every other source in the
/// provider chain. The core never mutates this.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub security_token: Option<String>,
    pub region: Option<String>,
}

impl Config {
    /// Both halves of a static key pair are present and non-empty
    pub fn has_static_credentials(&self) -> bool {
        matches!(
            (self.access_key.as_deref(), self.secret_key.as_deref()),
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_static_credentials() {
        let config = Config {
            access_key: Some("AKIAEXAMPLE".to_string()),
            secret_key: Some("secret".to_string()),
            ..Config::default()
        };
        assert!(config.has_static_credentials());
    }

    #[test]
    fn test_missing_secret_is_not_static() {
        let config = Config {
            access_key: Some("AKIAEXAMPLE".to_string()),
            ..Config::default()
        };
        assert!(!config.has_static_credentials());
    }

    #[test]
    fn test_empty_values_are_not_static() {
        let config = Config {
            access_key: Some(String::new()),
            secret_key: Some(String::new()),
            ..Config::default()
        };
        assert!(!config.has_static_credentials());
    }
}
