use std::path::Path;

use serde::{Deserialize, Serialize};
use sockline_net::{SocksCredentials, SocksError, SocksVersion};

use crate::error::ConfigError;

/// Where the proxy lives. Passed explicitly to every facade call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub version: SocksVersion,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1080,
            version: SocksVersion::V5,
        }
    }
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            version: SocksVersion::V5,
        }
    }

    pub fn validate(&self) -> Result<(), SocksError> {
        if self.host.trim().is_empty() {
            return Err(SocksError::InvalidConfiguration(
                "proxy host is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub proxy: ProxyConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Username/password pair, if one is configured. Setting only one of
    /// the two is rejected.
    pub fn credentials(&self) -> Result<Option<SocksCredentials>, ConfigError> {
        match (&self.auth.username, &self.auth.password) {
            (Some(username), Some(password)) => Ok(Some(SocksCredentials::new(
                username.as_bytes(),
                password.as_bytes(),
            ))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::Invalid(
                "auth.username and auth.password must be set together".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientConfig, ProxyConfig};
    use assert_matches::assert_matches;
    use sockline_net::{SocksError, SocksVersion};

    use crate::error::ConfigError;

    #[test]
    fn defaults_point_at_local_proxy() {
        let config = ClientConfig::default();
        assert_eq!(config.proxy.host, "127.0.0.1");
        assert_eq!(config.proxy.port, 1080);
        assert_eq!(config.proxy.version, SocksVersion::V5);
        assert_eq!(config.logging.level, "info");
        assert!(config.credentials().unwrap().is_none());
    }

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sockline.toml");
        let mut config = ClientConfig::default();
        config.proxy.host = "proxy.internal".to_string();
        config.proxy.port = 9050;
        config.auth.username = Some("alice".to_string());
        config.auth.password = Some("secret".to_string());
        config.save(&path).unwrap();

        let loaded = ClientConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ClientConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, ClientConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: ClientConfig = toml::from_str("[proxy]\nport = 9050\n").unwrap();
        assert_eq!(config.proxy.host, "127.0.0.1");
        assert_eq!(config.proxy.port, 9050);
        assert_eq!(config.proxy.version, SocksVersion::V5);
    }

    #[test]
    fn rejects_other_versions() {
        let parsed = toml::from_str::<ClientConfig>("[proxy]\nversion = \"v4\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn half_configured_auth_is_invalid() {
        let mut config = ClientConfig::default();
        config.auth.username = Some("alice".to_string());
        assert_matches!(config.credentials(), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_host_is_invalid() {
        assert_matches!(
            ProxyConfig::new(" ", 1080).validate(),
            Err(SocksError::InvalidConfiguration(_))
        );
    }
}
