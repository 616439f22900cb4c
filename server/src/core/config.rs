use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_REFRESH_TOKEN_DAYS, DEFAULT_USER_PASSWORD, MAX_ACCESS_TOKEN_MINUTES,
    MAX_REFRESH_TOKEN_DAYS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub access_token_minutes: Option<u32>,
    pub refresh_token_days: Option<u32>,
    pub default_password: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Top-level keys that matched no known section
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
        }

        if let Some(auth) = other.auth {
            let current = self.auth.get_or_insert_with(AuthFileConfig::default);
            if auth.access_token_minutes.is_some() {
                current.access_token_minutes = auth.access_token_minutes;
            }
            if auth.refresh_token_days.is_some() {
                current.refresh_token_days = auth.refresh_token_days;
            }
            if auth.default_password.is_some() {
                current.default_password = auth.default_password;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub access_token_minutes: u32,
    pub refresh_token_days: u32,
    /// Password given to users created without one
    pub default_password: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_days", &self.refresh_token_days)
            .field("default_password", &"[REDACTED]")
            .finish()
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.canvass/canvass.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;
        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Layer defaults, file config and CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let auth = AuthConfig {
            access_token_minutes: cli
                .access_token_minutes
                .or(file_auth.access_token_minutes)
                .unwrap_or(DEFAULT_ACCESS_TOKEN_MINUTES),
            refresh_token_days: cli
                .refresh_token_days
                .or(file_auth.refresh_token_days)
                .unwrap_or(DEFAULT_REFRESH_TOKEN_DAYS),
            default_password: cli
                .default_password
                .clone()
                .or(file_auth.default_password)
                .unwrap_or_else(|| DEFAULT_USER_PASSWORD.to_string()),
        };

        Self { server, auth }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if !(1..=MAX_ACCESS_TOKEN_MINUTES).contains(&self.auth.access_token_minutes) {
            anyhow::bail!(
                "Configuration error: auth.access_token_minutes must be between 1 and {}",
                MAX_ACCESS_TOKEN_MINUTES
            );
        }
        if !(1..=MAX_REFRESH_TOKEN_DAYS).contains(&self.auth.refresh_token_days) {
            anyhow::bail!(
                "Configuration error: auth.refresh_token_days must be between 1 and {}",
                MAX_REFRESH_TOKEN_DAYS
            );
        }
        if self.auth.default_password.is_empty() {
            anyhow::bail!("Configuration error: auth.default_password must not be empty");
        }
        Ok(())
    }
}

/// Get the profile config path (~/.canvass/canvass.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_file_config_parse_full() {
        let config = parse(
            r#"{
                "server": { "host": "0.0.0.0", "port": 8080 },
                "auth": { "access_token_minutes": 15, "refresh_token_days": 30, "default_password": "pw" }
            }"#,
        );

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(8080));
        let auth = config.auth.as_ref().unwrap();
        assert_eq!(auth.access_token_minutes, Some(15));
        assert_eq!(auth.refresh_token_days, Some(30));
        assert_eq!(auth.default_password.as_deref(), Some("pw"));
        assert!(config.unknown_fields().is_empty());
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config = parse("{}");
        assert!(config.server.is_none());
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_file_config_unknown_fields() {
        let config = parse(r#"{ "server": { "host": "localhost" }, "sever": 1 }"#);
        assert_eq!(config.unknown_fields(), vec!["sever"]);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = parse(r#"{ "server": { "host": "a", "port": 1 }, "auth": { "refresh_token_days": 3 } }"#);
        base.merge(parse(r#"{ "server": { "port": 2 }, "auth": { "access_token_minutes": 5 } }"#));

        let server = base.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("a"));
        assert_eq!(server.port, Some(2));
        let auth = base.auth.unwrap();
        assert_eq!(auth.access_token_minutes, Some(5));
        assert_eq!(auth.refresh_token_days, Some(3));
    }

    #[test]
    fn test_layer_defaults() {
        let config = AppConfig::layer(&CliConfig::default(), FileConfig::default());

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.auth.access_token_minutes, DEFAULT_ACCESS_TOKEN_MINUTES);
        assert_eq!(config.auth.refresh_token_days, DEFAULT_REFRESH_TOKEN_DAYS);
        assert_eq!(config.auth.default_password, DEFAULT_USER_PASSWORD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layer_cli_overrides_file() {
        let cli = CliConfig {
            host: Some("cli.host".to_string()),
            port: Some(3000),
            access_token_minutes: Some(10),
            ..Default::default()
        };
        let file = parse(
            r#"{ "server": { "host": "file.host", "port": 9000 }, "auth": { "access_token_minutes": 20, "refresh_token_days": 14 } }"#,
        );

        let config = AppConfig::layer(&cli, file);
        assert_eq!(config.server.host, "cli.host");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.access_token_minutes, 10);
        assert_eq!(config.auth.refresh_token_days, 14);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.auth.access_token_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.server.host.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.auth.default_password.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bounds_token_lifetimes() {
        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.auth.refresh_token_days = 100_000_000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.auth.access_token_minutes = MAX_ACCESS_TOKEN_MINUTES + 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.auth.access_token_minutes = MAX_ACCESS_TOKEN_MINUTES;
        config.auth.refresh_token_days = MAX_REFRESH_TOKEN_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_auth_config_debug_redacts_password() {
        let config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        let debug = format!("{:?}", config.auth);
        assert!(!debug.contains(DEFAULT_USER_PASSWORD));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(is_all_interfaces("[::]"));
        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
    }
}
