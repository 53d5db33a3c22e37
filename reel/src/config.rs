// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::catalog::ScanPolicy;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DEFAULT_GEMINI_PORT: u16 = 1965;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn address_tuple(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_GEMINI_PORT
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_write_timeout_secs() -> u64 {
    60
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TlsConfig {
    /// Hostname the self-signed certificate is issued for.
    pub domain: String,
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
}

fn default_duration_days() -> u32 {
    365
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CatalogConfig {
    /// Scan the films directory at startup instead of on the first request.
    #[serde(default)]
    pub eager: bool,
    #[serde(default)]
    pub on_scan_error: ScanPolicy,
}

/// Template sources for the three catalog pages.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilmTemplatesConfig {
    pub index: String,
    pub display: String,
    pub tag: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub tls: TlsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub films: FilmTemplatesConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    pub logging: LoggingConfig,
    pub catalog: CatalogConfig,
    pub films: FilmTemplatesConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_file(&root.join(CONFIG_FILE_NAME))
    }

    pub fn load_file(config_path: &Path) -> Result<Self, ConfigError> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. If validation fails, the server does not start.
    pub fn load_and_validate(config_path: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load_file(config_path)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        Self::validate_server(&self.server)?;
        Self::validate_tls(&self.tls)?;
        Self::validate_logging(&self.logging)?;
        Self::validate_templates(&self.films);

        Ok(ValidatedConfig {
            server: self.server,
            tls: self.tls,
            logging: self.logging,
            catalog: self.catalog,
            films: self.films,
        })
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host must not be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("read_timeout_secs", server.read_timeout_secs),
            ("write_timeout_secs", server.write_timeout_secs),
        ] {
            if !(1..=3600).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "server.{} must be between 1 and 3600, got: {}",
                    name, value
                )));
            }
        }

        if server.shutdown_timeout_secs > 3600 {
            return Err(ConfigError::ValidationError(format!(
                "server.shutdown_timeout_secs must be at most 3600, got: {}",
                server.shutdown_timeout_secs
            )));
        }

        Ok(())
    }

    fn validate_tls(tls: &TlsConfig) -> Result<(), ConfigError> {
        let domain = tls.domain.trim();
        if domain.is_empty() {
            return Err(ConfigError::ValidationError(
                "tls.domain must not be empty".to_string(),
            ));
        }
        if domain.contains(['/', ' ', ':']) {
            return Err(ConfigError::ValidationError(format!(
                "tls.domain must be a bare hostname, got: {}",
                domain
            )));
        }
        if !(1..=3650).contains(&tls.duration_days) {
            return Err(ConfigError::ValidationError(format!(
                "tls.duration_days must be between 1 and 3650, got: {}",
                tls.duration_days
            )));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        match logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error; got: {}",
                other
            ))),
        }
    }

    fn validate_templates(films: &FilmTemplatesConfig) {
        for (name, source) in [
            ("index", &films.index),
            ("display", &films.display),
            ("tag", &films.tag),
        ] {
            if source.trim().is_empty() {
                warn!("films.{} template is empty; its pages will render blank", name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    const MINIMAL: &str = "tls:\n  domain: \"example.org\"\nfilms:\n  index: \"i\"\n  display: \"d\"\n  tag: \"t\"\n";

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).expect("valid yaml")
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(MINIMAL).validate().expect("valid config");
        assert_eq!(config.server.port, 1965);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.server.write_timeout(), Duration::from_secs(60));
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.tls.duration_days, 365);
        assert_eq!(config.logging.level, "info");
        assert!(!config.catalog.eager);
        assert_eq!(config.catalog.on_scan_error, ScanPolicy::Abort);
    }

    #[test]
    fn scan_policy_parses_lowercase() {
        let yaml = format!("{}catalog:\n  eager: true\n  on_scan_error: skip\n", MINIMAL);
        let config = parse(&yaml).validate().unwrap();
        assert!(config.catalog.eager);
        assert_eq!(config.catalog.on_scan_error, ScanPolicy::Skip);
    }

    #[test]
    fn rejects_empty_domain() {
        let mut config = parse(MINIMAL);
        config.tls.domain = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_duration() {
        let mut config = parse(MINIMAL);
        config.tls.duration_days = 0;
        let err = config.validate().expect_err("zero days is invalid");
        assert!(err.to_string().contains("duration_days"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = parse(MINIMAL);
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_read_timeout() {
        let mut config = parse(MINIMAL);
        config.server.read_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let fixture = TestFixtureRoot::new_unique("config-missing").unwrap();
        let err = Config::load(fixture.path()).expect_err("no config file");
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn load_rejects_unknown_sections() {
        let fixture = TestFixtureRoot::new_unique("config-unknown").unwrap();
        let yaml = format!("{}admin:\n  path: \"/admin\"\n", MINIMAL);
        std::fs::write(fixture.path().join(CONFIG_FILE_NAME), yaml).unwrap();
        let err = Config::load(fixture.path()).expect_err("unknown section");
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn load_requires_templates() {
        let fixture = TestFixtureRoot::new_unique("config-no-films").unwrap();
        std::fs::write(
            fixture.path().join(CONFIG_FILE_NAME),
            "tls:\n  domain: \"example.org\"\n",
        )
        .unwrap();
        assert!(Config::load(fixture.path()).is_err());
    }
}
