//! Configuration loading for lampsync-bridge.
//!
//! Configuration is loaded from a TOML file (default: `bridge.toml`). Every
//! section and field is optional; missing values fall back to the defaults
//! below, which describe the seven-load lighting board the bridge was built
//! for.

use lamp_core::{IdentifierRegistry, IdentityPolicy, PullTarget, RegistryError};
use lamp_types::{ActuatorHandle, ExternalId};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for lampsync-bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Push endpoint configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote platform configuration.
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Operational HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// The fixed actuator table.
    #[serde(default = "default_actuators")]
    pub actuators: Vec<ActuatorConfig>,
}

/// Push endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener (default: 0.0.0.0:8100).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Path the platform POSTs notifications to (default: `/`).
    #[serde(default = "default_notify_path")]
    pub notify_path: String,
}

/// Remote platform configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Opaque origin token sent as `X-M2M-Origin` on every fetch
    /// (default: the board's `Tue_20_12_22:Tue_20_12_22`).
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Delay between successive boot fetches in milliseconds (default: 2000).
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    /// Per-request timeout for boot fetches in seconds (default: 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// What to do when a pulled payload names a different actuator.
    #[serde(default)]
    pub identity_policy: IdentityPolicy,
}

/// Operational HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Enable metrics endpoint (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set (default: `info`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// One actuator: its platform identifier, output line and pull URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActuatorConfig {
    /// 4-character platform identifier.
    pub id: ExternalId,
    /// GPIO line driving the load.
    pub pin: u32,
    /// URL of the latest content instance for this actuator.
    pub url: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8100".to_string()
}

fn default_notify_path() -> String {
    "/".to_string()
}

fn default_origin() -> String {
    "Tue_20_12_22:Tue_20_12_22".to_string()
}

fn default_pace_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

const DEFAULT_PLATFORM_BASE: &str = "http://127.0.0.1:8080/~/in-cse/in-name/AE-WN";

fn default_actuators() -> Vec<ActuatorConfig> {
    [
        ("L026", 13, "WN-L026-01"),
        ("L001", 14, "WN-L001-03"),
        ("L002", 27, "WN-L002-02"),
        ("L003", 26, "WN-L003-02"),
        ("L004", 25, "WN-L004-02"),
        ("L005", 33, "WN-L005-02"),
        ("L014", 32, "WN-L014-01"),
    ]
    .into_iter()
    .filter_map(|(id, pin, node)| {
        Some(ActuatorConfig {
            id: ExternalId::new(id).ok()?,
            pin,
            url: format!("{DEFAULT_PLATFORM_BASE}/{node}/Status/la"),
        })
    })
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            notify_path: default_notify_path(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            pace_ms: default_pace_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            identity_policy: IdentityPolicy::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            platform: PlatformConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            actuators: default_actuators(),
        }
    }
}

impl PlatformConfig {
    /// Delay between successive boot fetches.
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    /// Per-request timeout for boot fetches.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// [`Config::validate`].
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for problems serde cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actuators.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one [[actuators]] entry is required".into(),
            });
        }
        if let Some(a) = self.actuators.iter().find(|a| a.url.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                reason: format!("actuator {} has an empty url", a.id),
            });
        }
        if self.platform.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "platform.request_timeout_secs must be at least 1".into(),
            });
        }
        if !self.server.notify_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "server.notify_path {:?} must start with '/'",
                    self.server.notify_path
                ),
            });
        }
        self.registry()?;
        Ok(())
    }

    /// Build the identifier registry from the actuator table.
    pub fn registry(&self) -> Result<IdentifierRegistry, RegistryError> {
        IdentifierRegistry::new(
            self.actuators
                .iter()
                .map(|a| (a.id.clone(), ActuatorHandle::new(a.pin))),
        )
    }

    /// Boot fetch targets, in configuration order.
    pub fn pull_targets(&self) -> Vec<PullTarget> {
        self.actuators
            .iter()
            .map(|a| PullTarget {
                external_id: a.id.clone(),
                url: a.url.clone(),
            })
            .collect()
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Configuration parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
    /// Actuator table has duplicate identifiers or pins.
    #[error("invalid actuator table: {0}")]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "0.0.0.0:8100");
        assert_eq!(config.platform.pace_ms, 2000);
        assert_eq!(config.platform.origin, "Tue_20_12_22:Tue_20_12_22");
        assert_eq!(config.platform.identity_policy, IdentityPolicy::Strict);
        assert_eq!(config.actuators.len(), 7);
        config.validate().unwrap();
    }

    #[test]
    fn default_actuator_table_matches_board() {
        let config = Config::default();
        let pins: Vec<(&str, u32)> = config
            .actuators
            .iter()
            .map(|a| (a.id.as_str(), a.pin))
            .collect();
        assert_eq!(
            pins,
            vec![
                ("L026", 13),
                ("L001", 14),
                ("L002", 27),
                ("L003", 26),
                ("L004", 25),
                ("L005", 33),
                ("L014", 32),
            ]
        );
        assert!(config.actuators[0].url.ends_with("/WN-L026-01/Status/la"));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
bind_address = "127.0.0.1:9000"
notify_path = "/notify"

[platform]
origin = "Tue_20_12_22:Tue_20_12_22"
pace_ms = 0
identity_policy = "trust-position"

[http]
metrics_enabled = false

[[actuators]]
id = "L026"
pin = 13
url = "http://cse/~/in-cse/in-name/AE-WN/WN-L026-01/Status/la"

[[actuators]]
id = "L001"
pin = 14
url = "http://cse/~/in-cse/in-name/AE-WN/WN-L001-03/Status/la"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.notify_path, "/notify");
        assert_eq!(config.platform.origin, "Tue_20_12_22:Tue_20_12_22");
        assert_eq!(config.platform.pace(), Duration::ZERO);
        assert_eq!(config.platform.request_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.platform.identity_policy,
            IdentityPolicy::TrustPosition
        );
        assert!(!config.http.metrics_enabled);
        assert_eq!(config.actuators.len(), 2);
        assert_eq!(config.actuators[1].pin, 14);

        let targets = config.pull_targets();
        assert_eq!(targets[0].external_id.as_str(), "L026");
        assert!(targets[1].url.contains("WN-L001-03"));
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.notify_path, "/");
        assert_eq!(config.logging.level, "info");
        assert!(config.http.metrics_enabled);
        assert_eq!(config.actuators.len(), 7);
    }

    #[test]
    fn bad_id_length_fails_parse() {
        let toml = r#"
[[actuators]]
id = "L26"
pin = 13
url = "http://cse/la"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn duplicate_ids_fail_validation() {
        let toml = r#"
[[actuators]]
id = "L026"
pin = 13
url = "http://cse/a"

[[actuators]]
id = "L026"
pin = 14
url = "http://cse/b"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Registry(RegistryError::DuplicateId(_)))
        ));
    }

    #[test]
    fn empty_url_fails_validation() {
        let mut config = Config::default();
        config.actuators[2].url = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_request_timeout_fails_validation() {
        let config: Config = toml::from_str("[platform]\nrequest_timeout_secs = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn empty_actuator_list_fails_validation() {
        let mut config = Config::default();
        config.actuators.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[platform]\npace_ms = 5\n\n[[actuators]]\nid = \"L014\"\npin = 32\nurl = \"http://cse/la\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.platform.pace_ms, 5);
        assert_eq!(config.actuators.len(), 1);
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let err = Config::from_file(std::path::Path::new("/nonexistent/bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
