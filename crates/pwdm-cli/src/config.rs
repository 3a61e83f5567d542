//! Configuration management for pwdm
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/pwdm/pwdm.toml`
//! - macOS: `~/Library/Application Support/io.pwdm.pwdm/pwdm.toml`
//! - Windows: `%APPDATA%\pwdm\pwdm\config\pwdm.toml`

use std::path::{Path, PathBuf};

use pwdm_crypto::envelope::{RecipientPublicKey, DEFAULT_SERVER_PUBLIC_KEY};
use pwdm_crypto::rsa::{DEFAULT_KEY_BITS, MAX_KEY_BITS, MIN_KEY_BITS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE: &str = "pwdm.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// # Example TOML
///
/// ```toml
/// [server]
/// ecc_public_key = "MFkwEwYH..."
///
/// [keys]
/// public_key_path = "/home/me/.pwdm/public.pem"
/// private_key_path = "/home/me/.pwdm/private.pem"
/// default_bits = 2048
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub keys: KeysConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Recipient P-256 key for password envelopes (base64 SPKI)
    #[serde(default = "default_ecc_public_key")]
    pub ecc_public_key: String,
}

fn default_ecc_public_key() -> String {
    DEFAULT_SERVER_PUBLIC_KEY.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ecc_public_key: default_ecc_public_key(),
        }
    }
}

impl ServerConfig {
    pub fn recipient(&self) -> Result<RecipientPublicKey, ConfigError> {
        RecipientPublicKey::parse(&self.ecc_public_key).map_err(|e| {
            ConfigError::ValidationError(format!("server.ecc_public_key: {e}"))
        })
    }
}

/// Where the user's RSA key files live. Paths given on the command line win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,

    /// Modulus size for `keygen`
    #[serde(default = "default_bits")]
    pub default_bits: usize,
}

fn default_bits() -> usize {
    DEFAULT_KEY_BITS
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            public_key_path: None,
            private_key_path: None,
            default_bits: default_bits(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from `--config` if given, otherwise the default location.
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        match custom_path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "pwdm", "pwdm")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the default config on first run. Returns true if a file was created.
    pub fn create_default_if_missing() -> Result<bool, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::create_default_at(&path),
            None => Ok(false),
        }
    }

    pub fn create_default_at(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::sample_toml())?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&self.keys.default_bits) {
            return Err(ConfigError::ValidationError(format!(
                "keys.default_bits must be between {MIN_KEY_BITS} and {MAX_KEY_BITS}, got {}",
                self.keys.default_bits
            )));
        }

        self.server.recipient()?;
        Ok(())
    }

    /// Commented default file written by `config init`.
    pub fn sample_toml() -> String {
        format!(
            r#"# pwdm configuration

[server]
# Recipient P-256 public key for password envelopes (base64 SubjectPublicKeyInfo)
ecc_public_key = "{DEFAULT_SERVER_PUBLIC_KEY}"

[keys]
# Default key files for check-key / sign / verify / seal / open
# public_key_path = ""
# private_key_path = ""
# RSA modulus size for keygen (2048..=4096)
default_bits = {DEFAULT_KEY_BITS}

[output]
# Output format: "table", "json", "quiet"
format = "table"
# Enable verbose output
verbose = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
        )
    }
}

/// CLI flags that override config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_format: Option<String>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
}

impl Config {
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if overrides.debug == Some(true) {
            self.logging.level = "debug".to_string();
        }
        self
    }
}
