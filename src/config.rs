//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

const APP_NAME: &str = "aws-resource-driver";

/// Service settings derived from defaults, `driver.toml`, and `DRIVER_*`
/// environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "DRIVER",
    discovery(
        app_name = "aws-resource-driver",
        env_var = "DRIVER_CONFIG_PATH",
        config_file_name = "driver.toml",
        dotfile_name = ".driver.toml",
        project_file_name = "driver.toml"
    )
)]
pub struct DriverConfig {
    /// TCP port the HTTP server listens on.
    #[ortho_config(default = 8080)]
    pub port: u16,
    /// Seconds to wait for a cache cluster to become available.
    #[ortho_config(default = 300)]
    pub timeout_limit: u64,
    /// Serve requests with the side-effect free provisioning client.
    #[ortho_config(default = false)]
    pub use_fake_aws_client: bool,
    /// Tracing filter used when `RUST_LOG` is unset.
    #[ortho_config(default = "info".to_owned())]
    pub log_filter: String,
}

/// Metadata store connection settings from `DATABASE_*` variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "DATABASE")]
pub struct DatabaseConfig {
    /// Database name.
    pub name: String,
    /// Role used to connect.
    pub user: String,
    /// Password for [`DatabaseConfig::user`], when the server requires one.
    pub password: Option<String>,
    /// Database host name or address.
    #[ortho_config(default = "localhost".to_owned())]
    pub host: String,
    /// Connection attempts made at startup before giving up.
    #[ortho_config(default = 6)]
    pub connect_attempts: u32,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to driver.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(metadata.missing());
    }
    Ok(())
}

impl DriverConfig {
    /// Loads configuration without parsing CLI arguments. Values merge
    /// defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from(APP_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Budget for cache cluster readiness.
    #[must_use]
    pub const fn readiness_budget(&self) -> Duration {
        Duration::from_secs(self.timeout_limit)
    }

    /// Performs semantic validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the timeout is zero and
    /// [`ConfigError::MissingField`] when the log filter is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_limit == 0 {
            return Err(ConfigError::Invalid(String::from(
                "timeout limit must be greater than zero: set DRIVER_TIMEOUT_LIMIT or timeout_limit in driver.toml",
            )));
        }
        require_field(
            &self.log_filter,
            &FieldMetadata::new("log filter", "DRIVER_LOG_FILTER", "log_filter"),
        )
    }
}

impl DatabaseConfig {
    /// Loads configuration without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from(APP_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages name
    /// the environment variable to set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when no connection attempt is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.name,
            &FieldMetadata::new("database name", "DATABASE_NAME", "name"),
        )?;
        require_field(
            &self.user,
            &FieldMetadata::new("database user", "DATABASE_USER", "user"),
        )?;
        require_field(
            &self.host,
            &FieldMetadata::new("database host", "DATABASE_HOST", "host"),
        )?;
        if self.connect_attempts == 0 {
            return Err(ConfigError::Invalid(String::from(
                "DATABASE_CONNECT_ATTEMPTS must be at least 1",
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a value is present but out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
