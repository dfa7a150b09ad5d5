//! Configuration parsing and structures

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::env::substitute_env_vars;
use crate::error::VfsError;
use crate::uri::is_valid_scheme;

/// Free-form provider options, interpreted by the provider factory
pub type ProviderOptions = serde_yaml::Mapping;

// =============================================================================
// Raw Config (Deserialized from YAML)
// =============================================================================

/// Raw configuration as deserialized from YAML.
/// This is converted to `Config` via `resolve()`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-kind provider options inherited by every entry of that kind
    #[serde(default)]
    pub defaults: HashMap<String, ProviderOptions>,

    /// Providers to register, in order
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,

    /// Provider for unregistered schemes
    pub default_provider: Option<RawDefaultProviderConfig>,

    /// File replicator
    pub replicator: Option<ReplicatorConfig>,

    /// Base directory for relative names (resolved through the local provider)
    pub base_dir: Option<PathBuf>,

    /// YAML file of message overrides (code -> template)
    pub messages: Option<PathBuf>,
}

/// Raw provider entry before option inheritance
#[derive(Debug, Clone, Deserialize)]
pub struct RawProviderConfig {
    /// Provider kind, matched against the builder's factories
    pub kind: String,

    /// URI schemes handled by this provider
    pub schemes: Vec<String>,

    /// Options (override per-kind defaults key by key)
    #[serde(default)]
    pub options: ProviderOptions,
}

/// Raw default provider entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawDefaultProviderConfig {
    pub kind: String,

    #[serde(default)]
    pub options: ProviderOptions,
}

/// Replicator configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicatorConfig {
    /// Parent directory for replicated files (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,

    /// Name prefix of the replicator's temporary directory
    pub prefix: Option<String>,
}

// =============================================================================
// Resolved Config (Ready for use)
// =============================================================================

/// Top-level configuration (resolved from RawConfig)
#[derive(Debug, Clone)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Providers (options fully merged)
    pub providers: Vec<ProviderConfig>,

    /// Provider for unregistered schemes
    pub default_provider: Option<DefaultProviderConfig>,

    /// File replicator
    pub replicator: Option<ReplicatorConfig>,

    /// Base directory for relative names
    pub base_dir: Option<PathBuf>,

    /// Message overrides file
    pub messages: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Provider configuration (resolved)
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: String,
    pub schemes: Vec<String>,
    pub options: ProviderOptions,
}

/// Default provider configuration (resolved)
#[derive(Debug, Clone)]
pub struct DefaultProviderConfig {
    pub kind: String,
    pub options: ProviderOptions,
}

// =============================================================================
// Resolution Logic
// =============================================================================

impl RawConfig {
    /// Resolve raw config into final config by merging entry options over per-kind defaults
    pub fn resolve(self) -> Result<Config, ConfigError> {
        let RawConfig {
            logging,
            defaults,
            providers,
            default_provider,
            replicator,
            base_dir,
            messages,
        } = self;

        let providers = providers
            .into_iter()
            .map(|raw| ProviderConfig {
                options: merge_options(defaults.get(&raw.kind), raw.options),
                kind: raw.kind,
                schemes: raw.schemes,
            })
            .collect();

        let default_provider = default_provider.map(|raw| DefaultProviderConfig {
            options: merge_options(defaults.get(&raw.kind), raw.options),
            kind: raw.kind,
        });

        Ok(Config {
            logging,
            providers,
            default_provider,
            replicator,
            base_dir,
            messages,
        })
    }
}

/// Priority: entry option > per-kind default
fn merge_options(defaults: Option<&ProviderOptions>, entry: ProviderOptions) -> ProviderOptions {
    let mut merged = defaults.cloned().unwrap_or_default();
    for (key, value) in entry {
        merged.insert(key, value);
    }
    merged
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string
    ///
    /// `${VAR}` references are substituted before parsing.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let content = substitute_env_vars(content)?;
        let raw: RawConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        raw.resolve()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() && self.default_provider.is_none() {
            return Err(ConfigError::ValidationError(
                "At least one provider or a default provider is required".to_string(),
            ));
        }

        // Check for schemes claimed twice
        let mut schemes = HashSet::new();
        for (index, provider) in self.providers.iter().enumerate() {
            if provider.kind.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Provider #{}: kind cannot be empty",
                    index
                )));
            }

            for scheme in &provider.schemes {
                if !is_valid_scheme(scheme) {
                    return Err(ConfigError::ValidationError(format!(
                        "Provider #{} ({}): invalid scheme {:?}",
                        index, provider.kind, scheme
                    )));
                }
                if !schemes.insert(scheme.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "Duplicate scheme: {:?}",
                        scheme
                    )));
                }
            }
        }

        if let Some(default_provider) = &self.default_provider {
            if default_provider.kind.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Default provider kind cannot be empty".to_string(),
                ));
            }
        }

        if let Some(ReplicatorConfig {
            prefix: Some(prefix),
            ..
        }) = &self.replicator
        {
            if prefix.is_empty() {
                return Err(ConfigError::ValidationError(
                    "Replicator prefix cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for VfsError {
    fn from(e: ConfigError) -> Self {
        VfsError::Config(e.to_string())
    }
}
