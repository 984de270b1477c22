//! Configuration management infrastructure.
//!
//! The configuration file names the trust anchors the validator accepts and
//! any store-level certificate properties, so the same anchors can be reused
//! across runs without repeating them on the command line.

use crate::domain::crypto::{CertificateProperties, CertificatePropertyTable};
use crate::domain::policy::AnchorClass;
use crate::infra::error::{ValidationError, ValidationResult};
use const_oid::ObjectIdentifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Validator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfiguration {
    /// Also trust the platform's default OpenSSL certificate locations.
    /// System roots count as generic code-signing anchors.
    pub use_system_roots: bool,

    /// Accept well-formed signatures whose origin could not be established.
    pub allow_unknown_origin: bool,

    /// PEM files holding trust anchors, each with its class.
    pub trust_anchors: Vec<TrustAnchorEntry>,

    /// Store-level certificate properties keyed by SHA-256 thumbprint.
    pub certificate_properties: Vec<CertificatePropertyEntry>,
}

/// One configured anchor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAnchorEntry {
    pub path: PathBuf,
    pub class: AnchorClass,
}

/// Properties attached to one certificate by thumbprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePropertyEntry {
    /// Lowercase or uppercase hex SHA-256 of the certificate DER.
    pub thumbprint: String,
    /// EKU identifiers used when the certificate carries no EKU extension.
    #[serde(default)]
    pub enhanced_key_usage: Vec<String>,
}

impl Default for ValidatorConfiguration {
    fn default() -> Self {
        Self {
            use_system_roots: true,
            allow_unknown_origin: false,
            trust_anchors: Vec::new(),
            certificate_properties: Vec::new(),
        }
    }
}

impl ValidatorConfiguration {
    /// Build the store-level property table from the configured entries.
    #[must_use]
    pub fn to_property_table(&self) -> CertificatePropertyTable {
        let mut table = CertificatePropertyTable::new();
        for entry in &self.certificate_properties {
            table.insert(
                &entry.thumbprint,
                CertificateProperties {
                    enhanced_key_usage: Some(entry.enhanced_key_usage.clone()),
                },
            );
        }
        table
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> ValidationResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ValidationResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("p7x-validator").join("config.toml"))
        } else {
            Ok(PathBuf::from("p7x-validator-config.toml"))
        }
    }

    /// Load configuration from file, falling back to defaults when it doesn't exist
    pub fn load_or_default(&self) -> ValidationResult<ValidatorConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::debug!(
                "Configuration file not found, using defaults: {}",
                self.config_path.display()
            );
            Ok(ValidatorConfiguration::default())
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> ValidationResult<ValidatorConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            ValidationError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: ValidatorConfiguration = toml::from_str(&content).map_err(|e| {
            ValidationError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &ValidatorConfiguration) -> ValidationResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ValidationError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            ValidationError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            ValidationError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Validate configuration values
pub fn validate_config(config: &ValidatorConfiguration) -> ValidationResult<()> {
    for anchor in &config.trust_anchors {
        if !anchor.path.is_file() {
            return Err(ValidationError::ConfigurationError(format!(
                "Trust anchor file not found: {}",
                anchor.path.display()
            )));
        }
    }

    for entry in &config.certificate_properties {
        if entry.thumbprint.len() != 64 || !entry.thumbprint.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::ConfigurationError(format!(
                "Invalid SHA-256 thumbprint: {}",
                entry.thumbprint
            )));
        }
        for oid in &entry.enhanced_key_usage {
            ObjectIdentifier::new(oid).map_err(|e| {
                ValidationError::ConfigurationError(format!("Invalid EKU identifier {oid}: {e}"))
            })?;
        }
    }

    Ok(())
}
