//! Binding configuration
//!
//! Controls how a view registers its elements and what happens to
//! conversion failures. Loaded from TOML:
//!
//! ```toml
//! push_initial_values = true
//! validate_before_bind = true
//! conversion_errors = "report"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a binding configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read binding config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse binding config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize binding config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// What to do with a value that fails to convert during a push or write-back.
///
/// The binding always continues with the converter's default value; the
/// policy only decides whether anyone hears about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionErrorPolicy {
    /// Drop silently
    Ignore,
    /// Emit a `tracing` warning
    #[default]
    Log,
    /// Emit a warning and queue a diagnostic for `take_diagnostics`
    Report,
}

/// Configuration for a bound view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Push current view-model values into elements as they are registered
    pub push_initial_values: bool,
    /// Check all declared bindings before registering any element
    pub validate_before_bind: bool,
    /// Handling of conversion failures
    pub conversion_errors: ConversionErrorPolicy,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            push_initial_values: true,
            validate_before_bind: true,
            conversion_errors: ConversionErrorPolicy::default(),
        }
    }
}

impl BindingConfig {
    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Set the conversion error policy
    #[must_use]
    pub fn with_conversion_errors(mut self, policy: ConversionErrorPolicy) -> Self {
        self.conversion_errors = policy;
        self
    }

    /// Set whether registration pushes initial values
    #[must_use]
    pub fn with_push_initial_values(mut self, push: bool) -> Self {
        self.push_initial_values = push;
        self
    }

    /// Set whether bindings are validated before registration
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_before_bind = validate;
        self
    }
}
