//! Application configuration.

use serde::{Deserialize, Serialize};
use stratum_std::middleware::MiddlewareScope;
use thiserror::Error;

/// Errors raised while loading an [`ApplicationConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The input is not valid JSON for this shape.
    #[error("invalid application config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The input parsed but a value is unusable.
    #[error("invalid application config: {0}")]
    Invalid(String),
}

/// Settings for one application layer.
///
/// Every field has a default, so `{}` is a valid config:
///
/// ```rust
/// use stratum::config::ApplicationConfig;
/// use stratum::MiddlewareScope;
///
/// let config = ApplicationConfig::from_json_str(
///     r#"{ "name": "security", "default_middleware_scope": "shared" }"#,
/// ).unwrap();
/// assert_eq!(config.name, "security");
/// assert_eq!(config.default_middleware_scope, MiddlewareScope::Shared);
/// assert!(!config.eager_controllers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplicationConfig {
    /// Layer name, used in logs and as the root scope's name.
    pub name: String,
    /// Middleware scope for steps that don't choose their own.
    pub default_middleware_scope: MiddlewareScope,
    /// Resolve every controller during assembly, not only singletons.
    pub eager_controllers: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            default_middleware_scope: MiddlewareScope::PerInvocation,
            eager_controllers: false,
        }
    }
}

impl ApplicationConfig {
    /// A default config with `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that the type system can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("`name` must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ApplicationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ApplicationConfig::default());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = ApplicationConfig::from_json_str(r#"{"name": "  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ApplicationConfig::from_json_str(r#"{"nmae": "typo"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
