//! Service configuration loaded from TOML
//!
//! ```toml
//! admins = ["root"]
//!
//! [[proxy.resources]]
//! id = "get-resource"
//! method = "GET"
//! url = "/example/resource/:id"
//! urn = "urn:ews:example:instance:resource/{id}"
//! action = "example:Get"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::model::CallerContext;
use crate::validation::is_valid_action;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External identifiers treated as administrators
    pub admins: Vec<String>,

    /// Resources exposed through the authorizing proxy
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub resources: Vec<ProxyResource>,
}

/// One proxied endpoint and the URN/action it is authorized as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyResource {
    pub id: String,
    /// HTTP method, compared case-insensitively
    pub method: String,
    /// URL pattern; `:name` segments bind one path segment
    pub url: String,
    /// URN template; `{name}` is replaced by the bound segment
    pub urn: String,
    pub action: String,
}

impl ProxyResource {
    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidResource {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(self.invalid("id is empty"));
        }
        if self.method.is_empty() {
            return Err(self.invalid("method is empty"));
        }
        if !self.url.starts_with('/') {
            return Err(self.invalid(format!("url {} must start with /", self.url)));
        }
        if !self.urn.starts_with("urn:") || self.urn.contains('*') {
            return Err(self.invalid(format!("urn {} must be a concrete urn:", self.urn)));
        }
        if !is_valid_action(&self.action) || self.action.contains('*') {
            return Err(self.invalid(format!("action {} must be namespace:Verb", self.action)));
        }

        // Every placeholder needs a URL parameter to fill it
        for placeholder in placeholders(&self.urn) {
            let param = format!(":{}", placeholder);
            if !self.url.split('/').any(|segment| segment == param) {
                return Err(self.invalid(format!("urn placeholder {{{}}} has no url parameter", placeholder)));
            }
        }

        Ok(())
    }
}

/// Names inside `{...}` in a URN template
fn placeholders(template: &str) -> Vec<&str> {
    template
        .split('{')
        .skip(1)
        .filter_map(|rest| rest.split_once('}').map(|(name, _)| name))
        .collect()
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for resource in &self.proxy.resources {
            resource.validate()?;
        }
        Ok(())
    }

    /// Caller context for an authenticated identifier
    pub fn caller_for(&self, identifier: &str) -> CallerContext {
        if self.admins.iter().any(|admin| admin == identifier) {
            CallerContext::admin(identifier)
        } else {
            CallerContext::user(identifier)
        }
    }
}
