//! Configuration types for provider handlers and zone selection
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Environment variable forcing dry-run mode when set to `dry-run`
pub const MODE_ENV: &str = "DNSRECON_MODE";

/// Whether [`MODE_ENV`] requests dry-run mode
pub fn dry_run_from_env() -> bool {
    std::env::var(MODE_ENV)
        .unwrap_or_default()
        .eq_ignore_ascii_case("dry-run")
}

/// Configuration of a provider handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Provider binding configuration
    pub provider: ProviderConfig,

    /// Simulate changes without issuing mutating provider calls
    #[serde(default)]
    pub dry_run: bool,

    /// Admission control for provider API calls
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Zone-state cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl HandlerConfig {
    /// Create a handler configuration with defaults
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            dry_run: false,
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Dry-run from the configuration or the environment
    pub fn effective_dry_run(&self) -> bool {
        self.dry_run || dry_run_from_env()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// API base URL override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },

    /// In-memory provider, used for tests and simulations
    #[serde(rename = "inmemory")]
    InMemory {
        /// Zones created on startup
        #[serde(default)]
        zones: Vec<InMemoryZoneConfig>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::InMemory { zones } => {
                for zone in zones {
                    if zone.id.is_empty() || zone.domain.is_empty() {
                        return Err(crate::Error::config(
                            "In-memory zones need an id and a domain",
                        ));
                    }
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::InMemory { .. } => "inmemory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// A zone hosted by the in-memory provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryZoneConfig {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub forwarded_domains: Vec<String>,
}

/// Rate limiter settings, one limiter per provider account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Sustained requests per second
    #[serde(default = "default_qps")]
    pub qps: f64,

    /// Requests admitted without waiting
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl RateLimitConfig {
    /// A configuration admitting every request immediately
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.enabled {
            return Ok(());
        }
        if !(self.qps > 0.0) {
            return Err(crate::Error::config("Rate limit qps must be > 0"));
        }
        if self.burst == 0 {
            return Err(crate::Error::config("Rate limit burst must be > 0"));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            qps: default_qps(),
            burst: default_burst(),
        }
    }
}

/// Zone-state cache settings
///
/// A TTL of zero disables caching for that kind of entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_zones_ttl_secs")]
    pub zones_ttl_secs: u64,

    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            zones_ttl_secs: 0,
            state_ttl_secs: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            zones_ttl_secs: default_zones_ttl_secs(),
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

/// Selection input of a provider account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Provider type tag zones must carry to be considered
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Zone id filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<SelectionFilter>,

    /// Domain filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<SelectionFilter>,
}

impl ProviderSpec {
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            zones: None,
            domains: None,
        }
    }

    pub fn with_zones(mut self, filter: SelectionFilter) -> Self {
        self.zones = Some(filter);
        self
    }

    pub fn with_domains(mut self, filter: SelectionFilter) -> Self {
        self.domains = Some(filter);
        self
    }
}

/// Include and exclude lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SelectionFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_qps() -> f64 {
    10.0
}

fn default_burst() -> u32 {
    20
}

fn default_zones_ttl_secs() -> u64 {
    300
}

fn default_state_ttl_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_config_defaults() {
        let config: HandlerConfig = serde_json::from_str(
            r#"{"provider":{"type":"cloudflare","api_token":"t"}}"#,
        )
        .unwrap();
        assert!(!config.dry_run);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.burst, 20);
        assert_eq!(config.cache.zones_ttl_secs, 300);
        assert_eq!(config.provider.type_name(), "cloudflare");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_validation() {
        let empty_token = ProviderConfig::Cloudflare {
            api_token: String::new(),
            base_url: None,
        };
        assert!(empty_token.validate().is_err());

        let inmemory: ProviderConfig = serde_json::from_str(
            r#"{"type":"inmemory","zones":[{"id":"z1","domain":"a.b"}]}"#,
        )
        .unwrap();
        assert_eq!(inmemory.type_name(), "inmemory");
        assert!(inmemory.validate().is_ok());

        let custom = ProviderConfig::Custom {
            factory: "acme".to_string(),
            config: serde_json::Value::Null,
        };
        assert!(custom.validate().is_err());
    }

    #[test]
    fn test_rate_limit_validation() {
        let mut config = RateLimitConfig::default();
        assert!(config.validate().is_ok());
        config.qps = 0.0;
        assert!(config.validate().is_err());
        config.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_spec_shape() {
        let spec: ProviderSpec = serde_json::from_str(
            r#"{"type":"aws-route53","domains":{"include":["a.b"]}}"#,
        )
        .unwrap();
        assert_eq!(spec.provider_type, "aws-route53");
        assert!(spec.zones.is_none());
        assert_eq!(spec.domains.unwrap().include, vec!["a.b".to_string()]);
    }
}
