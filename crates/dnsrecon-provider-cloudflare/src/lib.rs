// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare binding of the reconciliation core.
//
// ## Implementation Status
//
// - ✅ Zone catalogue and per-zone record listing with pagination
// - ✅ Create, update and delete of single record values
// - ✅ A, AAAA, CNAME and TXT records (TXT also carries comment records)
// - ✅ TTL below 120 seconds is sent as automatic (1)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode via `DNSRECON_MODE=dry-run`
// - ❌ NO routing policies (rejected as invalid requests)
// - ❌ NO retry logic (the controller resubmits failed requests)
//
// Rate limiting, request metrics and the zone-state cache come from the
// `StandardHandler` the factory assembles around `CloudflareAccess`.

pub mod access;
pub mod builder;

pub use access::{CloudflareAccess, CLOUDFLARE_API_BASE};
pub use builder::CloudflareRecordSetBuilder;

use dnsrecon_core::config::{HandlerConfig, ProviderConfig};
use dnsrecon_core::metrics::Metrics;
use dnsrecon_core::traits::{DnsHandler, DnsHandlerFactory};
use dnsrecon_core::{Error, ProviderRegistry, Result, StandardHandler};
use std::sync::Arc;

/// Provider type name of the Cloudflare binding
pub const TYPE_CODE: &str = "cloudflare";

/// Factory for creating Cloudflare handlers
pub struct CloudflareHandlerFactory;

impl DnsHandlerFactory for CloudflareHandlerFactory {
    fn create(&self, config: &HandlerConfig, metrics: Arc<dyn Metrics>) -> Result<Box<dyn DnsHandler>> {
        match &config.provider {
            ProviderConfig::Cloudflare { api_token, base_url } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                let access = CloudflareAccess::new(api_token.clone(), base_url.clone())?;
                if config.effective_dry_run() {
                    tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
                }

                let handler = StandardHandler::new(TYPE_CODE, Arc::new(access), config, metrics)
                    .with_builder(CloudflareRecordSetBuilder::new());
                Ok(Box::new(handler))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use dnsrecon_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dnsrecon_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_handler(TYPE_CODE, Box::new(CloudflareHandlerFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnsrecon_core::metrics::NoopMetrics;

    fn config(api_token: &str) -> HandlerConfig {
        HandlerConfig::new(ProviderConfig::Cloudflare {
            api_token: api_token.to_string(),
            base_url: None,
        })
    }

    #[test]
    fn test_factory_creation() {
        let handler = CloudflareHandlerFactory
            .create(&config("test_token"), Arc::new(NoopMetrics))
            .unwrap();
        assert_eq!(handler.provider_type(), "cloudflare");
    }

    #[test]
    fn test_factory_missing_token() {
        let result = CloudflareHandlerFactory.create(&config(""), Arc::new(NoopMetrics));
        assert!(result.is_err());
    }

    #[test]
    fn test_factory_rejects_other_configs() {
        let other = HandlerConfig::new(ProviderConfig::InMemory { zones: Vec::new() });
        assert!(CloudflareHandlerFactory.create(&other, Arc::new(NoopMetrics)).is_err());
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::with_builtin();
        register(&registry);
        assert_eq!(registry.list_providers(), vec!["cloudflare".to_string(), "inmemory".to_string()]);
    }
}
