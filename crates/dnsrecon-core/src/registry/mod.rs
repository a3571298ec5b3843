//! Plugin-based provider registry
//!
//! The registry maps provider type names to handler factories, so the daemon
//! and embedding controllers can create handlers from configuration without
//! hardcoded if-else chains. It is an ordinary object passed to whoever
//! needs it; there is no global instance.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsrecon_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::with_builtin();
//! dnsrecon_provider_cloudflare::register(&registry);
//!
//! let handler = registry.create_handler(&config, metrics)?;
//! ```
//!
//! ## Registration
//!
//! Provider crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_handler("cloudflare", Box::new(CloudflareHandlerFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::inmemory::{InMemoryHandlerFactory, TYPE_CODE as INMEMORY_TYPE};
use crate::metrics::Metrics;
use crate::traits::{DnsHandler, DnsHandlerFactory};

/// Registry of DNS handler factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. A poisoned lock is recovered, the map itself
/// is never left half-updated.
#[derive(Default)]
pub struct ProviderRegistry {
    handlers: RwLock<HashMap<String, Box<dyn DnsHandlerFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the providers shipped in this crate
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_builtin();
        registry
    }

    /// Register the in-memory provider
    pub fn register_builtin(&self) {
        self.register_handler(INMEMORY_TYPE, Box::new(InMemoryHandlerFactory));
    }

    /// Register a DNS handler factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare", "inmemory")
    /// - `factory`: Factory object for creating handler instances
    ///
    /// A factory registered earlier under the same name is replaced.
    pub fn register_handler(&self, name: impl Into<String>, factory: Box<dyn DnsHandlerFactory>) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.insert(name.into(), factory);
    }

    /// Create a DNS handler from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsHandler>)`: Created handler instance
    /// - `Err(Error)`: If the configuration is invalid, the provider type is
    ///   not registered or creation fails
    pub fn create_handler(
        &self,
        config: &HandlerConfig,
        metrics: Arc<dyn Metrics>,
    ) -> Result<Box<dyn DnsHandler>> {
        config.validate()?;

        let provider_type = config.provider.type_name();
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let factory = handlers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config, metrics)
    }

    /// List all registered provider types, sorted by name
    pub fn list_providers(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        handlers.contains_key(name)
    }
}
