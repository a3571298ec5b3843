// # Standard Handler
//
// Generic `DnsHandler` assembled from a provider binding:
//
// - provider calls pass a rate limiter and are counted (`MeteredAccess`)
// - zones and zone states are read through a `ZoneStateCache`
// - change batches run through `Execution` and are then reported to the cache
//
// Provider crates only supply a `ProviderAccess` and, where the provider
// deviates from the defaults, a `RecordSetBuilder` or `RoutingPolicyChecker`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{AccessZoneSource, MemoryZoneCache};
use crate::change::ChangeRequest;
use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::execution::{
    DefaultRecordSetBuilder, Execution, MeteredAccess, NoRoutingPolicies, RecordSetBuilder,
    RoutingPolicyChecker,
};
use crate::metrics::Metrics;
use crate::ratelimit::rate_limiter_from_config;
use crate::traits::{DnsHandler, ProviderAccess, ZoneStateCache};
use crate::zone::{HostedZone, ZoneState};

pub struct StandardHandler {
    provider_type: String,
    access: Arc<dyn ProviderAccess>,
    cache: Arc<dyn ZoneStateCache>,
    builder: Box<dyn RecordSetBuilder>,
    checker: Box<dyn RoutingPolicyChecker>,
    dry_run: bool,
}

impl StandardHandler {
    /// Assemble a handler around a raw provider binding
    ///
    /// # Parameters
    ///
    /// - `provider_type`: type name reported by [`DnsHandler::provider_type`]
    /// - `access`: the unmetered provider binding
    /// - `config`: rate limit, cache and dry-run settings
    /// - `metrics`: sink for request counters
    pub fn new(
        provider_type: impl Into<String>,
        access: Arc<dyn ProviderAccess>,
        config: &HandlerConfig,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        let limiter = rate_limiter_from_config(&config.rate_limit);
        let access: Arc<dyn ProviderAccess> =
            Arc::new(MeteredAccess::new(access, limiter, metrics.clone()));
        let source = Arc::new(AccessZoneSource::new(access.clone()));
        let cache = Arc::new(MemoryZoneCache::new(source, &config.cache, metrics));
        let dry_run = config.effective_dry_run();
        if dry_run {
            info!("Handler for {} runs in dry-run mode", config.provider.type_name());
        }

        Self {
            provider_type: provider_type.into(),
            access,
            cache,
            builder: Box::new(DefaultRecordSetBuilder::new()),
            checker: Box::new(NoRoutingPolicies),
            dry_run,
        }
    }

    /// Replace the record set builder
    pub fn with_builder(mut self, builder: impl RecordSetBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    /// Replace the routing policy checker
    pub fn with_routing_checker(mut self, checker: impl RoutingPolicyChecker + 'static) -> Self {
        self.checker = Box::new(checker);
        self
    }

    /// Replace the zone-state cache
    pub fn with_cache(mut self, cache: Arc<dyn ZoneStateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsHandler for StandardHandler {
    fn provider_type(&self) -> &str {
        &self.provider_type
    }

    async fn get_zones(&self) -> Result<Vec<HostedZone>> {
        self.cache.get_zones().await
    }

    async fn get_zone_state(&self, zone: &HostedZone) -> Result<ZoneState> {
        self.cache.get_zone_state(zone).await
    }

    async fn report_zone_state_conflict(&self, zone: &HostedZone, err: &Error) -> bool {
        self.cache.report_zone_state_conflict(zone, err).await
    }

    async fn execute_requests(&self, zone: &HostedZone, reqs: &[ChangeRequest]) -> Result<()> {
        debug!("Executing {} requests for zone {}", reqs.len(), zone.id);
        let result = Execution::new(
            self.access.as_ref(),
            self.builder.as_ref(),
            self.checker.as_ref(),
            zone,
        )
        .with_dry_run(self.dry_run)
        .execute(reqs)
        .await;

        self.cache
            .apply_requests(result.as_ref().err(), zone, reqs)
            .await;
        result
    }

    async fn release(&self) {
        debug!("Released {} handler", self.provider_type);
    }
}
