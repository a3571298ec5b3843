// # DNS Handler Trait
//
// The per-account entry point used by the surrounding controller. A handler
// owns its provider binding, rate limiter, metrics sink and zone-state cache.
//
// ## Usage
//
// ```rust,ignore
// let handler = registry.create_handler(&config, metrics)?;
//
// let zones = handler.get_zones().await?;
// let selection = calc_zone_and_domain_selection(&spec, &zones);
// for zone in &selection.zones {
//     let state = handler.get_zone_state(zone).await?;
//     let requests = diff_desired_against(&state);
//     handler.execute_requests(zone, &requests).await?;
// }
// ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::change::ChangeRequest;
use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::zone::{HostedZone, ZoneState};

/// Reconciliation operations of a provider account
///
/// # Thread Safety
///
/// Different zones may be processed concurrently. At most one
/// `execute_requests` call may run per zone at a time: updates and deletes
/// look up provider ids before mutating, which is not atomic against
/// concurrent writers.
#[async_trait]
pub trait DnsHandler: Send + Sync {
    /// Provider type name (e.g., "cloudflare", "inmemory")
    fn provider_type(&self) -> &str;

    /// Zones hosted by the account
    async fn get_zones(&self) -> Result<Vec<HostedZone>>;

    /// Current DNS sets of a zone
    async fn get_zone_state(&self, zone: &HostedZone) -> Result<ZoneState>;

    /// Drop a cached zone state known to be stale
    async fn report_zone_state_conflict(&self, zone: &HostedZone, err: &Error) -> bool;

    /// Apply a batch of change requests to a zone
    ///
    /// Every request is attempted. Outcomes are reported per request through
    /// its `DoneHandler`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: no request failed
    /// - `Err(Error::ChangesFailed(n))`: `n` requests failed
    async fn execute_requests(&self, zone: &HostedZone, reqs: &[ChangeRequest]) -> Result<()>;

    /// Release resources held by the handler
    async fn release(&self) {}
}

/// Helper trait for constructing DNS handlers from configuration
pub trait DnsHandlerFactory: Send + Sync {
    /// Create a DnsHandler instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Handler configuration, including the provider settings
    /// - `metrics`: Metrics sink owned by the caller
    fn create(&self, config: &HandlerConfig, metrics: Arc<dyn Metrics>) -> Result<Box<dyn DnsHandler>>;
}
