// # Zone-State Cache Traits
//
// `ZoneStateCache` is the contract the handler consumes: cached zone
// catalogue, cached zone state, and notifications about applied batches.
// `ZoneSource` is what a cache fetches from on a miss.

use async_trait::async_trait;

use crate::change::ChangeRequest;
use crate::error::{Error, Result};
use crate::zone::{HostedZone, ZoneState};

/// Cached view of the zones and zone states of a provider account
#[async_trait]
pub trait ZoneStateCache: Send + Sync {
    /// Zone catalogue, cached or freshly fetched
    async fn get_zones(&self) -> Result<Vec<HostedZone>>;

    /// Current DNS sets of a zone, cached or freshly fetched
    async fn get_zone_state(&self, zone: &HostedZone) -> Result<ZoneState>;

    /// Notify the cache about a completed change batch
    ///
    /// # Parameters
    ///
    /// - `err`: the aggregate batch error, `None` on success
    /// - `zone`: the zone the batch was executed for
    /// - `reqs`: the original requests of the batch
    async fn apply_requests(&self, err: Option<&Error>, zone: &HostedZone, reqs: &[ChangeRequest]);

    /// Signal a mismatch between expected and actual provider state
    ///
    /// # Returns
    ///
    /// `true` if a cached state was dropped and the next read refetches it
    async fn report_zone_state_conflict(&self, zone: &HostedZone, err: &Error) -> bool;
}

/// Uncached origin of zones and zone states
#[async_trait]
pub trait ZoneSource: Send + Sync {
    async fn fetch_zones(&self) -> Result<Vec<HostedZone>>;

    async fn fetch_zone_state(&self, zone: &HostedZone) -> Result<ZoneState>;
}
