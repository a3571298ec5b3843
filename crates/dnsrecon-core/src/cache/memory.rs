// # Memory Zone Cache
//
// In-memory implementation of ZoneStateCache.
//
// ## Expiry
//
// - The zone catalogue is kept for `zones_ttl`; a failed fetch is remembered
//   for half of it, so a broken account is not hammered on every cycle
// - Zone states are kept for `state_ttl`
// - A TTL of zero disables caching for that entry kind
//
// ## Batch Notifications
//
// - A successful batch is merged into the cached state of its zone
// - A failed batch drops the cached state, the next read refetches it

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::change::{ChangeAction, ChangeRequest};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::mapping::{map_from_provider, map_to_provider};
use crate::metrics::{Metrics, REQUESTS_CACHED_GET_ZONES, REQUESTS_CACHED_GET_ZONE_STATE};
use crate::traits::{ZoneSource, ZoneStateCache};
use crate::zone::{HostedZone, ZoneId, ZoneState};

#[derive(Debug)]
struct CachedZones {
    expires: Instant,
    zones: std::result::Result<Vec<HostedZone>, String>,
}

#[derive(Debug)]
struct CachedState {
    expires: Instant,
    state: ZoneState,
}

/// Zone cache backed by a [`ZoneSource`]
pub struct MemoryZoneCache {
    source: Arc<dyn ZoneSource>,
    metrics: Arc<dyn Metrics>,
    zones_ttl: Duration,
    state_ttl: Duration,
    zones: RwLock<Option<CachedZones>>,
    states: RwLock<HashMap<ZoneId, CachedState>>,
}

impl MemoryZoneCache {
    pub fn new(source: Arc<dyn ZoneSource>, config: &CacheConfig, metrics: Arc<dyn Metrics>) -> Self {
        Self {
            source,
            metrics,
            zones_ttl: Duration::from_secs(config.zones_ttl_secs),
            state_ttl: Duration::from_secs(config.state_ttl_secs),
            zones: RwLock::new(None),
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached zone states
    pub async fn cached_states(&self) -> usize {
        self.states.read().await.len()
    }

    /// Drop everything cached
    pub async fn clear(&self) {
        *self.zones.write().await = None;
        self.states.write().await.clear();
    }

    fn merge_requests(state: &mut ZoneState, zone: &HostedZone, reqs: &[ChangeRequest]) {
        for req in reqs {
            let Some(set) = req.dns_set() else {
                continue;
            };
            let mut set = set.clone();
            let (name, rs) = map_to_provider(req.rtype, &mut set, &zone.domain);
            let Some(rs) = rs else {
                state.dns_sets.remove_record_set(&set.name.normalize(), req.rtype);
                continue;
            };
            // Store what a fresh read from the provider would return.
            let (name, rs) = map_from_provider(name.normalize(), rs);
            state.dns_sets.remove_record_set(&name, rs.rtype);
            if req.action != ChangeAction::Delete && !rs.is_empty() {
                state.dns_sets.add_record_set(name, rs);
            }
        }
    }
}

#[async_trait]
impl ZoneStateCache for MemoryZoneCache {
    async fn get_zones(&self) -> Result<Vec<HostedZone>> {
        if let Some(cached) = self.zones.read().await.as_ref() {
            if Instant::now() < cached.expires {
                self.metrics.add_requests(REQUESTS_CACHED_GET_ZONES, 1);
                return cached.zones.clone().map_err(Error::Other);
            }
        }

        let fetched = self.source.fetch_zones().await;
        if self.zones_ttl.is_zero() {
            return fetched;
        }
        let (ttl, cached) = match &fetched {
            Ok(zones) => (self.zones_ttl, Ok(zones.clone())),
            Err(err) => (self.zones_ttl / 2, Err(err.to_string())),
        };
        *self.zones.write().await = Some(CachedZones {
            expires: Instant::now() + ttl,
            zones: cached,
        });
        fetched
    }

    async fn get_zone_state(&self, zone: &HostedZone) -> Result<ZoneState> {
        if let Some(cached) = self.states.read().await.get(&zone.id) {
            if Instant::now() < cached.expires {
                self.metrics
                    .add_zone_requests(&zone.id, REQUESTS_CACHED_GET_ZONE_STATE, 1);
                return Ok(cached.state.clone());
            }
        }

        let state = self.source.fetch_zone_state(zone).await?;
        if !self.state_ttl.is_zero() {
            self.states.write().await.insert(
                zone.id.clone(),
                CachedState {
                    expires: Instant::now() + self.state_ttl,
                    state: state.clone(),
                },
            );
        }
        Ok(state)
    }

    async fn apply_requests(&self, err: Option<&Error>, zone: &HostedZone, reqs: &[ChangeRequest]) {
        let mut states = self.states.write().await;
        match err {
            Some(err) => {
                if states.remove(&zone.id).is_some() {
                    debug!("Dropped cached state of zone {} after failed batch: {}", zone.id, err);
                }
            }
            None => {
                if let Some(cached) = states.get_mut(&zone.id) {
                    Self::merge_requests(&mut cached.state, zone, reqs);
                }
            }
        }
    }

    async fn report_zone_state_conflict(&self, zone: &HostedZone, err: &Error) -> bool {
        let dropped = self.states.write().await.remove(&zone.id).is_some();
        if dropped {
            debug!("Zone state conflict for zone {}: {}", zone.id, err);
        }
        dropped
    }
}
