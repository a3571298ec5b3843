//! Zone-state caching
//!
//! - [`MemoryZoneCache`]: TTL-based in-memory cache
//! - [`AccessZoneSource`]: fetches zones and states through a provider binding

pub mod memory;

pub use memory::MemoryZoneCache;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::traits::{dns_sets_from_records, ProviderAccess, RecordFilter, ZoneSource};
use crate::zone::{HostedZone, ZoneState};

/// Reads zones and zone states directly from a provider binding
pub struct AccessZoneSource {
    access: Arc<dyn ProviderAccess>,
}

impl AccessZoneSource {
    pub fn new(access: Arc<dyn ProviderAccess>) -> Self {
        Self { access }
    }
}

#[async_trait]
impl ZoneSource for AccessZoneSource {
    async fn fetch_zones(&self) -> Result<Vec<HostedZone>> {
        self.access.list_zones().await
    }

    async fn fetch_zone_state(&self, zone: &HostedZone) -> Result<ZoneState> {
        let records = self.access.list_records(zone, &RecordFilter::all()).await?;
        Ok(ZoneState::new(dns_sets_from_records(&records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeRequest;
    use crate::config::CacheConfig;
    use crate::error::Error;
    use crate::metrics::{CountingMetrics, REQUESTS_CACHED_GET_ZONES, REQUESTS_CACHED_GET_ZONE_STATE};
    use crate::model::{DnsSet, DnsSetName, RecordSet, RecordType};
    use crate::traits::ZoneStateCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts fetches and serves a mutable state
    struct CountingSource {
        zone_fetches: AtomicUsize,
        state_fetches: AtomicUsize,
        fail_zones: bool,
        state: Mutex<ZoneState>,
    }

    impl CountingSource {
        fn new(fail_zones: bool) -> Self {
            let mut state = ZoneState::default();
            state
                .dns_sets
                .add_record_set("www.a.b", RecordSet::from_values(RecordType::A, 300, ["1.1.1.1"]));
            Self {
                zone_fetches: AtomicUsize::new(0),
                state_fetches: AtomicUsize::new(0),
                fail_zones,
                state: Mutex::new(state),
            }
        }
    }

    #[async_trait]
    impl ZoneSource for CountingSource {
        async fn fetch_zones(&self) -> Result<Vec<HostedZone>> {
            self.zone_fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_zones {
                return Err(Error::http("connection refused"));
            }
            Ok(vec![zone()])
        }

        async fn fetch_zone_state(&self, _zone: &HostedZone) -> Result<ZoneState> {
            self.state_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.state.lock().unwrap().clone())
        }
    }

    fn zone() -> HostedZone {
        HostedZone::new("inmemory", "z1", "a.b")
    }

    fn new_cache(source: Arc<CountingSource>, config: CacheConfig) -> (MemoryZoneCache, Arc<CountingMetrics>) {
        let metrics = Arc::new(CountingMetrics::new());
        (MemoryZoneCache::new(source, &config, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn test_zones_are_cached() {
        let source = Arc::new(CountingSource::new(false));
        let (cache, metrics) = new_cache(source.clone(), CacheConfig::default());

        assert_eq!(cache.get_zones().await.unwrap().len(), 1);
        assert_eq!(cache.get_zones().await.unwrap().len(), 1);
        assert_eq!(source.zone_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.get(REQUESTS_CACHED_GET_ZONES), 1);
    }

    #[tokio::test]
    async fn test_zone_errors_are_cached() {
        let source = Arc::new(CountingSource::new(true));
        let (cache, _) = new_cache(source.clone(), CacheConfig::default());

        assert!(cache.get_zones().await.is_err());
        let err = cache.get_zones().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(source.zone_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let source = Arc::new(CountingSource::new(false));
        let (cache, _) = new_cache(source.clone(), CacheConfig::disabled());

        cache.get_zones().await.unwrap();
        cache.get_zones().await.unwrap();
        cache.get_zone_state(&zone()).await.unwrap();
        cache.get_zone_state(&zone()).await.unwrap();
        assert_eq!(source.zone_fetches.load(Ordering::SeqCst), 2);
        assert_eq!(source.state_fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_states().await, 0);
    }

    #[tokio::test]
    async fn test_successful_batch_is_merged() {
        let source = Arc::new(CountingSource::new(false));
        let (cache, metrics) = new_cache(source.clone(), CacheConfig::default());
        let zone = zone();
        cache.get_zone_state(&zone).await.unwrap();

        let mut set = DnsSet::new("new.a.b");
        set.set_records(RecordType::Cname, 300, ["target.a.b."]);
        set.set_owner("me");
        let mut old = DnsSet::new("www.a.b");
        old.set_records(RecordType::A, 300, ["1.1.1.1"]);
        let reqs = vec![
            ChangeRequest::create(RecordType::Cname, set.clone()),
            ChangeRequest::create(RecordType::Meta, set),
            ChangeRequest::delete(RecordType::A, old),
        ];
        cache.apply_requests(None, &zone, &reqs).await;

        let state = cache.get_zone_state(&zone).await.unwrap();
        assert_eq!(source.state_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.get(REQUESTS_CACHED_GET_ZONE_STATE), 1);
        assert!(!state.dns_sets.contains(&DnsSetName::new("www.a.b")));

        let created = state.dns_sets.get(&DnsSetName::new("new.a.b")).unwrap();
        let cname = created.record_set(RecordType::Cname).unwrap();
        assert_eq!(cname.values().collect::<Vec<_>>(), vec!["target.a.b"]);
        assert_eq!(created.owner(), "me");
        assert_eq!(created.get_attr("prefix"), "comment-");
    }

    #[tokio::test]
    async fn test_failed_batch_drops_state() {
        let source = Arc::new(CountingSource::new(false));
        let (cache, _) = new_cache(source.clone(), CacheConfig::default());
        let zone = zone();
        cache.get_zone_state(&zone).await.unwrap();

        cache
            .apply_requests(Some(&Error::ChangesFailed(1)), &zone, &[])
            .await;
        assert_eq!(cache.cached_states().await, 0);
        cache.get_zone_state(&zone).await.unwrap();
        assert_eq!(source.state_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_conflict_report() {
        let source = Arc::new(CountingSource::new(false));
        let (cache, _) = new_cache(source.clone(), CacheConfig::default());
        let zone = zone();
        let err = Error::Other("record changed concurrently".to_string());

        assert!(!cache.report_zone_state_conflict(&zone, &err).await);
        cache.get_zone_state(&zone).await.unwrap();
        assert!(cache.report_zone_state_conflict(&zone, &err).await);
        assert_eq!(cache.cached_states().await, 0);
    }
}
