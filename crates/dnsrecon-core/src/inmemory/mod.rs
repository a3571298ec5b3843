//! In-memory provider
//!
//! Hosts zones and record values in process memory. Used by tests, by
//! simulations and as the reference implementation of [`ProviderAccess`].

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::config::{HandlerConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::handler::StandardHandler;
use crate::metrics::Metrics;
use crate::model::{normalize_domain_name, DnsSets};
use crate::traits::{
    dns_sets_from_records, DnsHandler, DnsHandlerFactory, ProviderAccess, ProviderRecord,
    RecordFilter,
};
use crate::zone::{HostedZone, ZoneId, ZoneState};

/// Provider type name of the in-memory provider
pub const TYPE_CODE: &str = "inmemory";

#[derive(Debug, Clone)]
struct HostedRecords {
    zone: HostedZone,
    records: BTreeMap<String, ProviderRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    zones: BTreeMap<ZoneId, HostedRecords>,
    next_id: u64,
}

/// Serializable snapshot of all zones
#[derive(Debug, Clone, Serialize)]
pub struct FullDump {
    pub zones: Vec<ZoneDump>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneDump {
    pub zone: HostedZone,
    pub dns_sets: DnsSets,
}

/// Provider binding keeping everything in memory
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    inner: RwLock<Inner>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host a zone, keeping its records if it already exists
    pub fn add_zone(&self, zone: HostedZone) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .zones
            .entry(zone.id.clone())
            .and_modify(|hosted| hosted.zone = zone.clone())
            .or_insert_with(|| HostedRecords {
                zone,
                records: BTreeMap::new(),
            });
    }

    /// Stop hosting a zone and drop its records
    pub fn delete_zone(&self, id: &ZoneId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.zones.remove(id).is_some()
    }

    /// Current DNS sets of a zone
    pub fn clone_zone_state(&self, zone: &HostedZone) -> Result<ZoneState> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let hosted = inner
            .zones
            .get(&zone.id)
            .ok_or_else(|| Error::ZoneNotHosted(zone.id.to_string()))?;
        let records: Vec<ProviderRecord> = hosted.records.values().cloned().collect();
        Ok(ZoneState::new(dns_sets_from_records(&records)))
    }

    /// Snapshot of all zones and their DNS sets
    pub fn build_full_dump(&self) -> FullDump {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let zones = inner
            .zones
            .values()
            .map(|hosted| {
                let records: Vec<ProviderRecord> = hosted.records.values().cloned().collect();
                ZoneDump {
                    zone: hosted.zone.clone(),
                    dns_sets: dns_sets_from_records(&records),
                }
            })
            .collect();
        FullDump { zones }
    }

    /// Number of stored record values in a zone
    pub fn record_count(&self, id: &ZoneId) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.zones.get(id).map_or(0, |hosted| hosted.records.len())
    }

    fn with_zone<T>(&self, zone: &HostedZone, f: impl FnOnce(&mut HostedRecords, &mut u64) -> Result<T>) -> Result<T> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let Inner { zones, next_id } = &mut *inner;
        let hosted = zones
            .get_mut(&zone.id)
            .ok_or_else(|| Error::ZoneNotHosted(zone.id.to_string()))?;
        f(hosted, next_id)
    }
}

fn record_id(record: &ProviderRecord) -> Result<&str> {
    record
        .id
        .as_deref()
        .ok_or_else(|| Error::invalid_input(format!("record {} {} has no id", record.rtype, record.name)))
}

#[async_trait]
impl ProviderAccess for InMemoryProvider {
    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner.zones.values().map(|hosted| hosted.zone.clone()).collect())
    }

    async fn list_records(&self, zone: &HostedZone, filter: &RecordFilter) -> Result<Vec<ProviderRecord>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let hosted = inner
            .zones
            .get(&zone.id)
            .ok_or_else(|| Error::ZoneNotHosted(zone.id.to_string()))?;
        Ok(hosted
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.with_zone(zone, |hosted, next_id| {
            let name = normalize_domain_name(&record.name);
            let exists = hosted.records.values().any(|r| {
                r.rtype == record.rtype && r.value == record.value && normalize_domain_name(&r.name) == name
            });
            if exists {
                return Err(Error::provider(
                    TYPE_CODE,
                    format!("record {} {} {} already exists", record.rtype, name, record.value),
                ));
            }
            *next_id += 1;
            let id = format!("rec-{}", next_id);
            debug!("Created {} {} {} as {}", record.rtype, name, record.value, id);
            hosted.records.insert(id.clone(), record.clone().with_id(id));
            Ok(())
        })
    }

    async fn update_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        let id = record_id(record)?;
        self.with_zone(zone, |hosted, _| {
            let stored = hosted
                .records
                .get_mut(id)
                .ok_or_else(|| Error::not_found(format!("record {}", id)))?;
            *stored = record.clone();
            Ok(())
        })
    }

    async fn delete_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        let id = record_id(record)?;
        self.with_zone(zone, |hosted, _| {
            hosted
                .records
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| Error::not_found(format!("record {}", id)))
        })
    }
}

/// Handler factory registered under [`TYPE_CODE`]
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryHandlerFactory;

impl DnsHandlerFactory for InMemoryHandlerFactory {
    fn create(&self, config: &HandlerConfig, metrics: Arc<dyn Metrics>) -> Result<Box<dyn DnsHandler>> {
        let ProviderConfig::InMemory { zones } = &config.provider else {
            return Err(Error::config("Invalid config type for in-memory provider"));
        };

        let provider = InMemoryProvider::new();
        for zone in zones {
            provider.add_zone(
                HostedZone::new(TYPE_CODE, zone.id.clone(), normalize_domain_name(&zone.domain))
                    .with_forwarded_domains(zone.forwarded_domains.iter().map(|d| normalize_domain_name(d))),
            );
        }
        info!("In-memory provider created with {} zones", zones.len());

        Ok(Box::new(StandardHandler::new(
            TYPE_CODE,
            Arc::new(provider),
            config,
            metrics,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DnsSetName, RecordType};

    fn zone() -> HostedZone {
        HostedZone::new(TYPE_CODE, "z1", "a.b")
    }

    #[tokio::test]
    async fn test_record_lifecycle() {
        let provider = InMemoryProvider::new();
        provider.add_zone(zone());

        provider
            .create_record(&zone(), &ProviderRecord::new("www.a.b", RecordType::A, "1.1.1.1", 300))
            .await
            .unwrap();
        let duplicate = provider
            .create_record(&zone(), &ProviderRecord::new("WWW.a.b.", RecordType::A, "1.1.1.1", 300))
            .await;
        assert!(duplicate.is_err());

        let filter = RecordFilter::by_type_and_name(RecordType::A, "www.a.b");
        let mut records = provider.list_records(&zone(), &filter).await.unwrap();
        assert_eq!(records.len(), 1);
        let mut record = records.remove(0);
        assert_eq!(record.id.as_deref(), Some("rec-1"));

        record.ttl = 600;
        provider.update_record(&zone(), &record).await.unwrap();
        let state = provider.clone_zone_state(&zone()).unwrap();
        let set = state.dns_sets.get(&DnsSetName::new("www.a.b")).unwrap();
        assert_eq!(set.record_set(RecordType::A).unwrap().ttl, 600);

        provider.delete_record(&zone(), &record).await.unwrap();
        assert_eq!(provider.record_count(&zone().id), 0);
        assert!(provider.delete_record(&zone(), &record).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_zone() {
        let provider = InMemoryProvider::new();
        let err = provider
            .list_records(&zone(), &RecordFilter::all())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "DNSZone inmemory:z1 not hosted");
        assert!(provider.clone_zone_state(&zone()).is_err());
    }

    #[tokio::test]
    async fn test_zones_and_dump() {
        let provider = InMemoryProvider::new();
        provider.add_zone(zone());
        provider.add_zone(HostedZone::new(TYPE_CODE, "z2", "o.p"));
        provider
            .create_record(&zone(), &ProviderRecord::new("a.b", RecordType::Txt, "\"hello\"", 300))
            .await
            .unwrap();

        assert_eq!(provider.list_zones().await.unwrap().len(), 2);
        let dump = serde_json::to_value(provider.build_full_dump()).unwrap();
        assert_eq!(dump["zones"].as_array().unwrap().len(), 2);
        assert_eq!(dump["zones"][0]["dns_sets"][0]["name"]["dns_name"], "a.b");

        assert!(provider.delete_zone(&ZoneId::new(TYPE_CODE, "z2")));
        assert!(!provider.delete_zone(&ZoneId::new(TYPE_CODE, "z2")));
        assert_eq!(provider.list_zones().await.unwrap().len(), 1);
    }

    #[test]
    fn test_factory_rejects_other_configs() {
        let config = HandlerConfig::new(ProviderConfig::Cloudflare {
            api_token: "t".to_string(),
            base_url: None,
        });
        let metrics: Arc<dyn Metrics> = Arc::new(crate::metrics::NoopMetrics);
        assert!(InMemoryHandlerFactory.create(&config, metrics).is_err());
    }
}
