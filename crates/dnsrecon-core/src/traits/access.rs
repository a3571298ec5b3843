// # Provider Access Trait
//
// The narrow capability every provider binding exposes: list zones, list
// records, and create/update/delete single record values.
//
// ## Implementations
//
// - In-memory: `dnsrecon_core::inmemory::InMemoryProvider`
// - Cloudflare: `dnsrecon-provider-cloudflare` crate
//
// Bindings are single-shot: no retries, no caching, no rate limiting. Those
// concerns are layered on top by the handler.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{normalize_domain_name, DnsSets, Record, RecordSet, RecordType};
use crate::zone::HostedZone;

/// A single record value as stored by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Provider-assigned id, `None` before creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: RecordType,
    pub value: String,
    pub ttl: i64,
}

impl ProviderRecord {
    pub fn new(name: impl Into<String>, rtype: RecordType, value: impl Into<String>, ttl: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            rtype,
            value: value.into(),
            ttl,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Restricts [`ProviderAccess::list_records`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub rtype: Option<RecordType>,
    pub name: Option<String>,
}

impl RecordFilter {
    /// No restriction
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_type_and_name(rtype: RecordType, name: impl Into<String>) -> Self {
        Self {
            rtype: Some(rtype),
            name: Some(name.into()),
        }
    }

    /// Whether `record` passes the filter, names compared in normalized form
    pub fn matches(&self, record: &ProviderRecord) -> bool {
        if self.rtype.is_some_and(|t| t != record.rtype) {
            return false;
        }
        match &self.name {
            Some(name) => normalize_domain_name(name) == normalize_domain_name(&record.name),
            None => true,
        }
    }
}

/// Capability interface of a provider account
#[async_trait]
pub trait ProviderAccess: Send + Sync {
    /// List all zones hosted by the account
    async fn list_zones(&self) -> Result<Vec<HostedZone>>;

    /// List the record values of a zone
    async fn list_records(&self, zone: &HostedZone, filter: &RecordFilter) -> Result<Vec<ProviderRecord>>;

    /// Create a single record value
    async fn create_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()>;

    /// Update a record value identified by `record.id`
    async fn update_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()>;

    /// Delete a record value identified by `record.id`
    async fn delete_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()>;
}

/// Group provider records into the logical DNS sets of a zone
///
/// Values of the same name and type form one record set, the TTL of the
/// first value wins. Comment records are decoded into `META` sets.
pub fn dns_sets_from_records(records: &[ProviderRecord]) -> DnsSets {
    let mut grouped: BTreeMap<(String, RecordType), RecordSet> = BTreeMap::new();
    for record in records {
        let key = (normalize_domain_name(&record.name), record.rtype);
        grouped
            .entry(key)
            .or_insert_with(|| RecordSet::new(record.rtype, record.ttl, Vec::new()))
            .add([Record::new(record.value.clone())]);
    }

    let mut sets = DnsSets::new();
    for ((name, _), rs) in grouped {
        sets.add_record_set_from_provider(name, rs);
    }
    sets
}
