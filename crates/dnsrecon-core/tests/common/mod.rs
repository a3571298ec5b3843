//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record what the
//! reconciliation core asks of its collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use dnsrecon_core::change::ChangeRequest;
use dnsrecon_core::error::{Error, Result};
use dnsrecon_core::inmemory::InMemoryProvider;
use dnsrecon_core::model::{DnsSet, RecordType};
use dnsrecon_core::traits::{DoneHandler, ProviderAccess, ProviderRecord, RecordFilter, ZoneStateCache};
use dnsrecon_core::zone::{HostedZone, ZoneState};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_DOMAIN: &str = "example.test";

/// The zone used by most tests
pub fn test_zone() -> HostedZone {
    HostedZone::new("inmemory", "z1", ZONE_DOMAIN)
}

/// A DNS set with one record set
pub fn dns_set(name: &str, rtype: RecordType, ttl: i64, values: &[&str]) -> DnsSet {
    let mut set = DnsSet::new(name);
    set.set_records(rtype, ttl, values.iter().copied());
    set
}

/// A provider binding over an in-memory store that fails every mutation of
/// chosen names and logs all calls
pub struct FlakyAccess {
    inner: InMemoryProvider,
    failing: Mutex<HashSet<String>>,
    calls: Arc<Mutex<Vec<String>>>,
    mutation_count: Arc<AtomicUsize>,
}

impl FlakyAccess {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        let inner = InMemoryProvider::new();
        for zone in zones {
            inner.add_zone(zone);
        }
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
            mutation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Let every mutation of `name` fail
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Calls in order, e.g. `create A www.example.test 1.1.1.1`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of create, update and delete calls
    pub fn mutation_count(&self) -> usize {
        self.mutation_count.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &InMemoryProvider {
        &self.inner
    }

    fn record_call(&self, action: &str, record: &ProviderRecord) -> Result<()> {
        self.mutation_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(format!(
            "{} {} {} {}",
            action, record.rtype, record.name, record.value
        ));
        if self.failing.lock().unwrap().contains(&record.name) {
            return Err(Error::http(format!("injected failure for {}", record.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderAccess for FlakyAccess {
    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        self.calls.lock().unwrap().push("list_zones".to_string());
        self.inner.list_zones().await
    }

    async fn list_records(&self, zone: &HostedZone, filter: &RecordFilter) -> Result<Vec<ProviderRecord>> {
        self.calls.lock().unwrap().push("list_records".to_string());
        self.inner.list_records(zone, filter).await
    }

    async fn create_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.record_call("create", record)?;
        self.inner.create_record(zone, record).await
    }

    async fn update_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.record_call("update", record)?;
        self.inner.update_record(zone, record).await
    }

    async fn delete_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.record_call("delete", record)?;
        self.inner.delete_record(zone, record).await
    }
}

/// Outcome reported through a `DoneHandler`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Invalid(String),
    Failed(String),
    Succeeded,
}

/// Records every outcome of the requests it is attached to
#[derive(Default)]
pub struct RecordingDone {
    outcomes: Mutex<Vec<Outcome>>,
}

impl RecordingDone {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl DoneHandler for RecordingDone {
    fn set_invalid(&self, err: &Error) {
        self.outcomes.lock().unwrap().push(Outcome::Invalid(err.to_string()));
    }

    fn failed(&self, err: &Error) {
        self.outcomes.lock().unwrap().push(Outcome::Failed(err.to_string()));
    }

    fn succeeded(&self) {
        self.outcomes.lock().unwrap().push(Outcome::Succeeded);
    }
}

/// A batch notification received by [`RecordingCache`]
#[derive(Debug, Clone)]
pub struct AppliedBatch {
    pub error: Option<String>,
    pub zone: String,
    pub requests: usize,
}

/// Uncached zone-state cache that records batch notifications
pub struct RecordingCache {
    access: Arc<dyn ProviderAccess>,
    applied: Mutex<Vec<AppliedBatch>>,
}

impl RecordingCache {
    pub fn new(access: Arc<dyn ProviderAccess>) -> Self {
        Self {
            access,
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn applied(&self) -> Vec<AppliedBatch> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZoneStateCache for RecordingCache {
    async fn get_zones(&self) -> Result<Vec<HostedZone>> {
        self.access.list_zones().await
    }

    async fn get_zone_state(&self, zone: &HostedZone) -> Result<ZoneState> {
        let records = self.access.list_records(zone, &RecordFilter::all()).await?;
        Ok(ZoneState::new(dnsrecon_core::traits::dns_sets_from_records(&records)))
    }

    async fn apply_requests(&self, err: Option<&Error>, zone: &HostedZone, reqs: &[ChangeRequest]) {
        self.applied.lock().unwrap().push(AppliedBatch {
            error: err.map(|e| e.to_string()),
            zone: zone.id.to_string(),
            requests: reqs.len(),
        });
    }

    async fn report_zone_state_conflict(&self, _zone: &HostedZone, _err: &Error) -> bool {
        false
    }
}
