//! Request metrics
//!
//! Each handler gets its own [`Metrics`] sink injected by the caller, there
//! is no process-wide registry.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::zone::ZoneId;

pub const REQUESTS_LIST_ZONES: &str = "list_zones";
pub const REQUESTS_LIST_RECORDS: &str = "list_records";
pub const REQUESTS_CREATE_RECORDS: &str = "create_records";
pub const REQUESTS_UPDATE_RECORDS: &str = "update_records";
pub const REQUESTS_DELETE_RECORDS: &str = "delete_records";
pub const REQUESTS_CACHED_GET_ZONES: &str = "cached_getzones";
pub const REQUESTS_CACHED_GET_ZONE_STATE: &str = "cached_getzonestate";

/// Sink for provider request counters
pub trait Metrics: Send + Sync {
    /// Count account-level requests
    fn add_requests(&self, counter: &str, n: u64);

    /// Count requests against a single zone
    fn add_zone_requests(&self, zone: &ZoneId, counter: &str, n: u64);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn add_requests(&self, _counter: &str, _n: u64) {}

    fn add_zone_requests(&self, _zone: &ZoneId, _counter: &str, _n: u64) {}
}

/// Keeps counters in memory
///
/// Zone requests are counted both per zone and in the account totals.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    requests: Mutex<BTreeMap<String, u64>>,
    zone_requests: Mutex<BTreeMap<(String, String), u64>>,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account total of a counter
    pub fn get(&self, counter: &str) -> u64 {
        let requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        requests.get(counter).copied().unwrap_or(0)
    }

    /// Count of a counter for one zone
    pub fn get_zone(&self, zone: &ZoneId, counter: &str) -> u64 {
        let zone_requests = self.zone_requests.lock().unwrap_or_else(|e| e.into_inner());
        zone_requests
            .get(&(zone.to_string(), counter.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// All account totals
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Metrics for CountingMetrics {
    fn add_requests(&self, counter: &str, n: u64) {
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        *requests.entry(counter.to_string()).or_insert(0) += n;
    }

    fn add_zone_requests(&self, zone: &ZoneId, counter: &str, n: u64) {
        {
            let mut zone_requests = self.zone_requests.lock().unwrap_or_else(|e| e.into_inner());
            *zone_requests
                .entry((zone.to_string(), counter.to_string()))
                .or_insert(0) += n;
        }
        self.add_requests(counter, n);
    }
}
