//! Rate-limited, counted provider access

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::metrics::{
    Metrics, REQUESTS_CREATE_RECORDS, REQUESTS_DELETE_RECORDS, REQUESTS_LIST_RECORDS,
    REQUESTS_LIST_ZONES, REQUESTS_UPDATE_RECORDS,
};
use crate::ratelimit::RateLimiter;
use crate::traits::{ProviderAccess, ProviderRecord, RecordFilter};
use crate::zone::HostedZone;

/// Wraps a provider binding so every call passes the rate limiter and is
/// counted before it is issued
pub struct MeteredAccess {
    inner: Arc<dyn ProviderAccess>,
    limiter: Arc<dyn RateLimiter>,
    metrics: Arc<dyn Metrics>,
}

impl MeteredAccess {
    pub fn new(
        inner: Arc<dyn ProviderAccess>,
        limiter: Arc<dyn RateLimiter>,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        Self {
            inner,
            limiter,
            metrics,
        }
    }

    async fn admit(&self, zone: Option<&HostedZone>, counter: &str) {
        self.limiter.accept().await;
        match zone {
            Some(zone) => self.metrics.add_zone_requests(&zone.id, counter, 1),
            None => self.metrics.add_requests(counter, 1),
        }
    }
}

#[async_trait]
impl ProviderAccess for MeteredAccess {
    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        self.admit(None, REQUESTS_LIST_ZONES).await;
        self.inner.list_zones().await
    }

    async fn list_records(&self, zone: &HostedZone, filter: &RecordFilter) -> Result<Vec<ProviderRecord>> {
        self.admit(Some(zone), REQUESTS_LIST_RECORDS).await;
        self.inner.list_records(zone, filter).await
    }

    async fn create_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.admit(Some(zone), REQUESTS_CREATE_RECORDS).await;
        self.inner.create_record(zone, record).await
    }

    async fn update_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.admit(Some(zone), REQUESTS_UPDATE_RECORDS).await;
        self.inner.update_record(zone, record).await
    }

    async fn delete_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        self.admit(Some(zone), REQUESTS_DELETE_RECORDS).await;
        self.inner.delete_record(zone, record).await
    }
}
