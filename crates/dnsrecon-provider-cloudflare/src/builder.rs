//! Cloudflare record-set builder
//!
//! Cloudflare stores CNAME targets without the trailing dot, replaces TTLs
//! below its minimum by the automatic TTL and accepts only A, AAAA, CNAME
//! and TXT through this binding. The built record set carries these wire
//! values so updates diff against what a read returns.

use dnsrecon_core::execution::{BuildOutcome, DefaultRecordSetBuilder, RecordSetBuilder};
use dnsrecon_core::model::{normalize_hostname, DnsSetName, RecordSet, RecordType};
use dnsrecon_core::HostedZone;

use crate::access::api_ttl;

#[derive(Debug, Clone, Default)]
pub struct CloudflareRecordSetBuilder {
    inner: DefaultRecordSetBuilder,
}

impl CloudflareRecordSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSetBuilder for CloudflareRecordSetBuilder {
    fn build(&self, zone: &HostedZone, name: &DnsSetName, rs: &RecordSet) -> BuildOutcome {
        match self.inner.build(zone, name, rs) {
            BuildOutcome::Ok(mut prs) => {
                prs.ttl = api_ttl(prs.ttl);
                if prs.rtype == RecordType::Cname {
                    prs.values = prs.values.iter().map(|v| normalize_hostname(v)).collect();
                }
                BuildOutcome::Ok(prs)
            }
            outcome => outcome,
        }
    }
}
