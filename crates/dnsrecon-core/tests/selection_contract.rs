//! Contract Test: Zone & Domain Selection
//!
//! This test verifies the selection computed from the zone catalogue a
//! handler reports.
//!
//! Constraints verified:
//! - Forwarded sub-domains are excluded unless another zone serves them
//! - Wildcards in domain filters are a fatal error
//! - An empty catalogue is a fatal error with empty selections
//! - Zones of other provider types never take part
//!
//! If this test fails, a provider account may claim domains it does not serve.

use dnsrecon_core::config::{HandlerConfig, InMemoryZoneConfig, ProviderConfig, ProviderSpec, SelectionFilter};
use dnsrecon_core::metrics::NoopMetrics;
use dnsrecon_core::selection::SubSelection;
use dnsrecon_core::traits::DnsHandler;
use dnsrecon_core::{calc_zone_and_domain_selection, HostedZone, ProviderRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;

fn zone(id: &str, domain: &str, forwarded: &[&str]) -> InMemoryZoneConfig {
    InMemoryZoneConfig {
        id: id.to_string(),
        domain: domain.to_string(),
        forwarded_domains: forwarded.iter().map(|d| d.to_string()).collect(),
    }
}

async fn catalogue(zones: Vec<InMemoryZoneConfig>) -> Vec<HostedZone> {
    let registry = ProviderRegistry::with_builtin();
    let handler = registry
        .create_handler(&HandlerConfig::new(ProviderConfig::InMemory { zones }), Arc::new(NoopMetrics))
        .unwrap();
    handler.get_zones().await.unwrap()
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn forwarded_domains_are_served_by_their_own_zone() {
    let zones = catalogue(vec![
        zone("zab", "a.b", &["c.a.b", "d.a.b"]),
        zone("zcab", "c.a.b", &[]),
    ])
    .await;

    let result = calc_zone_and_domain_selection(&ProviderSpec::new("inmemory"), &zones);

    assert!(result.is_ok());
    assert_eq!(result.zones.len(), 2);
    assert_eq!(result.zone_sel.include, set(&["zab", "zcab"]));
    assert_eq!(result.domain_sel.include, set(&["a.b", "c.a.b"]));
    assert_eq!(result.domain_sel.exclude, set(&["d.a.b"]));
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn wildcard_domain_include_is_fatal() {
    let zones = catalogue(vec![zone("zab", "a.b", &[])]).await;
    let spec = ProviderSpec::new("inmemory").with_domains(SelectionFilter::new(vec!["*.a.b".to_string()], Vec::new()));

    let result = calc_zone_and_domain_selection(&spec, &zones);

    assert_eq!(
        result.error.as_deref(),
        Some("wildcards are not allowed in domains include '*.a.b' (hint: remove the wildcard)")
    );
    assert!(result.zones.is_empty());
}

#[tokio::test]
async fn empty_catalogue_is_fatal() {
    let zones = catalogue(Vec::new()).await;

    let result = calc_zone_and_domain_selection(&ProviderSpec::new("inmemory"), &zones);

    assert_eq!(result.error.as_deref(), Some("no hosted zones found"));
    assert!(result.zones.is_empty());
    assert_eq!(result.zone_sel, SubSelection::default());
    assert_eq!(result.domain_sel, SubSelection::default());
}

#[tokio::test]
async fn zones_of_other_providers_are_ignored() {
    let zones = catalogue(vec![zone("zab", "a.b", &[])]).await;

    let result = calc_zone_and_domain_selection(&ProviderSpec::new("cloudflare"), &zones);

    assert_eq!(result.error.as_deref(), Some("no hosted zones found"));
}

#[tokio::test]
async fn unknown_domain_include_warns() {
    let zones = catalogue(vec![zone("zab", "a.b", &[]), zone("zop", "o.p", &[])]).await;
    let spec = ProviderSpec::new("inmemory").with_domains(SelectionFilter::new(
        vec!["x.a.b".to_string(), "q.r".to_string()],
        Vec::new(),
    ));

    let result = calc_zone_and_domain_selection(&spec, &zones);

    assert!(result.is_ok());
    assert_eq!(result.warnings, vec!["domain \"q.r\" not in hosted domains".to_string()]);
    assert_eq!(result.zone_sel.include, set(&["zab"]));
    assert_eq!(result.domain_sel.include, set(&["x.a.b"]));
}
