//! Contract Test: Cloudflare Handler over HTTP
//!
//! This test drives a handler created by the Cloudflare factory against a
//! mock Cloudflare API.
//!
//! Constraints verified:
//! - Zone state is read once and then served from the cache
//! - Records of unsupported types are not part of the zone state
//! - CNAME targets are sent without the trailing dot
//! - A TTL below the Cloudflare minimum does not cause repeated updates
//! - Dry-run mode issues no mutating calls

use dnsrecon_core::config::{HandlerConfig, ProviderConfig, RateLimitConfig};
use dnsrecon_core::metrics::NoopMetrics;
use dnsrecon_core::model::{DnsSet, DnsSetName, RecordType};
use dnsrecon_core::traits::{DnsHandler, DnsHandlerFactory};
use dnsrecon_core::{ChangeRequest, HostedZone};
use dnsrecon_provider_cloudflare::{CloudflareHandlerFactory, TYPE_CODE};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn zone() -> HostedZone {
    HostedZone::new(TYPE_CODE, "zone123", "example.com")
}

fn handler(server: &MockServer, dry_run: bool) -> Box<dyn DnsHandler> {
    let mut config = HandlerConfig::new(ProviderConfig::Cloudflare {
        api_token: "test_token".to_string(),
        base_url: Some(server.uri()),
    })
    .with_dry_run(dry_run);
    config.rate_limit = RateLimitConfig::disabled();
    CloudflareHandlerFactory.create(&config, Arc::new(NoopMetrics)).unwrap()
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "errors": [],
        "result": result,
    }))
}

fn cname_request() -> ChangeRequest {
    let mut set = DnsSet::new("alias.example.com");
    set.set_records(RecordType::Cname, 300, ["target.example.org."]);
    ChangeRequest::create(RecordType::Cname, set)
}

#[tokio::test]
async fn zone_state_is_read_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/zone123/dns_records"))
        .respond_with(ok(json!([
            {"id": "r1", "type": "A", "name": "www.example.com", "content": "1.2.3.4", "ttl": 300},
            {"id": "r2", "type": "A", "name": "www.example.com", "content": "5.6.7.8", "ttl": 300},
            {"id": "r3", "type": "MX", "name": "example.com", "content": "mail.example.com", "ttl": 300}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server, false);
    let state = handler.get_zone_state(&zone()).await.unwrap();
    let again = handler.get_zone_state(&zone()).await.unwrap();

    assert_eq!(state.dns_sets.len(), 1);
    let www = state.dns_sets.get(&DnsSetName::new("www.example.com")).unwrap();
    let values: Vec<&str> = www.record_set(RecordType::A).unwrap().values().collect();
    assert_eq!(values, vec!["1.2.3.4", "5.6.7.8"]);
    assert_eq!(again.dns_sets.len(), 1);
}

#[tokio::test]
async fn cname_is_created_without_trailing_dot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/zone123/dns_records"))
        .and(body_json(json!({
            "type": "CNAME",
            "name": "alias.example.com",
            "content": "target.example.org",
            "ttl": 300
        })))
        .respond_with(ok(json!({"id": "r9"})))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server, false);
    handler.execute_requests(&zone(), &[cname_request()]).await.unwrap();
}

#[tokio::test]
async fn short_ttl_update_is_stable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/zone123/dns_records"))
        .respond_with(ok(json!([
            {"id": "r1", "type": "A", "name": "www.example.com", "content": "1.2.3.4", "ttl": 1}
        ])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ok(json!({"id": "r1"})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({"id": "r2"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut set = DnsSet::new("www.example.com");
    set.set_records(RecordType::A, 60, ["1.2.3.4"]);
    let update = ChangeRequest::update(RecordType::A, None, set);

    let handler = handler(&server, false);
    for _ in 0..2 {
        handler.execute_requests(&zone(), std::slice::from_ref(&update)).await.unwrap();
    }
}

#[tokio::test]
async fn dry_run_issues_no_mutations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/zone123/dns_records"))
        .respond_with(ok(json!({"id": "r9"})))
        .expect(0)
        .mount(&server)
        .await;

    let handler = handler(&server, true);
    handler.execute_requests(&zone(), &[cname_request()]).await.unwrap();
}

#[tokio::test]
async fn rejected_create_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/zone123/dns_records"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let handler = handler(&server, false);
    let err = handler.execute_requests(&zone(), &[cname_request()]).await.unwrap_err();
    assert_eq!(err.to_string(), "1 changes failed");
}
