// # Cloudflare API Access
//
// `ProviderAccess` over the Cloudflare API v4.
//
// ## API Reference
//
// - List Zones: GET `/zones?page=..&per_page=..`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=..&name=..`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Construction fails fast if the token is empty
//
// Rate limiting and request counting are applied by the handler around this
// binding, so nothing here retries or waits.

use async_trait::async_trait;
use dnsrecon_core::model::normalize_domain_name;
use dnsrecon_core::traits::{ProviderAccess, ProviderRecord, RecordFilter};
use dnsrecon_core::{Error, HostedZone, RecordType, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::TYPE_CODE;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare treats TTL 1 as "automatic" and rejects values below 120
const MIN_TTL: i64 = 120;
const AUTOMATIC_TTL: i64 = 1;

const ZONES_PER_PAGE: u32 = 50;
const RECORDS_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct CfZone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CfRecord {
    id: String,
    #[serde(rename = "type")]
    rtype: String,
    name: String,
    content: String,
    ttl: i64,
}

#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "type")]
    rtype: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: i64,
}

impl<'a> RecordBody<'a> {
    fn from_record(record: &'a ProviderRecord) -> Self {
        Self {
            rtype: record.rtype.as_str(),
            name: &record.name,
            content: &record.value,
            ttl: api_ttl(record.ttl),
        }
    }
}

/// TTL as sent to Cloudflare
pub fn api_ttl(ttl: i64) -> i64 {
    if ttl < MIN_TTL { AUTOMATIC_TTL } else { ttl }
}

/// Cloudflare account access
pub struct CloudflareAccess {
    /// ⚠️ NEVER log this value
    api_token: String,
    base_url: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareAccess")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareAccess {
    /// Create an access for an API token
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    /// - `base_url`: API base URL, [`CLOUDFLARE_API_BASE`] if `None`
    pub fn new(api_token: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(map_status(status, &error_text, context));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::provider(TYPE_CODE, format!("Failed to parse response: {}", e)))?;
        if !envelope.success {
            let messages: Vec<String> = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            return Err(Error::provider(
                TYPE_CODE,
                format!("{} failed: {}", context, messages.join(", ")),
            ));
        }
        Ok(envelope)
    }

    async fn list_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        per_page: u32,
        context: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let request = self
                .client
                .get(self.url(path))
                .query(query)
                .query(&[("page", page), ("per_page", per_page)]);
            let envelope: Envelope<Vec<T>> = self.send(request, context).await?;
            items.extend(envelope.result.unwrap_or_default());

            match envelope.result_info {
                Some(info) if info.page.max(page) < info.total_pages => page += 1,
                _ => break,
            }
        }
        Ok(items)
    }
}

/// Map an unsuccessful HTTP status to an error
fn map_status(status: StatusCode, error_text: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(context.to_string()),
        409 => Error::provider(
            TYPE_CODE,
            format!("Conflict: Record is being updated by another process. Status: {}", status),
        ),
        429 => Error::rate_limited(format!("Rate limit exceeded. Please retry later. Status: {}", status)),
        500..=599 => Error::provider(
            TYPE_CODE,
            format!("Cloudflare server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            TYPE_CODE,
            format!("{} failed: {} - {}", context, status, error_text),
        ),
    }
}

fn record_id(record: &ProviderRecord) -> Result<&str> {
    record.id.as_deref().ok_or_else(|| {
        Error::invalid_input(format!("record {} {} has no id", record.rtype, record.name))
    })
}

#[async_trait]
impl ProviderAccess for CloudflareAccess {
    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        let zones: Vec<CfZone> = self
            .list_paged("/zones", &[], ZONES_PER_PAGE, "Listing zones")
            .await?;
        debug!("Found {} Cloudflare zones", zones.len());
        Ok(zones
            .into_iter()
            .map(|z| HostedZone::new(TYPE_CODE, z.id, normalize_domain_name(&z.name)))
            .collect())
    }

    async fn list_records(&self, zone: &HostedZone, filter: &RecordFilter) -> Result<Vec<ProviderRecord>> {
        let mut query = Vec::new();
        if let Some(rtype) = filter.rtype {
            query.push(("type", rtype.as_str().to_string()));
        }
        if let Some(name) = &filter.name {
            query.push(("name", normalize_domain_name(name)));
        }

        let path = format!("/zones/{}/dns_records", zone.id.id);
        let context = format!("Listing records of zone {}", zone.domain);
        let records: Vec<CfRecord> = self
            .list_paged(&path, &query, RECORDS_PER_PAGE, &context)
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|r| {
                let rtype = match r.rtype.parse::<RecordType>() {
                    Ok(t @ (RecordType::A | RecordType::Aaaa | RecordType::Cname | RecordType::Txt)) => t,
                    _ => return None,
                };
                Some(ProviderRecord::new(r.name, rtype, r.content, r.ttl).with_id(r.id))
            })
            .filter(|r| filter.matches(r))
            .collect())
    }

    async fn create_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("/zones/{}/dns_records", zone.id.id)))
            .json(&RecordBody::from_record(record));
        let context = format!("Creating {} record {}", record.rtype, record.name);
        let _: Envelope<serde_json::Value> = self.send(request, &context).await?;
        debug!("Created {} record {} in zone {}", record.rtype, record.name, zone.domain);
        Ok(())
    }

    async fn update_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        let id = record_id(record)?;
        let request = self
            .client
            .put(self.url(&format!("/zones/{}/dns_records/{}", zone.id.id, id)))
            .json(&RecordBody::from_record(record));
        let context = format!("Updating {} record {}", record.rtype, record.name);
        let _: Envelope<serde_json::Value> = self.send(request, &context).await?;
        debug!("Updated {} record {} in zone {}", record.rtype, record.name, zone.domain);
        Ok(())
    }

    async fn delete_record(&self, zone: &HostedZone, record: &ProviderRecord) -> Result<()> {
        let id = record_id(record)?;
        let request = self
            .client
            .delete(self.url(&format!("/zones/{}/dns_records/{}", zone.id.id, id)));
        let context = format!("Deleting {} record {}", record.rtype, record.name);
        let _: Envelope<serde_json::Value> = self.send(request, &context).await?;
        debug!("Deleted {} record {} in zone {}", record.rtype, record.name, zone.domain);
        Ok(())
    }
}
