// # Netlify DNS Provider
//
// This crate provides a Netlify DNS provider implementation for the DDNS system.
//
// ## Behavior
//
// - One HTTP request per trait call (list, delete, create)
// - Full error propagation to the engine; no retry, no backoff
// - HTTP timeout configured (30 seconds)
// - 401 maps to `Error::Authentication` so the engine stops immediately
// - Only A and AAAA records are surfaced by `list_records`
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the Netlify API only
// - ✅ Parse Netlify-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads (concurrency is owned by RecordSynchronizer)
// - ❌ Implement retry logic (owned by DdnsEngine)
// - ❌ Cache records between calls
//
// ## Security Requirements
//
// - Access token NEVER appears in logs or Debug output
// - Provider construction fails if the token is empty
//
// ## API Reference
//
// - Netlify API v1: https://open-api.netlify.com/
// - List records: GET `/dns_zones/:zone_id/dns_records`
// - Delete record: DELETE `/dns_zones/:zone_id/dns_records/:record_id`
// - Create record: POST `/dns_zones/:zone_id/dns_records`
//
// Zone IDs are the zone name with dots replaced by underscores
// (`example.com` -> `example_com`).

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{DnsProvider, DnsRecord, NewRecord, RecordType};
use ddns_core::{Error, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Netlify API base URL
pub const NETLIFY_API_BASE: &str = "https://api.netlify.com/api/v1";

/// User-Agent sent with every request
const USER_AGENT: &str = "NetlifyDDNS";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "netlify";

/// A DNS record as returned by the Netlify API
#[derive(Debug, Deserialize)]
struct NetlifyRecord {
    id: String,
    hostname: String,
    #[serde(rename = "type")]
    record_type: String,
    value: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    dns_zone_id: Option<String>,
}

impl TryFrom<NetlifyRecord> for DnsRecord {
    type Error = Error;

    fn try_from(record: NetlifyRecord) -> Result<Self> {
        Ok(DnsRecord {
            record_type: RecordType::from_str(&record.record_type)?,
            id: record.id,
            hostname: record.hostname,
            value: record.value,
            ttl: record.ttl,
            zone_id: record.dns_zone_id,
        })
    }
}

/// Netlify DNS provider
///
/// # Trust Level: Untrusted
///
/// Stateless apart from the HTTP client. Every call maps to exactly one
/// API request.
///
/// # Security
///
/// The Debug implementation does NOT expose the access token.
pub struct NetlifyProvider {
    /// Personal access token
    /// ⚠️ NEVER log this value
    access_token: String,

    /// Zone ID derived from the zone name
    zone_id: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for NetlifyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlifyProvider")
            .field("access_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl NetlifyProvider {
    /// Create a provider for `zone`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the access token is empty, the API base
    /// is invalid, or the zone name is empty.
    pub fn new(config: &ProviderConfig, zone: &str) -> Result<Self> {
        config.validate()?;

        let zone = ddns_core::config::normalize_hostname(zone);
        if zone.is_empty() {
            return Err(Error::config("Netlify zone cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to build HTTP client: {}", e)))?;

        let api_base = config
            .api_base
            .as_deref()
            .unwrap_or(NETLIFY_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            access_token: config.access_token.clone(),
            zone_id: zone_id_for(&zone),
            api_base,
            client,
        })
    }

    /// The Netlify zone ID records are managed in
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/dns_zones/{}/dns_records", self.api_base, zone_id)
    }

    async fn send(&self, request: reqwest::RequestBuilder, action: &str) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        check_status(response, action).await
    }
}

/// Map a non-success status to the engine's error classes
async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    match status.as_u16() {
        401 => Err(Error::auth(format!(
            "Netlify rejected the access token while trying to {}. Status: {}",
            action, status
        ))),
        403 => Err(Error::provider(
            PROVIDER,
            format!("Permission denied to {}. Status: {}", action, status),
        )),
        404 => Err(Error::provider(
            PROVIDER,
            format!("Not found while trying to {}: {} - {}", action, status, error_text),
        )),
        429 => Err(Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        )),
        500..=599 => Err(Error::provider(
            PROVIDER,
            format!("Netlify server error (transient): {} - {}", status, error_text),
        )),
        _ => Err(Error::provider(
            PROVIDER,
            format!("Failed to {}: {} - {}", action, status, error_text),
        )),
    }
}

/// Netlify zone ID for a zone name
pub fn zone_id_for(zone: &str) -> String {
    zone.replace('.', "_")
}

#[async_trait]
impl DnsProvider for NetlifyProvider {
    /// List the zone's A and AAAA records
    ///
    /// ```http
    /// GET /dns_zones/:zone_id/dns_records
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        let url = self.records_url(&self.zone_id);
        tracing::debug!("Listing DNS records of zone {}", self.zone_id);

        let response = self.send(self.client.get(&url), "list records").await?;

        let records: Vec<NetlifyRecord> = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse record list: {}", e))
        })?;

        let total = records.len();
        let records: Vec<DnsRecord> = records
            .into_iter()
            .filter_map(|r| DnsRecord::try_from(r).ok())
            .collect();

        tracing::debug!(
            "Zone {} has {} records, {} of type A/AAAA",
            self.zone_id,
            total,
            records.len()
        );
        Ok(records)
    }

    /// Delete one record, in the zone the listing reported for it
    ///
    /// ```http
    /// DELETE /dns_zones/:zone_id/dns_records/:record_id
    /// ```
    async fn delete_record(&self, record: &DnsRecord) -> Result<()> {
        let zone_id = record.zone_id.as_deref().unwrap_or(&self.zone_id);
        let url = format!("{}/{}", self.records_url(zone_id), record.id);

        tracing::debug!(
            "Deleting {} record {} ({} -> {})",
            record.record_type,
            record.id,
            record.hostname,
            record.value
        );

        let action = format!("delete record {}", record.id);
        self.send(self.client.delete(&url), &action).await?;
        Ok(())
    }

    /// Create one record and return it as stored by Netlify
    ///
    /// ```http
    /// POST /dns_zones/:zone_id/dns_records
    /// {"type": "A", "hostname": "home.example.com", "value": "1.2.3.4", "ttl": 330}
    /// ```
    async fn create_record(&self, record: &NewRecord) -> Result<DnsRecord> {
        let url = self.records_url(&self.zone_id);

        tracing::debug!(
            "Creating {} record {} -> {} (ttl {})",
            record.record_type,
            record.hostname,
            record.value,
            record.ttl
        );

        let action = format!("create {} record for {}", record.record_type, record.hostname);
        let response = self.send(self.client.post(&url).json(record), &action).await?;

        let created: NetlifyRecord = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse created record: {}", e))
        })?;

        DnsRecord::try_from(created)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
