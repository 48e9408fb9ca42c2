// # DNS Provider Trait
//
// Defines the interface for managing DNS records via a provider API.
//
// ## Implementations
//
// - Netlify DNS: `ddns-provider-netlify` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{DnsProvider, NewRecord, RecordType};
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for record in provider.list_records().await? {
//         provider.delete_record(&record).await?;
//     }
//
//     provider
//         .create_record(&NewRecord::new("home.example.com", RecordType::A, "203.0.113.5", 330))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record type managed by the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type ("A" or "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::invalid_input(format!(
                "Unsupported record type: {}",
                other
            ))),
        }
    }
}

/// A DNS record as it exists at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// Fully-qualified hostname
    pub hostname: String,
    /// Record type
    pub record_type: RecordType,
    /// Record value (the address, in textual form)
    pub value: String,
    /// Time-to-live for the record
    pub ttl: Option<u32>,
    /// Zone the record belongs to, when the provider reports it
    pub zone_id: Option<String>,
}

/// A DNS record to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    /// Fully-qualified hostname
    pub hostname: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record value (the address, in textual form)
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl NewRecord {
    /// Create a new record description
    pub fn new(
        hostname: impl Into<String>,
        record_type: RecordType,
        value: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            record_type,
            value: value.into(),
            ttl,
        }
    }
}

/// Trait for DNS provider implementations
///
/// This trait defines the three record operations the synchronizer needs.
/// Implementations must handle the specifics of each provider's API.
///
/// # Thread Safety
///
/// Implementations must be thread-safe; the synchronizer calls
/// `delete_record` and `create_record` from concurrent tasks.
///
/// # Trust Level: Untrusted
///
/// DNS providers are **untrusted** components with strict limitations:
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Make scheduling decisions (owned by `DdnsEngine`)
/// - ❌ Cache state beyond single request
///
/// ## Error Contract
///
/// An "unauthorized" answer MUST be reported as `Error::Authentication` so
/// the engine can stop instead of retrying. Every other failure should be
/// returned as-is; the engine retries according to its policy.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the A and AAAA records of the managed zone
    ///
    /// Records of other types are not returned.
    async fn list_records(&self) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Delete a record by its ID
    async fn delete_record(&self, record: &DnsRecord) -> Result<(), crate::Error>;

    /// Create a record
    ///
    /// # Returns
    ///
    /// The record as stored by the provider (including its new ID)
    async fn create_record(&self, record: &NewRecord) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "netlify")
    fn provider_name(&self) -> &'static str;
}
