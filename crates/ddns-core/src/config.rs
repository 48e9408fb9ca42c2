//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bootstrap resolver used to find the echo resolver
pub const DEFAULT_BOOTSTRAP_RESOLVER: &str = "1.1.1.1:53";

/// TTL used for created records when running in one-shot mode (seconds)
pub const DEFAULT_RECORD_TTL: u32 = 3600;

/// Extra TTL on top of the update interval, so records outlive one missed cycle
const TTL_GRACE_SECS: u32 = 30;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// DNS zone whose records are managed (e.g. "example.com")
    pub zone: String,

    /// Subdomains to manage within the zone (e.g. "home" for "home.example.com")
    #[serde(default)]
    pub records: Vec<String>,

    /// Manage the zone apex instead of the subdomains
    #[serde(default)]
    pub update_root_record: bool,

    /// Minutes between updates; 0 runs a single update and exits
    #[serde(default)]
    pub update_interval_mins: u64,

    /// Also discover and publish the public IPv6 address (AAAA records)
    #[serde(default)]
    pub ipv6: bool,

    /// Recursive resolver used once at startup to locate the echo resolver
    #[serde(default = "default_bootstrap_resolver")]
    pub bootstrap_resolver: String,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a new configuration for a zone with defaults
    pub fn new(zone: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            records: Vec::new(),
            update_root_record: false,
            update_interval_mins: 0,
            ipv6: false,
            bootstrap_resolver: default_bootstrap_resolver(),
            provider: ProviderConfig::new(access_token),
            engine: EngineConfig::default(),
        }
    }

    /// Add a subdomain to manage
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.records.push(record.into());
        self
    }

    /// Manage the zone apex
    pub fn with_root_record(mut self, update_root_record: bool) -> Self {
        self.update_root_record = update_root_record;
        self
    }

    /// Set the update interval in minutes (0 = run once)
    pub fn with_interval_mins(mut self, minutes: u64) -> Self {
        self.update_interval_mins = minutes;
        self
    }

    /// Enable or disable IPv6 updates
    pub fn with_ipv6(mut self, ipv6: bool) -> Self {
        self.ipv6 = ipv6;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.update_root_record && self.records.is_empty() {
            return Err(crate::Error::config(
                "Either a record or the root record update must be configured",
            ));
        }

        validate_domain_name(&self.zone)?;

        for record in &self.records {
            validate_domain_name(record)?;
        }

        if self.bootstrap_resolver.trim().is_empty() {
            return Err(crate::Error::config("Bootstrap resolver cannot be empty"));
        }

        self.provider.validate()?;

        Ok(())
    }

    /// Fully-qualified hostnames to manage, in configuration order
    ///
    /// When the root record is managed, the zone apex is the only target and
    /// configured subdomains are ignored.
    pub fn target_hostnames(&self) -> Vec<String> {
        let zone = normalize_hostname(&self.zone);

        if self.update_root_record {
            return vec![zone];
        }

        self.records
            .iter()
            .map(|record| format!("{}.{}", normalize_hostname(record), zone))
            .collect()
    }

    /// Whether the engine keeps running after the first successful update
    pub fn is_periodic(&self) -> bool {
        self.update_interval_mins > 0
    }

    /// Time between successful updates
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_mins.saturating_mul(60))
    }

    /// TTL (seconds) for created records
    pub fn record_ttl(&self) -> u32 {
        if !self.is_periodic() {
            return DEFAULT_RECORD_TTL;
        }

        let interval_secs = u32::try_from(self.update_interval().as_secs()).unwrap_or(u32::MAX);
        interval_secs.saturating_add(TTL_GRACE_SECS)
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Personal access token for the provider API
    /// ⚠️ NEVER log this value
    pub access_token: String,

    /// Override for the API base URL (used by tests and proxies)
    #[serde(default)]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Create a provider configuration with the default API endpoint
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            api_base: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.access_token.trim().is_empty() {
            return Err(crate::Error::config("Access token cannot be empty"));
        }

        if let Some(ref base) = self.api_base
            && !base.starts_with("https://")
            && !base.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "API base must use HTTP or HTTPS scheme. Got: {}",
                base
            )));
        }

        Ok(())
    }
}

// Custom Debug implementation that hides the access token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for the exponential retry delay (in seconds)
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_backoff_secs: default_max_backoff_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_bootstrap_resolver() -> String {
    DEFAULT_BOOTSTRAP_RESOLVER.to_string()
}

fn default_max_backoff_secs() -> u64 {
    3600
}

fn default_event_channel_capacity() -> usize {
    100
}

/// Lowercase a hostname and strip any trailing dot
pub fn normalize_hostname(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Validate that a string is a valid domain name (or relative name)
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.trim_end_matches('.');

    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
