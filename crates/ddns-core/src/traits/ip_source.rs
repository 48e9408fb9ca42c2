// # Public IP Source Trait
//
// Defines the interface for discovering the machine's externally visible
// IPv4 and IPv6 addresses.
//
// ## Implementations
//
// - OpenDNS echo resolver (DNS self-query): `ddns-ip-opendns` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::PublicIpSource;
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let source = /* PublicIpSource implementation */;
//
//     let v4 = source.ipv4().await?;
//     println!("Public IPv4: {}", v4);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// Public addresses discovered during one update cycle
///
/// Produced fresh every cycle and never cached between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredAddresses {
    /// The public IPv4 address
    pub ipv4: Ipv4Addr,
    /// The public IPv6 address, when IPv6 updates are enabled
    pub ipv6: Option<Ipv6Addr>,
}

impl DiscoveredAddresses {
    /// Create a new address set
    pub fn new(ipv4: Ipv4Addr, ipv6: Option<Ipv6Addr>) -> Self {
        Self { ipv4, ipv6 }
    }
}

/// Trait for public IP source implementations
///
/// Each call performs fresh network queries; implementations must not cache
/// results between calls.
///
/// # Trust Level: Semi-Trusted
///
/// IP sources are **semi-trusted** components with the following capabilities:
///
/// ## Allowed Capabilities
/// - ✅ Perform network I/O towards their discovery service
/// - ✅ Hold immutable state established at construction time
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS record updates (use `DnsProvider`)
/// - ❌ Implement retry logic (use `DdnsEngine`)
/// - ❌ Spawn background tasks
/// - ❌ Make decisions about when to update DNS
///
/// IP sources are **observers**, not **decision-makers**.
#[async_trait]
pub trait PublicIpSource: Send + Sync {
    /// Discover the public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The public IPv4 address
    /// - `Err(Error)`: `NoRecord`, `Transport` or `Protocol` on failure
    async fn ipv4(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Discover the public IPv6 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv6Addr)`: The public IPv6 address
    /// - `Err(Error::NoIpv6Route)`: The network path has no IPv6 connectivity
    /// - `Err(Error)`: Any other discovery failure
    async fn ipv6(&self) -> Result<Ipv6Addr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
