//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PublicIpSource`]: Discover the machine's public addresses
//! - [`DnsProvider`]: Manage DNS records via provider APIs

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{PublicIpSource, DiscoveredAddresses, IpVersion};
pub use dns_provider::{DnsProvider, DnsRecord, NewRecord, RecordType};
