// # OpenDNS IP Source
//
// This crate discovers the machine's public address by asking the OpenDNS
// echo resolver for `myip.opendns.com`. The resolver answers with the
// source address of the query itself.
//
// ## Architecture
//
// Discovery happens in two steps:
//
// 1. **Bootstrap** (once, at construction): a general-purpose resolver
//    (default `1.1.1.1:53`) is asked for the A and AAAA addresses of
//    `resolver1.opendns.com`.
// 2. **Echo** (every cycle): the echo resolver is queried directly over
//    IPv4 or IPv6, so the answer reflects the public address of that family.
//
// A failed IPv4 bootstrap is fatal. A failed IPv6 bootstrap only disables
// IPv6 discovery; `ipv6()` then reports `Error::Ipv6Unavailable`.
//
// ## Retry Policy
//
// This source does **not** retry. Failed queries surface to the engine,
// which owns backoff.

mod answer;
mod exchange;

pub use exchange::{DEFAULT_QUERY_TIMEOUT, DnsExchange};

use answer::{first_ipv4, first_ipv6};
use async_trait::async_trait;
use ddns_core::traits::PublicIpSource;
use ddns_core::{Error, Result};
use hickory_proto::rr::{Name, RecordType};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Host name of the OpenDNS echo resolver
pub const ECHO_RESOLVER_HOST: &str = "resolver1.opendns.com.";

/// Name the echo resolver answers with the querier's address
pub const ECHO_QUERY_NAME: &str = "myip.opendns.com.";

/// Standard DNS port
pub const DNS_PORT: u16 = 53;

/// Public IP source backed by the OpenDNS echo resolver
#[derive(Debug, Clone)]
pub struct OpenDnsSource {
    /// IPv4 address of the echo resolver
    ipv4_resolver: Ipv4Addr,

    /// IPv6 address of the echo resolver (None = IPv6 bootstrap failed)
    ipv6_resolver: Option<Ipv6Addr>,

    /// Port the echo resolver listens on
    echo_port: u16,

    /// Name queried on the echo resolver
    echo_name: Name,

    exchange: DnsExchange,
}

impl OpenDnsSource {
    /// Bootstrap the echo resolver addresses through `bootstrap`
    ///
    /// Uses the default query timeout and echo port. See
    /// [`OpenDnsSourceBuilder`] to change them.
    pub async fn initialize(bootstrap: &str) -> Result<Self> {
        Self::builder().initialize(bootstrap).await
    }

    /// Create a source with already-known echo resolver addresses
    pub fn with_resolvers(ipv4_resolver: Ipv4Addr, ipv6_resolver: Option<Ipv6Addr>) -> Self {
        Self::builder().with_resolvers(ipv4_resolver, ipv6_resolver)
    }

    /// Start building a source with non-default settings
    pub fn builder() -> OpenDnsSourceBuilder {
        OpenDnsSourceBuilder::default()
    }

    /// The IPv4 address of the echo resolver
    pub fn ipv4_resolver(&self) -> Ipv4Addr {
        self.ipv4_resolver
    }

    /// The IPv6 address of the echo resolver, if bootstrap found one
    pub fn ipv6_resolver(&self) -> Option<Ipv6Addr> {
        self.ipv6_resolver
    }
}

#[async_trait]
impl PublicIpSource for OpenDnsSource {
    async fn ipv4(&self) -> Result<Ipv4Addr> {
        let server = SocketAddr::new(IpAddr::V4(self.ipv4_resolver), self.echo_port);

        let response = self
            .exchange
            .query(server, &self.echo_name, RecordType::A)
            .await?;

        let ip = first_ipv4(&response).map_err(|e| {
            Error::no_record(format!("{} gave no A record for {}: {}", server, self.echo_name, e))
        })?;

        debug!("Echo resolver reports public IPv4 {}", ip);
        Ok(ip)
    }

    async fn ipv6(&self) -> Result<Ipv6Addr> {
        let Some(resolver) = self.ipv6_resolver else {
            return Err(Error::ipv6_unavailable(format!(
                "no IPv6 address known for {}",
                ECHO_RESOLVER_HOST
            )));
        };

        // SocketAddr renders IPv6 in brackets: [addr]:port
        let server = SocketAddr::new(IpAddr::V6(resolver), self.echo_port);

        let response = self
            .exchange
            .query(server, &self.echo_name, RecordType::AAAA)
            .await?;

        let ip = first_ipv6(&response).map_err(|e| {
            Error::no_record(format!(
                "{} gave no AAAA record for {}: {}",
                server, self.echo_name, e
            ))
        })?;

        debug!("Echo resolver reports public IPv6 {}", ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "opendns"
    }
}

/// Builder for [`OpenDnsSource`]
#[derive(Debug, Clone, Copy)]
pub struct OpenDnsSourceBuilder {
    timeout: Duration,
    echo_port: u16,
}

impl Default for OpenDnsSourceBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            echo_port: DNS_PORT,
        }
    }
}

impl OpenDnsSourceBuilder {
    /// Per-query timeout for bootstrap and echo queries
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Port used for echo queries
    pub fn echo_port(mut self, port: u16) -> Self {
        self.echo_port = port;
        self
    }

    /// Build a source with known echo resolver addresses
    pub fn with_resolvers(
        self,
        ipv4_resolver: Ipv4Addr,
        ipv6_resolver: Option<Ipv6Addr>,
    ) -> OpenDnsSource {
        OpenDnsSource {
            ipv4_resolver,
            ipv6_resolver,
            echo_port: self.echo_port,
            echo_name: echo_query_name(),
            exchange: DnsExchange::new(self.timeout),
        }
    }

    /// Resolve the echo resolver through `bootstrap` and build the source
    ///
    /// # Errors
    ///
    /// - `Error::Config`: `bootstrap` is not a usable address
    /// - `Error::Bootstrap`: the bootstrap resolver could not be reached
    ///   for the A query
    /// - `Error::Protocol`: the A answer was empty, malformed or of the
    ///   wrong type
    ///
    /// Any failure of the AAAA query is logged and leaves IPv6 disabled.
    pub async fn initialize(self, bootstrap: &str) -> Result<OpenDnsSource> {
        let server = resolve_bootstrap(bootstrap).await?;
        let exchange = DnsExchange::new(self.timeout);
        let host = echo_resolver_host();

        info!("Bootstrapping {} through {}", ECHO_RESOLVER_HOST, server);

        let response = exchange
            .query(server, &host, RecordType::A)
            .await
            .map_err(bootstrap_failure)?;
        let ipv4_resolver = first_ipv4(&response).map_err(|e| {
            Error::protocol(format!("Bootstrap A answer for {}: {}", ECHO_RESOLVER_HOST, e))
        })?;

        let ipv6_resolver = match exchange.query(server, &host, RecordType::AAAA).await {
            Ok(response) => match first_ipv6(&response) {
                Ok(ip) => Some(ip),
                Err(e) => {
                    warn!(
                        "Bootstrap AAAA answer for {} unusable ({}), IPv6 discovery disabled",
                        ECHO_RESOLVER_HOST, e
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    "Bootstrap AAAA query for {} failed ({}), IPv6 discovery disabled",
                    ECHO_RESOLVER_HOST, e
                );
                None
            }
        };

        info!(
            "Echo resolver at {} (IPv6: {})",
            ipv4_resolver,
            ipv6_resolver.map_or_else(|| "unavailable".to_string(), |ip| ip.to_string())
        );

        Ok(self.with_resolvers(ipv4_resolver, ipv6_resolver))
    }
}

/// Failures reaching the bootstrap resolver become `Bootstrap` errors;
/// bad answers are protocol violations.
fn bootstrap_failure(error: Error) -> Error {
    match error {
        Error::Protocol(_) => error,
        Error::NoRecord(msg) => Error::protocol(msg),
        other => Error::bootstrap(format!(
            "Failed to resolve {}: {}",
            ECHO_RESOLVER_HOST, other
        )),
    }
}

/// Parse `ip:port`, bare `ip` (port 53) or `host:port`
async fn resolve_bootstrap(bootstrap: &str) -> Result<SocketAddr> {
    let bootstrap = bootstrap.trim();

    if let Ok(addr) = SocketAddr::from_str(bootstrap) {
        return Ok(addr);
    }

    if let Ok(ip) = IpAddr::from_str(bootstrap.trim_start_matches('[').trim_end_matches(']')) {
        return Ok(SocketAddr::new(ip, DNS_PORT));
    }

    let mut addrs = tokio::net::lookup_host(bootstrap).await.map_err(|e| {
        Error::config(format!("Invalid bootstrap resolver '{}': {}", bootstrap, e))
    })?;

    addrs.next().ok_or_else(|| {
        Error::config(format!("Bootstrap resolver '{}' has no address", bootstrap))
    })
}

fn echo_resolver_host() -> Name {
    Name::from_ascii(ECHO_RESOLVER_HOST).unwrap_or_else(|_| unreachable!("static name is valid"))
}

fn echo_query_name() -> Name {
    Name::from_ascii(ECHO_QUERY_NAME).unwrap_or_else(|_| unreachable!("static name is valid"))
}
