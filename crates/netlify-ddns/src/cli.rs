//! Command-line interface
//!
//! Every flag can also be set through a `DDNS_*` environment variable.

use clap::{ArgGroup, Parser};
use ddns_core::config::{DEFAULT_BOOTSTRAP_RESOLVER, DdnsConfig};
use tracing::Level;

#[derive(Parser)]
#[command(name = "netlify-ddns")]
#[command(version)]
#[command(about = "Keep Netlify DNS A/AAAA records pointed at this machine's public address")]
#[command(group(
    ArgGroup::new("targets")
        .required(true)
        .multiple(true)
        .args(["records", "update_root_record"])
))]
pub struct Cli {
    /// Netlify personal access token
    #[arg(long, env = "DDNS_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// DNS zone managed on Netlify (e.g. example.com)
    #[arg(long, env = "DDNS_ZONE")]
    pub zone: String,

    /// Subdomain to update, relative to the zone (repeatable)
    #[arg(long = "record", env = "DDNS_RECORDS", value_delimiter = ',')]
    pub records: Vec<String>,

    /// Update the zone apex instead of subdomains
    #[arg(long, env = "DDNS_UPDATE_ROOT_RECORD")]
    pub update_root_record: bool,

    /// Minutes between updates; 0 runs a single update and exits
    #[arg(long, env = "DDNS_INTERVAL", default_value_t = 0)]
    pub interval: u64,

    /// Also publish AAAA records for the public IPv6 address
    #[arg(long, env = "DDNS_IPV6")]
    pub ipv6: bool,

    /// Resolver used once at startup to find the echo resolver
    #[arg(long, env = "DDNS_BOOTSTRAP_RESOLVER", default_value = DEFAULT_BOOTSTRAP_RESOLVER)]
    pub bootstrap_resolver: String,

    /// Log verbosity
    #[arg(
        long,
        env = "DDNS_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl Cli {
    /// Maximum level for the tracing subscriber
    pub fn log_level(&self) -> Level {
        match self.log_level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Build the updater configuration
    pub fn into_config(self) -> DdnsConfig {
        let mut config = DdnsConfig::new(self.zone, self.access_token)
            .with_root_record(self.update_root_record)
            .with_interval_mins(self.interval)
            .with_ipv6(self.ipv6);

        for record in self.records {
            let record = record.trim();
            if !record.is_empty() {
                config = config.with_record(record);
            }
        }

        config.bootstrap_resolver = self.bootstrap_resolver;
        config
    }
}
