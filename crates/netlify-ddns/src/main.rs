// # netlify-ddns
//
// This binary is a THIN integration layer. It is responsible for:
// 1. Reading configuration from flags / `DDNS_*` environment variables
// 2. Initializing logging and the runtime
// 3. Bootstrapping the echo resolver and building the Netlify client
// 4. Running the DDNS engine and mapping its outcome to an exit code
//
// All update logic lives in ddns-core.
//
// ## Example
//
// ```bash
// export DDNS_ACCESS_TOKEN=your_token
// export DDNS_ZONE=example.com
// export DDNS_RECORDS=home,vpn
// export DDNS_INTERVAL=5
//
// netlify-ddns --ipv6
// ```

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use ddns_core::{DdnsConfig, DdnsEngine};
use ddns_ip_opendns::OpenDnsSource;
use ddns_provider_netlify::NetlifyProvider;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown or successful one-shot update
/// - 1: Configuration or startup error
/// - 2: Update failure (one-shot) or unexpected runtime error
/// - 3: The provider rejected the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
    /// Access token unauthorised
    Unauthorized = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    /// Exit code for an error returned by the engine
    fn for_error(err: &ddns_core::Error) -> Self {
        if err.is_unauthorized() {
            DdnsExitCode::Unauthorized
        } else if err.is_fatal() {
            DdnsExitCode::ConfigError
        } else {
            DdnsExitCode::RuntimeError
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = cli.into_config();
    if let Err(e) = config.validate() {
        error!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Build the collaborators and run the engine to completion
async fn run(config: DdnsConfig) -> DdnsExitCode {
    let engine = match build_engine(config).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    match engine.run().await {
        Ok(()) => DdnsExitCode::CleanShutdown,
        Err(e) => DdnsExitCode::for_error(&e),
    }
}

async fn build_engine(config: DdnsConfig) -> anyhow::Result<DdnsEngine> {
    info!("Starting netlify-ddns for zone {}", config.zone);

    let ip_source = OpenDnsSource::initialize(&config.bootstrap_resolver)
        .await
        .with_context(|| {
            format!(
                "Could not reach the echo resolver via {}",
                config.bootstrap_resolver
            )
        })?;

    let provider = NetlifyProvider::new(&config.provider, &config.zone)
        .context("Could not create the Netlify client")?;

    // Progress is logged by the engine itself; events are not consumed here
    let (engine, _events) = DdnsEngine::new(Box::new(ip_source), Arc::new(provider), config)?;

    Ok(engine)
}
