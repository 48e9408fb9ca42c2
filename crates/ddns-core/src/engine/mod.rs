//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the public addresses via PublicIpSource
//! - Synchronizing the target records via RecordSynchronizer
//! - Scheduling the next cycle (interval or backoff)
//! - Stopping on fatal errors
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ PublicIpSource │─── DiscoveredAddresses ───┐
//! └────────────────┘                           │
//!                                              ▼
//!                                     ┌──────────────┐
//!                                     │  DdnsEngine  │
//!                                     └──────────────┘
//!                                              │
//!                         ┌────────────────────┼───────────────────┐
//!                         ▼                                        ▼
//!               ┌────────────────────┐                      ┌─────────────┐
//!               │ RecordSynchronizer │                      │   Events    │
//!               │ (delete → create)  │                      │  (notify)   │
//!               └────────────────────┘                      └─────────────┘
//! ```
//!
//! ## Cycle States
//!
//! `Idle → Updating → {Success, TransientFailure, FatalFailure}`
//!
//! 1. Success, one-shot mode: stop
//! 2. Success, periodic mode: reset backoff, sleep for the interval
//! 3. Transient failure, periodic mode: sleep `2^attempt` seconds, retry
//! 4. Transient failure, one-shot mode: stop with the error
//! 5. Fatal failure (e.g. unauthorized token): stop with the error

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::sync::{RecordSynchronizer, SyncReport};
use crate::traits::{DiscoveredAddresses, DnsProvider, IpVersion, PublicIpSource};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        targets: Vec<String>,
    },

    /// An update cycle started
    CycleStarted {
        attempt: u32,
    },

    /// Public addresses discovered
    AddressesDiscovered {
        ipv4: Ipv4Addr,
        ipv6: Option<Ipv6Addr>,
    },

    /// An update cycle succeeded
    CycleSucceeded {
        deleted: usize,
        created: usize,
    },

    /// An update cycle failed
    CycleFailed {
        error: String,
        attempt: u32,
        /// Delay before the next attempt; `None` when the engine stops
        retry_in: Option<Duration>,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Delay before retry number `attempt` (0-based): `2^attempt` seconds, capped
pub fn backoff_delay(attempt: u32, max: Duration) -> Duration {
    let secs = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(max)
}

/// Core DDNS engine
///
/// The engine orchestrates the discovery → synchronization flow, once or at a
/// fixed interval.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine runs until one-shot completion, a fatal error, or a shutdown
///    signal received while idle
///
/// ## Cancellation
///
/// An in-flight cycle is never cancelled. Shutdown signals are only observed
/// while the engine sleeps between cycles.
pub struct DdnsEngine {
    /// Public address discovery
    ip_source: Box<dyn PublicIpSource>,

    /// Record synchronization over the provider
    synchronizer: RecordSynchronizer,

    /// Provider name, for logging
    provider_name: &'static str,

    /// Fully-qualified hostnames to manage
    targets: Vec<String>,

    /// Whether to discover and publish IPv6
    ipv6: bool,

    /// TTL for created records
    ttl: u32,

    /// Time between successful cycles; `None` runs once
    interval: Option<Duration>,

    /// Upper bound for retry delays
    max_backoff: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: Public IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn PublicIpSource>,
        provider: Arc<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity.max(1));

        let engine = Self {
            ip_source,
            provider_name: provider.provider_name(),
            synchronizer: RecordSynchronizer::new(provider),
            targets: config.target_hostnames(),
            ipv6: config.ipv6,
            ttl: config.record_ttl(),
            interval: config.is_periodic().then(|| config.update_interval()),
            max_backoff: Duration::from_secs(config.engine.max_backoff_secs),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine
    ///
    /// # Returns
    ///
    /// - `Ok(())`: One-shot run succeeded, or clean shutdown while idle
    /// - `Err(Error)`: Fatal error, or the failed cycle of a one-shot run
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    ///
    /// # Parameters
    ///
    /// - `shutdown_rx`: Optional oneshot receiver to trigger shutdown (for testing);
    ///   without it the engine listens for Ctrl-C
    async fn run_internal(&self, mut shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            targets: self.targets.clone(),
        });

        for target in &self.targets {
            info!("Managing record: {}", target);
        }

        let mut attempt: u32 = 0;

        loop {
            self.emit_event(EngineEvent::CycleStarted { attempt });

            let delay = match self.run_cycle().await {
                Ok(report) => {
                    self.emit_event(EngineEvent::CycleSucceeded {
                        deleted: report.deleted,
                        created: report.created.len(),
                    });

                    let Some(interval) = self.interval else {
                        info!("DNS records updated successfully.");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "One-shot update complete".to_string(),
                        });
                        return Ok(());
                    };

                    info!(
                        "DNS records updated successfully. Next update in {} minutes",
                        interval.as_secs() / 60
                    );
                    attempt = 0;
                    interval
                }
                Err(e) if e.is_fatal() => {
                    if e.is_unauthorized() {
                        error!("Fatal error: {} API access token unauthorised", self.provider_name);
                    }
                    error!("Fatal error: {}", e);
                    self.emit_event(EngineEvent::CycleFailed {
                        error: e.to_string(),
                        attempt,
                        retry_in: None,
                    });
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Fatal error".to_string(),
                    });
                    return Err(e);
                }
                Err(e) => {
                    error!("Updating DNS records failed: {}", e);

                    if self.interval.is_none() {
                        self.emit_event(EngineEvent::CycleFailed {
                            error: e.to_string(),
                            attempt,
                            retry_in: None,
                        });
                        self.emit_event(EngineEvent::Stopped {
                            reason: "One-shot update failed".to_string(),
                        });
                        return Err(e);
                    }

                    let delay = backoff_delay(attempt, self.max_backoff);
                    self.emit_event(EngineEvent::CycleFailed {
                        error: e.to_string(),
                        attempt,
                        retry_in: Some(delay),
                    });
                    attempt = attempt.saturating_add(1);
                    warn!("Retrying in {} seconds", delay.as_secs());
                    delay
                }
            };

            if self.idle(delay, &mut shutdown_rx).await {
                info!("Shutdown signal received");
                self.emit_event(EngineEvent::Stopped {
                    reason: "Shutdown signal".to_string(),
                });
                return Ok(());
            }
        }
    }

    /// Run a single discovery + synchronization cycle
    ///
    /// Exposed so callers can drive cycles themselves (e.g. from a scheduler
    /// of their own) without the engine's loop.
    pub async fn run_cycle(&self) -> Result<SyncReport> {
        let addresses = self.discover().await?;
        self.emit_event(EngineEvent::AddressesDiscovered {
            ipv4: addresses.ipv4,
            ipv6: addresses.ipv6,
        });

        self.synchronizer
            .synchronize(&addresses, &self.targets, self.ttl)
            .await
    }

    /// Discover the public addresses for this cycle
    async fn discover(&self) -> Result<DiscoveredAddresses> {
        let ipv4 = self
            .ip_source
            .ipv4()
            .await
            .map_err(|e| Error::discovery(IpVersion::V4, e))?;
        info!("Public IPv4 address: {} (via {})", ipv4, self.ip_source.source_name());

        let ipv6 = if self.ipv6 {
            let ipv6 = self
                .ip_source
                .ipv6()
                .await
                .map_err(|e| Error::discovery(IpVersion::V6, e))?;
            info!("Public IPv6 address: {} (via {})", ipv6, self.ip_source.source_name());
            Some(ipv6)
        } else {
            None
        };

        Ok(DiscoveredAddresses::new(ipv4, ipv6))
    }

    /// Sleep for `delay`, returning `true` if a shutdown signal arrived first
    async fn idle(&self, delay: Duration, shutdown_rx: &mut Option<oneshot::Receiver<()>>) -> bool {
        debug!("Sleeping for {:?}", delay);

        match shutdown_rx {
            Some(rx) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => false,
                    _ = rx => true,
                }
            }
            None => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => false,
                    _ = tokio::signal::ctrl_c() => true,
                }
            }
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            // Full channel or dropped receiver; events are informational only
            debug!("Event channel unavailable, dropping event");
        }
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// # Visibility
    ///
    /// This is `pub` for testing purposes only.
    ///
    /// **TESTING ONLY**: Contract tests require controlled shutdown.
    /// Production code should use `run()` instead, which listens for Ctrl-C.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
