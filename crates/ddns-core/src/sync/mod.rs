//! Record synchronization
//!
//! One synchronization cycle replaces the address records of every target
//! hostname with freshly discovered values:
//!
//! ```text
//! list_records ──► delete stale A/AAAA (concurrent) ──► barrier
//!                                                          │
//!                  create fresh A/AAAA (concurrent) ◄──────┘
//!                                 │
//!                              barrier ──► SyncReport
//! ```
//!
//! No creation starts before every deletion has finished, so a create can
//! never race ahead of a stale delete and leave duplicate records behind.
//! A failed batch aborts the cycle; records already touched stay as they
//! are until the next successful cycle.

use crate::config::normalize_hostname;
use crate::error::{Error, Result};
use crate::traits::{DiscoveredAddresses, DnsProvider, DnsRecord, NewRecord, RecordType};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of a successful synchronization cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Number of stale records deleted
    pub deleted: usize,
    /// Records created in this cycle
    pub created: Vec<DnsRecord>,
}

/// Replaces A/AAAA records at the target hostnames with discovered addresses
pub struct RecordSynchronizer {
    provider: Arc<dyn DnsProvider>,
}

impl RecordSynchronizer {
    /// Create a synchronizer over a provider
    pub fn new(provider: Arc<dyn DnsProvider>) -> Self {
        Self { provider }
    }

    /// Run one synchronization cycle
    ///
    /// # Parameters
    ///
    /// - `addresses`: Freshly discovered public addresses; AAAA records are
    ///   only touched when `addresses.ipv6` is present
    /// - `targets`: Fully-qualified hostnames to manage
    /// - `ttl`: TTL for the created records
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: Every deletion and creation succeeded
    /// - `Err(Error)`: The first failure; remaining failures are logged
    pub async fn synchronize(
        &self,
        addresses: &DiscoveredAddresses,
        targets: &[String],
        ttl: u32,
    ) -> Result<SyncReport> {
        let provider_name = self.provider.provider_name();
        let manage_v6 = addresses.ipv6.is_some();
        let wanted: HashSet<String> = targets.iter().map(|t| normalize_hostname(t)).collect();

        let existing = self.provider.list_records().await?;
        let stale: Vec<DnsRecord> = existing
            .into_iter()
            .filter(|record| match record.record_type {
                RecordType::A => true,
                RecordType::Aaaa => manage_v6,
            })
            .filter(|record| wanted.contains(&normalize_hostname(&record.hostname)))
            .collect();

        debug!(
            "Found {} stale record(s) at {} target(s) on {}",
            stale.len(),
            wanted.len(),
            provider_name
        );

        let mut deletions = JoinSet::new();
        for record in stale {
            let provider = Arc::clone(&self.provider);
            deletions.spawn(async move {
                provider.delete_record(&record).await?;
                debug!(
                    "Deleted {} record {} ({}) -> {}",
                    record.record_type, record.hostname, record.id, record.value
                );
                Ok::<_, Error>(())
            });
        }
        let deleted = join_all(deletions, "delete").await?.len();

        let mut creations = JoinSet::new();
        for hostname in targets {
            let mut fresh = vec![NewRecord::new(
                normalize_hostname(hostname),
                RecordType::A,
                addresses.ipv4.to_string(),
                ttl,
            )];
            if let Some(ipv6) = addresses.ipv6 {
                fresh.push(NewRecord::new(
                    normalize_hostname(hostname),
                    RecordType::Aaaa,
                    ipv6.to_string(),
                    ttl,
                ));
            }

            for new_record in fresh {
                let provider = Arc::clone(&self.provider);
                creations.spawn(async move {
                    let created = provider.create_record(&new_record).await?;
                    debug!(
                        "Created {} record {} -> {} (ttl {})",
                        created.record_type, created.hostname, created.value, new_record.ttl
                    );
                    Ok::<_, Error>(created)
                });
            }
        }
        let created = join_all(creations, "create").await?;

        info!(
            "Synchronized {} hostname(s) on {}: {} deleted, {} created",
            targets.len(),
            provider_name,
            deleted,
            created.len()
        );

        Ok(SyncReport { deleted, created })
    }
}

/// Wait for every task in the set, then report a failure
///
/// The set is always drained completely before returning, so no task of this
/// phase is still running when the next phase begins. The first failure wins
/// unless a later one is fatal and it is not: a rejected token must stop the
/// loop even when a transient error happened to arrive first.
async fn join_all<T>(mut tasks: JoinSet<Result<T>>, phase: &str) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let mut results = Vec::with_capacity(tasks.len());
    let mut first_error: Option<Error> = None;
    let mut failures = 0usize;

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .unwrap_or_else(|e| Err(Error::Other(format!("{} task failed: {}", phase, e))));
        match outcome {
            Ok(value) => results.push(value),
            Err(e) => {
                failures += 1;
                match first_error.take() {
                    None => first_error = Some(e),
                    Some(current) if e.is_fatal() && !current.is_fatal() => {
                        warn!("Additional {} failure: {}", phase, current);
                        first_error = Some(e);
                    }
                    Some(current) => {
                        warn!("Additional {} failure: {}", phase, e);
                        first_error = Some(current);
                    }
                }
            }
        }
    }

    match first_error {
        Some(e) => {
            if failures > 1 {
                warn!(
                    "{} {} operations failed ({} succeeded)",
                    failures,
                    phase,
                    results.len()
                );
            }
            Err(e)
        }
        None => Ok(results),
    }
}
