//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record how the core uses
//! its collaborators, without any network access.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, NewRecord, PublicIpSource, RecordType};
use std::collections::{HashMap, VecDeque};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An IP source that replays scripted results, then repeats a fixed address
pub struct ScriptedIpSource {
    ipv4: Ipv4Addr,
    ipv6: Ipv6Addr,
    /// Results returned by `ipv4()` before falling back to `ipv4`
    v4_script: Mutex<VecDeque<Result<Ipv4Addr>>>,
    /// Results returned by `ipv6()` before falling back to `ipv6`
    v6_script: Mutex<VecDeque<Result<Ipv6Addr>>>,
    v4_calls: Arc<AtomicUsize>,
    v6_calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(ipv4: Ipv4Addr, ipv6: Ipv6Addr) -> Self {
        Self {
            ipv4,
            ipv6,
            v4_script: Mutex::new(VecDeque::new()),
            v6_script: Mutex::new(VecDeque::new()),
            v4_calls: Arc::new(AtomicUsize::new(0)),
            v6_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a result for the next `ipv4()` call
    pub fn then_v4(self, result: Result<Ipv4Addr>) -> Self {
        self.v4_script.lock().unwrap().push_back(result);
        self
    }

    /// Queue a result for the next `ipv6()` call
    pub fn then_v6(self, result: Result<Ipv6Addr>) -> Self {
        self.v6_script.lock().unwrap().push_back(result);
        self
    }

    /// Shared counter of `ipv4()` calls
    pub fn v4_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.v4_calls)
    }

    /// Shared counter of `ipv6()` calls
    pub fn v6_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.v6_calls)
    }
}

#[async_trait::async_trait]
impl PublicIpSource for ScriptedIpSource {
    async fn ipv4(&self) -> Result<Ipv4Addr> {
        self.v4_calls.fetch_add(1, Ordering::SeqCst);
        self.v4_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.ipv4))
    }

    async fn ipv6(&self) -> Result<Ipv6Addr> {
        self.v6_calls.fetch_add(1, Ordering::SeqCst);
        self.v6_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.ipv6))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// One provider call, in the order it completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    List,
    Delete { id: String, hostname: String },
    Create { hostname: String, record_type: RecordType, value: String, ttl: u32 },
}

/// An in-memory DNS provider that records every call
#[derive(Clone)]
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    ops: Arc<Mutex<Vec<Op>>>,
    next_id: Arc<AtomicUsize>,
    /// Fail `list_records` with this error (taken once)
    list_error: Arc<Mutex<Option<Error>>>,
    /// Record IDs whose deletion fails, after a delay (taken once)
    failing_deletes: Arc<Mutex<HashMap<String, (Duration, Error)>>>,
    /// Hostnames whose creation fails
    failing_creates: Arc<Mutex<Vec<String>>>,
    /// Artificial latency for delete calls
    delete_delay: Duration,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            ops: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
            list_error: Arc::new(Mutex::new(None)),
            failing_deletes: Arc::new(Mutex::new(HashMap::new())),
            failing_creates: Arc::new(Mutex::new(Vec::new())),
            delete_delay: Duration::ZERO,
        }
    }

    /// Seed an existing record
    pub fn with_record(self, hostname: &str, record_type: RecordType, value: &str) -> Self {
        let id = format!("seed-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records.lock().unwrap().push(DnsRecord {
            id,
            hostname: hostname.to_string(),
            record_type,
            value: value.to_string(),
            ttl: Some(3600),
            zone_id: Some("example_com".to_string()),
        });
        self
    }

    /// Slow down every delete call
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    /// Make the next `list_records` call fail
    pub fn fail_list_with(&self, error: Error) {
        *self.list_error.lock().unwrap() = Some(error);
    }

    /// Make deletion of a record ID fail
    pub fn fail_delete_of(&self, id: &str) {
        self.fail_delete_with(
            id,
            Error::provider("mock", format!("cannot delete {}", id)),
            Duration::ZERO,
        );
    }

    /// Make deletion of a record ID fail with `error` once `after` has passed
    pub fn fail_delete_with(&self, id: &str, error: Error, after: Duration) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(id.to_string(), (after, error));
    }

    /// Make creation at a hostname fail
    pub fn fail_create_of(&self, hostname: &str) {
        self.failing_creates.lock().unwrap().push(hostname.to_string());
    }

    /// Current record set, sorted for comparison
    pub fn records(&self) -> Vec<DnsRecord> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Current record contents without IDs, sorted
    pub fn contents(&self) -> Vec<(String, RecordType, String)> {
        let mut contents: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.hostname.clone(), r.record_type, r.value.clone()))
            .collect();
        contents.sort_by(|a, b| (&a.0, a.1.as_str(), &a.2).cmp(&(&b.0, b.1.as_str(), &b.2)));
        contents
    }

    /// Every call made so far
    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    /// Number of `list_records` calls
    pub fn list_calls(&self) -> usize {
        self.ops().iter().filter(|op| matches!(op, Op::List)).count()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        self.ops.lock().unwrap().push(Op::List);
        if let Some(error) = self.list_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn delete_record(&self, record: &DnsRecord) -> Result<()> {
        if !self.delete_delay.is_zero() {
            tokio::time::sleep(self.delete_delay).await;
        }

        let failure = self.failing_deletes.lock().unwrap().remove(&record.id);
        if let Some((after, error)) = failure {
            tokio::time::sleep(after).await;
            return Err(error);
        }

        self.records.lock().unwrap().retain(|r| r.id != record.id);
        self.ops.lock().unwrap().push(Op::Delete {
            id: record.id.clone(),
            hostname: record.hostname.clone(),
        });
        Ok(())
    }

    async fn create_record(&self, record: &NewRecord) -> Result<DnsRecord> {
        if self.failing_creates.lock().unwrap().contains(&record.hostname) {
            return Err(Error::provider("mock", format!("cannot create {}", record.hostname)));
        }

        let created = DnsRecord {
            id: format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            hostname: record.hostname.clone(),
            record_type: record.record_type,
            value: record.value.clone(),
            ttl: Some(record.ttl),
            zone_id: Some("example_com".to_string()),
        };

        self.records.lock().unwrap().push(created.clone());
        self.ops.lock().unwrap().push(Op::Create {
            hostname: record.hostname.clone(),
            record_type: record.record_type,
            value: record.value.clone(),
            ttl: record.ttl,
        });
        Ok(created)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(record: &str) -> ddns_core::config::DdnsConfig {
    ddns_core::config::DdnsConfig::new("example.com", "test-token").with_record(record)
}

/// Public IPv4 used across tests
pub fn test_ipv4() -> Ipv4Addr {
    Ipv4Addr::new(203, 0, 113, 5)
}

/// Public IPv6 used across tests
pub fn test_ipv6() -> Ipv6Addr {
    "2001:db8::5".parse().unwrap()
}
