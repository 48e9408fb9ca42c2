// # ddns-core
//
// Core library for the Netlify dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **PublicIpSource**: Trait for discovering the public IPv4/IPv6 address
// - **DnsProvider**: Trait for listing, deleting and creating DNS records
// - **RecordSynchronizer**: Delete-then-create pass over the target hostnames
// - **DdnsEngine**: Update loop with interval scheduling and backoff
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Explicit Values**: The provider client is built once and passed in, no globals
// 3. **Barrier Ordering**: All deletions of a cycle finish before any creation starts
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Engine-Owned Retry**: Sources and providers never retry on their own

pub mod traits;
pub mod engine;
pub mod sync;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{PublicIpSource, DnsProvider, DiscoveredAddresses, IpVersion};
pub use engine::{DdnsEngine, EngineEvent};
pub use sync::{RecordSynchronizer, SyncReport};
pub use config::{DdnsConfig, EngineConfig, ProviderConfig};
pub use error::{Error, Result};
