// # underlay-core
//
// Core library for tracking the DNS servers configured on the network
// interface that currently carries default-route traffic.
//
// ## Architecture Overview
//
// - **NetworkChangeSource**: Trait for the OS default-interface monitor
// - **GuidResolver**: Trait for the index → GUID system call
// - **ConfigStore**: Trait for per-interface nameserver settings
// - **IdentifierTranslator**: GUID bytes → canonical `{...}` identifier
// - **DnsConfigReader**: Ordered, filtered nameserver list of an interface
// - **MonitorState**: Last known default interface and its underlying DNS
// - **ChangeDetector**: One check cycle; the only writer of MonitorState
// - **UnderlyingDnsMonitor**: Event subscription plus polling fallback
//
// ## Design Principles
//
// 1. **Best Effort**: Every failure degrades to "no new information"
// 2. **Platform-Free Core**: OS access lives behind the capability traits
// 3. **Single Writer**: Check cycles serialize on one lock
// 4. **Idempotency**: An unchanged value produces no side effect

pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod identifier;
pub mod monitor;
pub mod nameservers;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::MonitorConfig;
pub use detector::{ChangeDetector, CycleOutcome, CycleTrigger, SkipReason};
pub use error::{Error, Result};
pub use events::{DnsChange, MonitorEvent};
pub use identifier::{IdentifierTranslator, InterfaceGuid, InterfaceIdentifier};
pub use monitor::UnderlyingDnsMonitor;
pub use nameservers::DnsConfigReader;
pub use state::{MonitorState, StateSnapshot, UnderlyingDns};
pub use traits::{ConfigStore, GuidResolver, NetworkChangeSource};
