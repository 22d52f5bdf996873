//! Capability traits for the underlying DNS monitor
//!
//! These are the seams to the operating system. Everything behind them is
//! platform-specific; everything in front of them is testable with fakes.
//!
//! - [`NetworkChangeSource`]: Default interface lookup and change callbacks
//! - [`GuidResolver`]: Interface index → GUID system call
//! - [`ConfigStore`]: Per-interface nameserver settings

pub mod config_store;
pub mod guid_resolver;
pub mod network_source;

pub use config_store::{ConfigStore, NameServerKey};
pub use guid_resolver::GuidResolver;
pub use network_source::{
    AddressScope, ChangeSink, InterfaceChange, InterfaceIndex, NetworkChangeSource,
};
