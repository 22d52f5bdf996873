// # Network Change Source Trait
//
// Defines the interface to the OS mechanism that knows which interface
// currently carries default-route traffic and reports when that changes.
//
// ## Implementations
//
// - Windows IP Helper: `underlay-windows` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use underlay_core::traits::{AddressScope, NetworkChangeSource};
//
// let source = /* NetworkChangeSource implementation */;
// source.register_callback(detector.clone());
// source.start()?;
// source.refresh_interfaces()?;
//
// let index = source.default_interface_index(AddressScope::V4);
// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Opaque OS handle for a network interface instance
///
/// Not stable across reboots; only meaningful to the OS that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceIndex(pub u32);

impl InterfaceIndex {
    /// Raw OS value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InterfaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for InterfaceIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Destination-address scope used to pick the default interface
///
/// The monitor always asks for the unspecified ("any") address of the
/// configured family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressScope {
    /// `0.0.0.0`
    #[default]
    V4,
    /// `::`
    V6,
}

impl AddressScope {
    /// The unspecified address of this family
    pub fn unspecified(self) -> IpAddr {
        match self {
            AddressScope::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            AddressScope::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }
}

impl fmt::Display for AddressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressScope::V4 => f.write_str("v4"),
            AddressScope::V6 => f.write_str("v6"),
        }
    }
}

impl std::str::FromStr for AddressScope {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4" | "ipv4" | "4" => Ok(AddressScope::V4),
            "v6" | "ipv6" | "6" => Ok(AddressScope::V6),
            other => Err(crate::Error::config(format!(
                "unknown address scope '{other}', expected v4 or v6"
            ))),
        }
    }
}

/// A default-interface change reported by a [`NetworkChangeSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceChange {
    /// The new default interface, if the OS reported one
    pub index: Option<InterfaceIndex>,
}

impl InterfaceChange {
    /// A change event carrying the new default interface
    pub fn new(index: Option<InterfaceIndex>) -> Self {
        Self { index }
    }
}

/// Callback capability registered on a [`NetworkChangeSource`]
///
/// Sinks are independent of each other: a source calls every registered
/// sink for every change, in no particular order, possibly from an OS
/// thread. A slow sink must not be able to starve another one, so
/// implementations keep `on_change` short.
pub trait ChangeSink: Send + Sync {
    /// Called on every detected default-interface change
    fn on_change(&self, change: &InterfaceChange);
}

/// Trait for the external default-interface monitor
///
/// # Thread Safety
///
/// Callbacks may fire on arbitrary OS threads, concurrently with calls to
/// [`default_interface_index`](NetworkChangeSource::default_interface_index)
/// from the polling task.
///
/// # Lifecycle
///
/// `register_callback` is called before `start`. `stop` is idempotent,
/// drops every registered sink, and guarantees no sink is invoked after it
/// returns.
pub trait NetworkChangeSource: Send + Sync {
    /// Current default interface for the given destination scope
    ///
    /// Returns `None` when no interface carries default-route traffic.
    fn default_interface_index(&self, scope: AddressScope) -> Option<InterfaceIndex>;

    /// Register a sink that is invoked on every default-interface change
    fn register_callback(&self, sink: Arc<dyn ChangeSink>);

    /// Start delivering change notifications
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Notifications are flowing
    /// - `Err(Error::Initialization)`: The OS monitor is unavailable
    fn start(&self) -> Result<(), crate::Error>;

    /// Stop delivering change notifications
    fn stop(&self) -> Result<(), crate::Error>;

    /// Re-enumerate interfaces so the first lookups see fresh data
    fn refresh_interfaces(&self) -> Result<(), crate::Error> {
        Ok(())
    }

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_common_spellings() {
        assert_eq!("v4".parse::<AddressScope>().unwrap(), AddressScope::V4);
        assert_eq!("IPv6".parse::<AddressScope>().unwrap(), AddressScope::V6);
        assert!("v5".parse::<AddressScope>().is_err());
    }

    #[test]
    fn scope_uses_unspecified_address() {
        assert!(AddressScope::V4.unspecified().is_unspecified());
        assert!(AddressScope::V6.unspecified().is_ipv6());
    }
}
