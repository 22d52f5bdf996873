//! Nameserver extraction for a single interface
//!
//! Reads the static and DHCP-assigned nameserver values of an interface
//! and turns them into one ordered list. Read failures never escape: a
//! source that cannot be read contributes zero servers.

use crate::identifier::InterfaceIdentifier;
use crate::traits::{ConfigStore, NameServerKey};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Address that is never reported as an underlying nameserver
pub const LOOPBACK_NAMESERVER: &str = "127.0.0.1";

/// Split one raw configuration value into nameserver tokens
///
/// Commas and whitespace both separate entries. Empty tokens and the
/// loopback address are dropped; order is preserved.
///
/// ```
/// use underlay_core::nameservers::split_nameservers;
///
/// let servers: Vec<&str> = split_nameservers("1.1.1.1,127.0.0.1, 8.8.8.8").collect();
/// assert_eq!(servers, ["1.1.1.1", "8.8.8.8"]);
/// ```
pub fn split_nameservers(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty() && *token != LOOPBACK_NAMESERVER)
}

/// Reads the ordered nameserver list of an interface
#[derive(Clone)]
pub struct DnsConfigReader {
    store: Arc<dyn ConfigStore>,
}

impl DnsConfigReader {
    /// Create a reader backed by the given configuration store
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Read all nameservers configured on an interface
    ///
    /// Static entries come first, then DHCP-assigned ones. No
    /// deduplication is performed. An empty list is a valid result.
    pub fn read(&self, interface: &InterfaceIdentifier) -> Vec<String> {
        let mut servers = Vec::with_capacity(4);

        for key in NameServerKey::ORDERED {
            match self.store.get_string(interface, key) {
                Ok(Some(raw)) => {
                    servers.extend(split_nameservers(&raw).map(str::to_owned));
                }
                Ok(None) => {
                    debug!("No {} value for interface {}", key, interface);
                }
                Err(e) => {
                    warn!("Failed to read {} for interface {}: {}", key, interface, e);
                }
            }
        }

        servers
    }

    /// First configured nameserver, or an empty string
    pub fn first(&self, interface: &InterfaceIdentifier) -> String {
        self.read(interface).into_iter().next().unwrap_or_default()
    }
}

impl fmt::Debug for DnsConfigReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsConfigReader").finish_non_exhaustive()
    }
}
