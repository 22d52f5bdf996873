// # Config Store Trait
//
// Defines the per-interface key/value store that physically holds DNS
// settings (the TCP/IP interface registry on Windows).
//
// Only two keys are ever read, see [`NameServerKey`].

use crate::identifier::InterfaceIdentifier;
use std::fmt;

/// The recognized nameserver configuration keys, in read order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameServerKey {
    /// Statically configured nameservers
    Static,
    /// Nameservers assigned by DHCP
    Dhcp,
}

impl NameServerKey {
    /// Keys in the order their servers appear in a nameserver list
    pub const ORDERED: [NameServerKey; 2] = [NameServerKey::Static, NameServerKey::Dhcp];

    /// Value name inside the interface's configuration key
    pub fn value_name(self) -> &'static str {
        match self {
            NameServerKey::Static => "NameServer",
            NameServerKey::Dhcp => "DhcpNameServer",
        }
    }
}

impl fmt::Display for NameServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value_name())
    }
}

/// Trait for per-interface configuration reads
///
/// # Returns
///
/// - `Ok(Some(value))`: The raw string value
/// - `Ok(None)`: The interface key or the value is absent
/// - `Err(Error::ConfigRead)`: The store could not be read
pub trait ConfigStore: Send + Sync {
    /// Read a single raw string value for an interface
    fn get_string(
        &self,
        interface: &InterfaceIdentifier,
        key: NameServerKey,
    ) -> Result<Option<String>, crate::Error>;
}
