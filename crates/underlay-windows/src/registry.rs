//! Registry-backed nameserver store
//!
//! Windows keeps per-interface TCP/IP parameters under
//! `HKLM\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces\{guid}`
//! (`Tcpip6` for IPv6). The `NameServer` value holds statically configured
//! servers and `DhcpNameServer` the ones learned from DHCP.

use underlay_core::InterfaceIdentifier;
use underlay_core::traits::AddressScope;

const TCPIP_INTERFACES: &str = r"SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces";
const TCPIP6_INTERFACES: &str = r"SYSTEM\CurrentControlSet\Services\Tcpip6\Parameters\Interfaces";

/// Registry key (relative to HKLM) holding an interface's parameters
pub fn interface_key_path(scope: AddressScope, interface: &InterfaceIdentifier) -> String {
    let base = match scope {
        AddressScope::V4 => TCPIP_INTERFACES,
        AddressScope::V6 => TCPIP6_INTERFACES,
    };
    format!(r"{base}\{interface}")
}

#[cfg(windows)]
pub use store::WindowsRegistryStore;

#[cfg(windows)]
mod store {
    use super::interface_key_path;
    use std::io;
    use tracing::trace;
    use underlay_core::traits::{AddressScope, ConfigStore, NameServerKey};
    use underlay_core::{Error, InterfaceIdentifier, Result};
    use winreg::RegKey;
    use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_QUERY_VALUE};

    /// Reads nameserver values from `HKEY_LOCAL_MACHINE`
    #[derive(Debug, Clone, Copy)]
    pub struct WindowsRegistryStore {
        scope: AddressScope,
    }

    impl WindowsRegistryStore {
        pub fn new(scope: AddressScope) -> Self {
            Self { scope }
        }
    }

    impl ConfigStore for WindowsRegistryStore {
        fn get_string(
            &self,
            interface: &InterfaceIdentifier,
            key: NameServerKey,
        ) -> Result<Option<String>> {
            let path = interface_key_path(self.scope, interface);
            let read_error =
                |e: io::Error| Error::config_read(interface.as_str(), key.value_name(), e.to_string());

            let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
            let params = match hklm.open_subkey_with_flags(&path, KEY_QUERY_VALUE) {
                Ok(params) => params,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!("No parameters key for interface {}", interface);
                    return Ok(None);
                }
                Err(e) => return Err(read_error(e)),
            };

            match params.get_value::<String, _>(key.value_name()) {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(read_error(e)),
            }
        }
    }
}
