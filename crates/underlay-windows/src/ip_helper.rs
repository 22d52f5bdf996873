//! IP Helper bindings
//!
//! Default-interface lookup, route-change notifications and index → GUID
//! translation on top of `iphlpapi`.

use std::ffi::c_void;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace, warn};
use underlay_core::traits::{
    AddressScope, ChangeSink, GuidResolver, InterfaceChange, InterfaceIndex, NetworkChangeSource,
};
use underlay_core::{Error, InterfaceGuid, Result};
use windows_sys::Win32::Foundation::{HANDLE, NO_ERROR};
use windows_sys::Win32::NetworkManagement::IpHelper::{
    CancelMibChangeNotify2, ConvertInterfaceIndexToLuid, ConvertInterfaceLuidToGuid,
    GetBestInterfaceEx, MIB_IPFORWARD_ROW2, MIB_NOTIFICATION_TYPE, NotifyRouteChange2,
};
use windows_sys::Win32::NetworkManagement::Ndis::NET_LUID_LH;
use windows_sys::Win32::Networking::WinSock::{
    AF_INET, AF_INET6, AF_UNSPEC, SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6,
};
use windows_sys::core::GUID;

/// `sockaddr_in` for an IPv4 destination, port 0
fn sockaddr_v4(ip: Ipv4Addr) -> SOCKADDR_IN {
    // SAFETY: all-zero is a valid SOCKADDR_IN
    let mut addr: SOCKADDR_IN = unsafe { mem::zeroed() };
    addr.sin_family = AF_INET;
    addr.sin_addr.S_un.S_addr = u32::from_ne_bytes(ip.octets());
    addr
}

/// `sockaddr_in6` for an IPv6 destination, port 0
fn sockaddr_v6(ip: Ipv6Addr) -> SOCKADDR_IN6 {
    // SAFETY: all-zero is a valid SOCKADDR_IN6
    let mut addr: SOCKADDR_IN6 = unsafe { mem::zeroed() };
    addr.sin6_family = AF_INET6;
    addr.sin6_addr.u.Byte = ip.octets();
    addr
}

/// Index of the interface used to reach the unspecified address of `scope`
fn best_interface(scope: AddressScope) -> Option<InterfaceIndex> {
    let mut index = 0u32;
    let status = match scope.unspecified() {
        IpAddr::V4(ip) => {
            let addr = sockaddr_v4(ip);
            // SAFETY: addr outlives the call and starts with a SOCKADDR header
            unsafe { GetBestInterfaceEx(&addr as *const SOCKADDR_IN as *const SOCKADDR, &mut index) }
        }
        IpAddr::V6(ip) => {
            let addr = sockaddr_v6(ip);
            // SAFETY: as above
            unsafe { GetBestInterfaceEx(&addr as *const SOCKADDR_IN6 as *const SOCKADDR, &mut index) }
        }
    };

    if status != NO_ERROR {
        trace!("GetBestInterfaceEx({}) failed with {}", scope, status);
        return None;
    }
    Some(InterfaceIndex(index))
}

/// State shared with the OS callback thread
struct Shared {
    scope: AddressScope,
    last_index: AtomicU32,
    sinks: Mutex<Vec<Arc<dyn ChangeSink>>>,
}

impl Shared {
    /// Called for every route change; forwards default-interface changes
    fn route_changed(&self) {
        let current = best_interface(self.scope);
        let raw = current.map_or(0, InterfaceIndex::get);
        if self.last_index.swap(raw, Ordering::SeqCst) == raw {
            return;
        }

        debug!("Default {} interface changed to {:?}", self.scope, current);
        let sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let change = InterfaceChange::new(current);
        for sink in sinks {
            sink.on_change(&change);
        }
    }
}

struct Registration(HANDLE);

// SAFETY: the notification handle is an opaque token only passed back to
// CancelMibChangeNotify2, which may be called from any thread.
unsafe impl Send for Registration {}

unsafe extern "system" fn on_route_change(
    context: *const c_void,
    _row: *const MIB_IPFORWARD_ROW2,
    _kind: MIB_NOTIFICATION_TYPE,
) {
    if context.is_null() {
        return;
    }
    // SAFETY: context is the `Shared` kept alive by the owning source until
    // CancelMibChangeNotify2 has returned
    let shared = unsafe { &*(context as *const Shared) };
    shared.route_changed();
}

/// Default-interface monitor backed by `NotifyRouteChange2`
pub struct WindowsNetworkSource {
    shared: Arc<Shared>,
    registration: Mutex<Option<Registration>>,
}

impl WindowsNetworkSource {
    pub fn new(scope: AddressScope) -> Self {
        Self {
            shared: Arc::new(Shared {
                scope,
                last_index: AtomicU32::new(0),
                sinks: Mutex::new(Vec::new()),
            }),
            registration: Mutex::new(None),
        }
    }
}

impl NetworkChangeSource for WindowsNetworkSource {
    fn default_interface_index(&self, scope: AddressScope) -> Option<InterfaceIndex> {
        best_interface(scope)
    }

    fn register_callback(&self, sink: Arc<dyn ChangeSink>) {
        self.shared
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    fn start(&self) -> Result<()> {
        let mut registration = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if registration.is_some() {
            return Ok(());
        }

        let mut handle: HANDLE = std::ptr::null_mut();
        let context = Arc::as_ptr(&self.shared) as *const c_void;
        // SAFETY: context stays valid until the registration is cancelled in
        // stop(), which also runs on drop
        let status =
            unsafe { NotifyRouteChange2(AF_UNSPEC, Some(on_route_change), context, 0, &mut handle) };
        if status != NO_ERROR {
            return Err(Error::initialization(format!(
                "NotifyRouteChange2 failed with error {status}"
            )));
        }

        *registration = Some(Registration(handle));
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let registration = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let result = match registration {
            // SAFETY: handle came from NotifyRouteChange2 and is cancelled once;
            // the call waits for in-flight callbacks
            Some(Registration(handle)) => match unsafe { CancelMibChangeNotify2(handle) } {
                NO_ERROR => Ok(()),
                status => Err(Error::Other(format!(
                    "CancelMibChangeNotify2 failed with error {status}"
                ))),
            },
            None => Ok(()),
        };

        self.shared
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        result
    }

    fn refresh_interfaces(&self) -> Result<()> {
        let current = best_interface(self.shared.scope);
        self.shared
            .last_index
            .store(current.map_or(0, InterfaceIndex::get), Ordering::SeqCst);
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "windows-iphlp"
    }
}

impl Drop for WindowsNetworkSource {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to cancel route change notification: {}", e);
        }
    }
}

/// Index → GUID via the interface LUID
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsGuidResolver;

impl GuidResolver for WindowsGuidResolver {
    fn guid_for_index(&self, index: InterfaceIndex) -> Result<InterfaceGuid> {
        // SAFETY: plain-data out parameters
        let mut luid: NET_LUID_LH = unsafe { mem::zeroed() };
        let mut guid: GUID = unsafe { mem::zeroed() };

        // SAFETY: pointers reference live locals
        let status = unsafe { ConvertInterfaceIndexToLuid(index.get(), &mut luid) };
        if status != NO_ERROR {
            return Err(Error::lookup(
                index.get(),
                format!("ConvertInterfaceIndexToLuid failed with error {status}"),
            ));
        }

        // SAFETY: as above
        let status = unsafe { ConvertInterfaceLuidToGuid(&luid, &mut guid) };
        if status != NO_ERROR {
            return Err(Error::lookup(
                index.get(),
                format!("ConvertInterfaceLuidToGuid failed with error {status}"),
            ));
        }

        Ok(InterfaceGuid::from_fields(
            guid.data1, guid.data2, guid.data3, guid.data4,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_destination_is_the_unspecified_address() {
        let IpAddr::V4(ip) = AddressScope::V4.unspecified() else {
            panic!("v4 scope must yield an IPv4 address");
        };
        let addr = sockaddr_v4(ip);

        assert_eq!(addr.sin_family, AF_INET);
        assert_eq!(addr.sin_port, 0);
        // SAFETY: S_addr is the field written above
        assert_eq!(unsafe { addr.sin_addr.S_un.S_addr }, 0);
    }

    #[test]
    fn v6_destination_is_the_unspecified_address() {
        let IpAddr::V6(ip) = AddressScope::V6.unspecified() else {
            panic!("v6 scope must yield an IPv6 address");
        };
        let addr = sockaddr_v6(ip);

        assert_eq!(addr.sin6_family, AF_INET6);
        // SAFETY: Byte is the field written above
        assert_eq!(unsafe { addr.sin6_addr.u.Byte }, [0u8; 16]);
    }
}
