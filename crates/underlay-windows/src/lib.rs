// # Windows Platform Adapter
//
// This crate provides the Windows implementations of the three
// capabilities `underlay-core` needs:
//
// - `NetworkChangeSource`: IP Helper route-change notifications plus
//   `GetBestInterfaceEx` for the current default interface
// - `GuidResolver`: `ConvertInterfaceIndexToLuid` → `ConvertInterfaceLuidToGuid`
// - `ConfigStore`: per-interface TCP/IP parameters in the registry
//
// ## Platform Support
//
// Everything except registry path construction only compiles on Windows.
// On other platforms `platform()` fails with an initialization error so
// the host can keep running with an empty underlying DNS value.

#[cfg(windows)]
mod ip_helper;
pub mod registry;

#[cfg(windows)]
pub use ip_helper::{WindowsGuidResolver, WindowsNetworkSource};
#[cfg(windows)]
pub use registry::WindowsRegistryStore;

use std::sync::Arc;
use underlay_core::traits::{AddressScope, ConfigStore, GuidResolver, NetworkChangeSource};
use underlay_core::Result;

/// The three platform capabilities, ready to hand to the monitor
pub type PlatformCapabilities = (
    Arc<dyn NetworkChangeSource>,
    Arc<dyn GuidResolver>,
    Arc<dyn ConfigStore>,
);

/// Build the Windows capabilities for the given address scope
#[cfg(windows)]
pub fn platform(scope: AddressScope) -> Result<PlatformCapabilities> {
    let source = WindowsNetworkSource::new(scope);
    tracing::debug!("Using Windows IP Helper source for {} default route", scope);

    Ok((
        Arc::new(source),
        Arc::new(WindowsGuidResolver),
        Arc::new(WindowsRegistryStore::new(scope)),
    ))
}

/// Build the Windows capabilities for the given address scope
#[cfg(not(windows))]
pub fn platform(scope: AddressScope) -> Result<PlatformCapabilities> {
    Err(underlay_core::Error::initialization(format!(
        "underlying DNS monitoring ({scope}) is only supported on Windows"
    )))
}
