// # Monitor State
//
// Process-wide holder of the last known default interface and its
// underlying DNS server.
//
// ## Ownership
//
// - Created once by the host, before the monitor starts, with empty values
// - Written only by `ChangeDetector`
// - Read by any number of `UnderlyingDns` handles
// - Never persisted; lost on process exit
//
// A failed monitor start leaves the state empty, which consumers must
// treat as "no DNS discovered yet".

use crate::identifier::InterfaceIdentifier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::watch;
use tokio_stream::Stream;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Default)]
struct StateInner {
    interface: Option<InterfaceIdentifier>,
    dns: String,
    changed_at: Option<DateTime<Utc>>,
    changes: u64,
}

/// Shared monitor state
///
/// Cloning is cheap and yields another reference to the same state.
#[derive(Debug, Clone)]
pub struct MonitorState {
    inner: Arc<RwLock<StateInner>>,
    dns_tx: Arc<watch::Sender<String>>,
    cycle: Arc<Mutex<()>>,
}

impl MonitorState {
    /// Create an empty state
    pub fn new() -> Self {
        let (dns_tx, _) = watch::channel(String::new());
        Self {
            inner: Arc::new(RwLock::new(StateInner::default())),
            dns_tx: Arc::new(dns_tx),
            cycle: Arc::new(Mutex::new(())),
        }
    }

    /// Current interface identifier and DNS value
    pub fn get(&self) -> (Option<InterfaceIdentifier>, String) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (guard.interface.clone(), guard.dns.clone())
    }

    /// Current DNS value (possibly empty)
    pub fn dns(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dns
            .clone()
    }

    /// Serialize a read-compare-write cycle against this state
    ///
    /// Shared by every clone, so detectors built over the same state
    /// never interleave their cycles.
    pub(crate) fn lock_cycle(&self) -> MutexGuard<'_, ()> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the interface and DNS value
    ///
    /// Only the change detector calls this, while holding its cycle lock.
    pub(crate) fn set(&self, interface: InterfaceIdentifier, dns: String) {
        {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            guard.interface = Some(interface);
            guard.dns = dns.clone();
            guard.changed_at = Some(Utc::now());
            guard.changes += 1;
        }
        self.dns_tx.send_replace(dns);
    }

    /// Read-only handle for consumers
    ///
    /// `override_dns`, when set to a non-empty value, replaces the
    /// discovered value in [`UnderlyingDns::effective`].
    pub fn handle(&self, override_dns: Option<String>) -> UnderlyingDns {
        UnderlyingDns {
            state: self.clone(),
            override_dns: override_dns.filter(|dns| !dns.trim().is_empty()),
        }
    }

    fn snapshot_parts(&self) -> (Option<InterfaceIdentifier>, String, Option<DateTime<Utc>>, u64) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (
            guard.interface.clone(),
            guard.dns.clone(),
            guard.changed_at,
            guard.changes,
        )
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the monitor state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    /// Default interface the DNS value was read from
    pub interface: Option<InterfaceIdentifier>,
    /// Discovered underlying DNS (empty if none)
    pub dns: String,
    /// Value consumers should use, after applying the override
    pub effective: String,
    /// Configured override, if any
    pub override_dns: Option<String>,
    /// When the DNS value last changed
    pub changed_at: Option<DateTime<Utc>>,
    /// Number of recorded changes since start
    pub changes: u64,
}

/// Read-only accessor for the current underlying DNS
#[derive(Debug, Clone)]
pub struct UnderlyingDns {
    state: MonitorState,
    override_dns: Option<String>,
}

impl UnderlyingDns {
    /// Discovered DNS server of the default interface, or empty
    pub fn current(&self) -> String {
        self.state.dns()
    }

    /// Interface the current value was read from
    pub fn interface(&self) -> Option<InterfaceIdentifier> {
        self.state.get().0
    }

    /// The override if configured, otherwise the discovered value
    pub fn effective(&self) -> String {
        match &self.override_dns {
            Some(dns) => dns.clone(),
            None => self.current(),
        }
    }

    /// Configured override, if any
    pub fn override_dns(&self) -> Option<&str> {
        self.override_dns.as_deref()
    }

    /// Full point-in-time view
    pub fn snapshot(&self) -> StateSnapshot {
        let (interface, dns, changed_at, changes) = self.state.snapshot_parts();
        let effective = self.override_dns.clone().unwrap_or_else(|| dns.clone());
        StateSnapshot {
            interface,
            dns,
            effective,
            override_dns: self.override_dns.clone(),
            changed_at,
            changes,
        }
    }

    /// Stream of discovered DNS values
    ///
    /// Yields the current value first, then every subsequent change.
    /// Intermediate values may be skipped if the consumer lags.
    pub fn changes(&self) -> Pin<Box<dyn Stream<Item = String> + Send + 'static>> {
        Box::pin(WatchStream::new(self.state.dns_tx.subscribe()))
    }
}
