//! Test doubles and common utilities for monitor contract tests
//!
//! These fakes stand in for the OS: a scripted default-interface source,
//! a table-driven GUID resolver and an in-memory nameserver store.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use underlay_core::error::Result;
use underlay_core::traits::{
    AddressScope, ChangeSink, ConfigStore, GuidResolver, InterfaceChange, InterfaceIndex,
    NameServerKey, NetworkChangeSource,
};
use underlay_core::{
    ChangeDetector, DnsChange, Error, InterfaceGuid, InterfaceIdentifier, MonitorEvent,
    MonitorState,
};

/// GUID used for interface index `n`
pub fn guid(n: u8) -> InterfaceGuid {
    InterfaceGuid::from_fields(
        0x1000_0000 + n as u32,
        0x2000 + n as u16,
        0x3000 + n as u16,
        [0xa0, 0xb0, 0xc0, 0xd0, 0xe0, 0xf0, 0x00, n],
    )
}

/// Canonical identifier of interface index `n`
pub fn identifier(n: u8) -> InterfaceIdentifier {
    guid(n).to_identifier()
}

/// A default-interface source driven by the test
pub struct ScriptedNetworkSource {
    default_index: AtomicU32,
    sinks: Mutex<Vec<Arc<dyn ChangeSink>>>,
    started: AtomicBool,
    fail_start: AtomicBool,
    fail_refresh: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl ScriptedNetworkSource {
    /// Create a source whose default interface is `index` (0 = none)
    pub fn new(index: u32) -> Arc<Self> {
        Arc::new(Self {
            default_index: AtomicU32::new(index),
            sinks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            fail_refresh: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        })
    }

    /// A source whose `start()` fails as an unavailable OS monitor would
    pub fn unavailable() -> Arc<Self> {
        let source = Self::new(1);
        source.fail_start.store(true, Ordering::SeqCst);
        source
    }

    /// Make `refresh_interfaces()` fail
    pub fn fail_refresh(&self) {
        self.fail_refresh.store(true, Ordering::SeqCst);
    }

    /// Switch the default interface without notifying anyone
    pub fn set_default_silently(&self, index: u32) {
        self.default_index.store(index, Ordering::SeqCst);
    }

    /// Switch the default interface and deliver the change to every sink
    pub fn switch_default(&self, index: u32) {
        self.set_default_silently(index);
        self.fire(InterfaceChange::new(Some(InterfaceIndex(index))));
    }

    /// Deliver a change notification to every registered sink
    pub fn fire(&self, change: InterfaceChange) {
        if !self.started.load(Ordering::SeqCst) {
            return;
        }
        let sinks: Vec<Arc<dyn ChangeSink>> = self.sinks.lock().unwrap().clone();
        for sink in sinks {
            sink.on_change(&change);
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of default-interface lookups (one per cycle)
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

impl NetworkChangeSource for ScriptedNetworkSource {
    fn default_interface_index(&self, _scope: AddressScope) -> Option<InterfaceIndex> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        match self.default_index.load(Ordering::SeqCst) {
            0 => None,
            index => Some(InterfaceIndex(index)),
        }
    }

    fn register_callback(&self, sink: Arc<dyn ChangeSink>) {
        self.sinks.lock().unwrap().push(sink);
    }

    fn start(&self) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::initialization("default interface monitor unavailable"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
        self.sinks.lock().unwrap().clear();
        Ok(())
    }

    fn refresh_interfaces(&self) -> Result<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(Error::Other("interface enumeration failed".to_string()));
        }
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// GUID resolver backed by a table; unknown indices fail the lookup
pub struct TableGuidResolver {
    known: Mutex<HashMap<u32, InterfaceGuid>>,
}

impl TableGuidResolver {
    /// Resolver that knows interfaces `1..=count`
    pub fn with_interfaces(count: u8) -> Arc<Self> {
        let known = (1..=count).map(|n| (n as u32, guid(n))).collect();
        Arc::new(Self {
            known: Mutex::new(known),
        })
    }

    /// Forget an interface, as if it was removed mid-lookup
    pub fn remove(&self, index: u32) {
        self.known.lock().unwrap().remove(&index);
    }

    /// Register a specific GUID for an index
    pub fn insert(&self, index: u32, guid: InterfaceGuid) {
        self.known.lock().unwrap().insert(index, guid);
    }
}

impl GuidResolver for TableGuidResolver {
    fn guid_for_index(&self, index: InterfaceIndex) -> Result<InterfaceGuid> {
        self.known
            .lock()
            .unwrap()
            .get(&index.get())
            .copied()
            .ok_or_else(|| Error::lookup(index.get(), "element not found"))
    }
}

/// In-memory per-interface nameserver store
pub struct MemoryConfigStore {
    values: Mutex<HashMap<(InterfaceIdentifier, NameServerKey), String>>,
    unreadable: Mutex<Vec<(InterfaceIdentifier, NameServerKey)>>,
    reads: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(HashMap::new()),
            unreadable: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
        })
    }

    /// Set a raw value
    pub fn set(&self, interface: &InterfaceIdentifier, key: NameServerKey, raw: &str) {
        self.values
            .lock()
            .unwrap()
            .insert((interface.clone(), key), raw.to_string());
    }

    /// Set the static nameserver value of interface `n`
    pub fn set_static(&self, n: u8, raw: &str) {
        self.set(&identifier(n), NameServerKey::Static, raw);
    }

    /// Set the DHCP nameserver value of interface `n`
    pub fn set_dhcp(&self, n: u8, raw: &str) {
        self.set(&identifier(n), NameServerKey::Dhcp, raw);
    }

    /// Remove every value of interface `n`
    pub fn clear(&self, n: u8) {
        let id = identifier(n);
        self.values.lock().unwrap().retain(|(iface, _), _| *iface != id);
    }

    /// Make one source of interface `n` fail to read
    pub fn make_unreadable(&self, n: u8, key: NameServerKey) {
        self.unreadable.lock().unwrap().push((identifier(n), key));
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_string(
        &self,
        interface: &InterfaceIdentifier,
        key: NameServerKey,
    ) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self
            .unreadable
            .lock()
            .unwrap()
            .contains(&(interface.clone(), key))
        {
            return Err(Error::config_read(
                interface.as_str(),
                key.value_name(),
                "access is denied",
            ));
        }
        Ok(self
            .values
            .lock()
            .unwrap()
            .get(&(interface.clone(), key))
            .cloned())
    }
}

/// Store whose static value advances through a script on every read
pub struct SequencedConfigStore {
    script: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    read_delay: std::time::Duration,
}

impl SequencedConfigStore {
    pub fn new(values: &[&str], read_delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(values.iter().map(|v| v.to_string()).collect()),
            last: Mutex::new(String::new()),
            read_delay,
        })
    }
}

impl ConfigStore for SequencedConfigStore {
    fn get_string(
        &self,
        _interface: &InterfaceIdentifier,
        key: NameServerKey,
    ) -> Result<Option<String>> {
        if key != NameServerKey::Static {
            return Ok(None);
        }
        let next = self.script.lock().unwrap().pop_front();
        std::thread::sleep(self.read_delay);
        let mut last = self.last.lock().unwrap();
        if let Some(value) = next {
            *last = value;
        }
        Ok(Some(last.clone()))
    }
}

/// A sink that only counts notifications
#[derive(Default)]
pub struct CountingSink {
    calls: AtomicUsize,
}

impl CountingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChangeSink for CountingSink {
    fn on_change(&self, _change: &InterfaceChange) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a detector over the given fakes with a fresh state
pub fn detector_over(
    source: Arc<ScriptedNetworkSource>,
    resolver: Arc<dyn GuidResolver>,
    store: Arc<dyn ConfigStore>,
) -> (Arc<ChangeDetector>, MonitorState, mpsc::Receiver<MonitorEvent>) {
    let state = MonitorState::new();
    let (tx, rx) = mpsc::channel(256);
    let detector = Arc::new(ChangeDetector::new(
        source,
        resolver,
        store,
        state.clone(),
        AddressScope::V4,
        tx,
    ));
    (detector, state, rx)
}

/// Drain every DNS change currently queued on an event receiver
pub fn drain_changes(rx: &mut mpsc::Receiver<MonitorEvent>) -> Vec<DnsChange> {
    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let MonitorEvent::DnsChanged(change) = event {
            changes.push(change);
        }
    }
    changes
}
