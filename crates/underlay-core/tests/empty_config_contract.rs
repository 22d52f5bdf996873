//! Architectural Contract Test: Missing and Unusable Nameserver Settings
//!
//! This test verifies how the monitor treats interfaces that have no
//! usable nameserver configured.
//!
//! Constraints verified:
//! - Both sources absent yields the empty DNS value without error
//! - Loopback and blank tokens never become the underlying DNS
//! - An unreadable source does not abort the cycle
//! - Moving to an interface without DNS clears the value
//!
//! If this test fails, consumers may receive a loopback or stale resolver.

mod common;

use common::*;
use underlay_core::traits::NameServerKey;
use underlay_core::{CycleOutcome, CycleTrigger, DnsConfigReader};

#[test]
fn absent_sources_yield_empty_value() {
    let source = ScriptedNetworkSource::new(1);
    let store = MemoryConfigStore::new();

    let (detector, state, mut rx) =
        detector_over(source, TableGuidResolver::with_interfaces(1), store.clone());

    assert_eq!(detector.run_cycle(CycleTrigger::Startup), CycleOutcome::Unchanged);
    assert_eq!(state.dns(), "");
    assert!(drain_changes(&mut rx).is_empty());
    assert_eq!(store.read_count(), 2, "both sources consulted");
}

#[test]
fn loopback_only_settings_are_ignored() {
    let store = MemoryConfigStore::new();
    store.set_static(1, "127.0.0.1");
    store.set_dhcp(1, " ,127.0.0.1,, ");

    let reader = DnsConfigReader::new(store);
    assert!(reader.read(&identifier(1)).is_empty());
    assert_eq!(reader.first(&identifier(1)), "");
}

#[test]
fn loopback_is_skipped_before_picking_the_first_server() {
    let store = MemoryConfigStore::new();
    store.set_static(1, "127.0.0.1 , 1.0.0.1");
    store.set_dhcp(1, "192.168.1.1");

    let reader = DnsConfigReader::new(store);
    assert_eq!(
        reader.read(&identifier(1)),
        vec!["1.0.0.1", "192.168.1.1"]
    );
    assert_eq!(reader.first(&identifier(1)), "1.0.0.1");
}

#[test]
fn unreadable_static_falls_through_to_dhcp() {
    let source = ScriptedNetworkSource::new(1);
    let store = MemoryConfigStore::new();
    store.set_static(1, "1.1.1.1");
    store.set_dhcp(1, "192.168.1.1");
    store.make_unreadable(1, NameServerKey::Static);

    let (detector, state, _rx) =
        detector_over(source, TableGuidResolver::with_interfaces(1), store);

    assert!(detector.run_cycle(CycleTrigger::Manual).is_changed());
    assert_eq!(state.dns(), "192.168.1.1");
}

#[test]
fn switching_to_interface_without_dns_clears_value() {
    let source = ScriptedNetworkSource::new(1);
    let store = MemoryConfigStore::new();
    store.set_static(1, "1.1.1.1");

    let (detector, state, mut rx) =
        detector_over(source.clone(), TableGuidResolver::with_interfaces(2), store);
    detector.run_cycle(CycleTrigger::Startup);

    source.set_default_silently(2);
    let outcome = detector.run_cycle(CycleTrigger::Event);

    match outcome {
        CycleOutcome::Changed(change) => {
            assert_eq!(change.previous, "1.1.1.1");
            assert_eq!(change.current, "");
            assert_eq!(change.interface, identifier(2));
        }
        other => panic!("expected a change, got {other:?}"),
    }
    assert_eq!(state.dns(), "");
    assert_eq!(drain_changes(&mut rx).len(), 2);
}
