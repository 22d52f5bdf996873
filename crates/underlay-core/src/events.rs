//! Events emitted by the monitor

use crate::identifier::InterfaceIdentifier;
use serde::Serialize;

/// A detected change of the underlying DNS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsChange {
    /// Default interface the new value was read from
    pub interface: InterfaceIdentifier,
    /// Value before the change (possibly empty)
    pub previous: String,
    /// Value after the change (possibly empty)
    pub current: String,
}

/// Events emitted on the monitor event channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Monitor started
    Started {
        source: &'static str,
        poll_interval_secs: u64,
    },

    /// Underlying DNS changed
    DnsChanged(DnsChange),

    /// Monitor stopped
    Stopped { reason: String },
}

impl MonitorEvent {
    /// The DNS change carried by this event, if any
    pub fn as_change(&self) -> Option<&DnsChange> {
        match self {
            MonitorEvent::DnsChanged(change) => Some(change),
            _ => None,
        }
    }
}
