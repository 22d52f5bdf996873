//! Change detector
//!
//! Runs one check cycle of the underlying DNS pipeline and is the only
//! writer of [`MonitorState`].
//!
//! ## Cycle
//!
//! ```text
//! NetworkChangeSource ── default index ──▶ IdentifierTranslator
//!                                                   │ identifier
//!                                                   ▼
//!  MonitorState ◀── compare & set ── first of ── DnsConfigReader
//!       │
//!       └──▶ log line + MonitorEvent::DnsChanged
//! ```
//!
//! Cycles are triggered concurrently by OS callbacks and the polling
//! fallback. The whole cycle runs under the state's cycle lock, so two
//! cycles never interleave their read-compare-write and no change is
//! lost, even across detectors sharing one state.

use crate::events::{DnsChange, MonitorEvent};
use crate::identifier::IdentifierTranslator;
use crate::nameservers::DnsConfigReader;
use crate::state::MonitorState;
use crate::traits::{
    AddressScope, ChangeSink, ConfigStore, GuidResolver, InterfaceChange, InterfaceIndex,
    NetworkChangeSource,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// What started a check cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// Initial cycle during monitor start
    Startup,
    /// OS default-interface change notification
    Event,
    /// Polling fallback tick
    Poll,
    /// Explicit call by the host
    Manual,
}

impl fmt::Display for CycleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleTrigger::Startup => "startup",
            CycleTrigger::Event => "event",
            CycleTrigger::Poll => "poll",
            CycleTrigger::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Why a cycle was aborted without touching the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No interface currently carries default-route traffic
    NoDefaultInterface,
    /// The default interface index could not be translated
    Lookup {
        index: InterfaceIndex,
        message: String,
    },
}

/// Result of a single check cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The DNS value changed and the state was updated
    Changed(DnsChange),
    /// The DNS value is the same as before; nothing happened
    Unchanged,
    /// The cycle was aborted; the state is untouched
    Skipped(SkipReason),
}

impl CycleOutcome {
    /// Whether the state was updated
    pub fn is_changed(&self) -> bool {
        matches!(self, CycleOutcome::Changed(_))
    }
}

/// Orchestrates a single check cycle
pub struct ChangeDetector {
    source: Arc<dyn NetworkChangeSource>,
    translator: IdentifierTranslator,
    reader: DnsConfigReader,
    state: MonitorState,
    scope: AddressScope,
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl ChangeDetector {
    /// Create a new change detector
    ///
    /// # Parameters
    ///
    /// - `source`: Provides the current default interface index
    /// - `resolver`: Index → GUID system call
    /// - `store`: Per-interface nameserver settings
    /// - `state`: State this detector becomes the sole writer of
    /// - `scope`: Destination scope for the default-interface lookup
    /// - `event_tx`: Channel for change notifications
    pub fn new(
        source: Arc<dyn NetworkChangeSource>,
        resolver: Arc<dyn GuidResolver>,
        store: Arc<dyn ConfigStore>,
        state: MonitorState,
        scope: AddressScope,
        event_tx: mpsc::Sender<MonitorEvent>,
    ) -> Self {
        Self {
            source,
            translator: IdentifierTranslator::new(resolver),
            reader: DnsConfigReader::new(store),
            state,
            scope,
            event_tx,
        }
    }

    /// Run one check cycle
    ///
    /// Safe to call concurrently from any thread; cycles on the same
    /// [`MonitorState`] serialize.
    pub fn run_cycle(&self, trigger: CycleTrigger) -> CycleOutcome {
        let _cycle = self.state.lock_cycle();

        let Some(index) = self.source.default_interface_index(self.scope) else {
            trace!("No default {} interface ({} cycle)", self.scope, trigger);
            return CycleOutcome::Skipped(SkipReason::NoDefaultInterface);
        };

        let interface = match self.translator.translate(index) {
            Ok(interface) => interface,
            Err(e) => {
                debug!("Skipping {} cycle, interface {} lookup failed: {}", trigger, index, e);
                return CycleOutcome::Skipped(SkipReason::Lookup {
                    index,
                    message: e.to_string(),
                });
            }
        };

        let current = self.reader.first(&interface);
        let (previous_interface, previous) = self.state.get();

        if current == previous {
            if previous_interface.as_ref() != Some(&interface) {
                debug!(
                    "Default interface is now {} with unchanged DNS '{}'",
                    interface, current
                );
            }
            return CycleOutcome::Unchanged;
        }

        self.state.set(interface.clone(), current.clone());
        info!(
            interface = %interface,
            previous = %previous,
            current = %current,
            trigger = %trigger,
            "underlying DNS: {} {}",
            interface,
            current
        );

        let change = DnsChange {
            interface,
            previous,
            current,
        };
        self.emit_event(MonitorEvent::DnsChanged(change.clone()));

        CycleOutcome::Changed(change)
    }

    /// The state this detector writes
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Emit a monitor event
    ///
    /// Never blocks: OS callbacks run this on threads we do not own.
    pub(crate) fn emit_event(&self, event: MonitorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Monitor event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("Monitor event receiver dropped");
            }
        }
    }
}

impl ChangeSink for ChangeDetector {
    fn on_change(&self, change: &InterfaceChange) {
        trace!("Default interface change notification: {:?}", change.index);
        self.run_cycle(CycleTrigger::Event);
    }
}

impl fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("source", &self.source.source_name())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
