//! Underlying DNS monitor
//!
//! Wires the change detector to its two triggers and owns their lifecycle:
//!
//! ```text
//! ┌──────────────────────┐  on_change   ┌────────────────┐
//! │ NetworkChangeSource  │─────────────▶│                │
//! └──────────────────────┘              │ ChangeDetector │──▶ MonitorState
//! ┌──────────────────────┐  run_cycle   │                │
//! │ PollingFallback (5s) │─────────────▶│                │
//! └──────────────────────┘              └────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! 1. Host creates a [`MonitorState`] at process start
//! 2. [`UnderlyingDnsMonitor::start()`] attaches and starts everything
//! 3. On failure the host logs a warning and keeps the empty state
//! 4. [`UnderlyingDnsMonitor::shutdown()`] stops both triggers

pub mod polling;
pub mod subscriber;

pub use polling::PollingFallback;
pub use subscriber::EventSubscriber;

use crate::config::MonitorConfig;
use crate::detector::{ChangeDetector, CycleOutcome, CycleTrigger};
use crate::error::Result;
use crate::events::MonitorEvent;
use crate::state::{MonitorState, UnderlyingDns};
use crate::traits::{ChangeSink, ConfigStore, GuidResolver, NetworkChangeSource};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Running monitor: event subscription plus polling fallback
pub struct UnderlyingDnsMonitor {
    detector: Arc<ChangeDetector>,
    subscriber: EventSubscriber,
    polling: PollingFallback,
    config: MonitorConfig,
}

impl UnderlyingDnsMonitor {
    /// Start the monitor
    ///
    /// # Parameters
    ///
    /// - `source`: External default-interface monitor
    /// - `resolver`: Index → GUID system call
    /// - `store`: Per-interface nameserver settings
    /// - `state`: Host-owned state the detector will write
    /// - `config`: Monitor configuration
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields
    /// monitor events, or an `Error::Initialization` / `Error::Config`.
    pub fn start(
        source: Arc<dyn NetworkChangeSource>,
        resolver: Arc<dyn GuidResolver>,
        store: Arc<dyn ConfigStore>,
        state: MonitorState,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        Self::start_with_sinks(source, resolver, store, state, config, Vec::new())
    }

    /// Start the monitor with additional, independent change sinks
    pub fn start_with_sinks(
        source: Arc<dyn NetworkChangeSource>,
        resolver: Arc<dyn GuidResolver>,
        store: Arc<dyn ConfigStore>,
        state: MonitorState,
        config: MonitorConfig,
        extra_sinks: Vec<Arc<dyn ChangeSink>>,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let source_name = source.source_name();

        let detector = Arc::new(ChangeDetector::new(
            source.clone(),
            resolver,
            store,
            state,
            config.address_scope,
            tx,
        ));

        let subscriber = EventSubscriber::attach(source, detector.clone(), extra_sinks)?;
        let polling = PollingFallback::spawn(detector.clone(), config.poll_interval())?;

        detector.emit_event(MonitorEvent::Started {
            source: source_name,
            poll_interval_secs: config.poll_interval_secs,
        });
        info!(
            "Underlying DNS monitor started (source={}, scope={}, poll={}s)",
            source_name, config.address_scope, config.poll_interval_secs
        );

        detector.run_cycle(CycleTrigger::Startup);

        let monitor = Self {
            detector,
            subscriber,
            polling,
            config,
        };

        Ok((monitor, rx))
    }

    /// Read-only accessor for consumers, with the configured override
    pub fn handle(&self) -> UnderlyingDns {
        self.detector.state().handle(self.config.override_dns.clone())
    }

    /// Run a check cycle now
    pub fn run_cycle(&self) -> CycleOutcome {
        self.detector.run_cycle(CycleTrigger::Manual)
    }

    /// The change detector driven by this monitor
    pub fn detector(&self) -> &Arc<ChangeDetector> {
        &self.detector
    }

    /// Stop polling and event delivery
    ///
    /// The state keeps its last value.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            detector,
            subscriber,
            polling,
            ..
        } = self;

        let polling_result = polling.stop().await;
        let detach_result = subscriber.detach();

        if let Err(e) = &polling_result {
            warn!("Polling fallback did not stop cleanly: {}", e);
        }

        detector.emit_event(MonitorEvent::Stopped {
            reason: "Shutdown requested".to_string(),
        });
        info!("Underlying DNS monitor stopped");

        polling_result?;
        detach_result
    }
}
