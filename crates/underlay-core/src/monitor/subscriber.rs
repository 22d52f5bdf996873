//! Event subscriber
//!
//! Attaches the change detector, and any extra sinks the host wants, to
//! the external default-interface change stream.

use crate::detector::ChangeDetector;
use crate::error::{Error, Result};
use crate::traits::{ChangeSink, NetworkChangeSource};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Registration of sinks on a running [`NetworkChangeSource`]
///
/// Dropping the subscriber stops the source.
pub struct EventSubscriber {
    source: Arc<dyn NetworkChangeSource>,
}

impl EventSubscriber {
    /// Register sinks, start the source and refresh interfaces once
    ///
    /// The detector is registered first, then `extra_sinks` in order.
    /// Sinks are independent; the source gives no ordering guarantee.
    ///
    /// # Errors
    ///
    /// Any failure is reported as [`Error::Initialization`]. The source is
    /// stopped again if it had already started.
    pub fn attach(
        source: Arc<dyn NetworkChangeSource>,
        detector: Arc<ChangeDetector>,
        extra_sinks: Vec<Arc<dyn ChangeSink>>,
    ) -> Result<Self> {
        let extra_count = extra_sinks.len();
        source.register_callback(detector);
        for sink in extra_sinks {
            source.register_callback(sink);
        }

        if let Err(e) = source.start().and_then(|()| source.refresh_interfaces()) {
            // Releases the registered sinks as well
            if let Err(stop_err) = source.stop() {
                debug!("Failed to stop {} after attach error: {}", source.source_name(), stop_err);
            }
            return Err(as_initialization(source.source_name(), e));
        }

        info!(
            "Subscribed to default-interface changes from {} ({} extra sink(s))",
            source.source_name(),
            extra_count
        );

        Ok(Self { source })
    }

    /// Stop the source; no sink is called after this returns
    pub fn detach(&self) -> Result<()> {
        self.source.stop()
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        if let Err(e) = self.source.stop() {
            error!("Failed to stop {}: {}", self.source.source_name(), e);
        }
    }
}

fn as_initialization(source: &str, err: Error) -> Error {
    match err {
        Error::Initialization(_) => err,
        other => Error::initialization(format!("{source}: {other}")),
    }
}
