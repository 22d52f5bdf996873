//! Polling fallback
//!
//! Some transitions, such as roaming between access points on the same
//! adapter, do not reliably produce a default-interface event. This task
//! runs a check cycle on a fixed interval regardless of events, which
//! bounds detection latency to one interval.

use crate::detector::{ChangeDetector, CycleTrigger};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Cancellable periodic check task
pub struct PollingFallback {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollingFallback {
    /// Spawn the polling task on the current tokio runtime
    ///
    /// The first cycle runs one `period` after spawning. Dropping the
    /// returned value also ends the task.
    pub fn spawn(detector: Arc<ChangeDetector>, period: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::initialization(format!("polling fallback needs a tokio runtime: {e}")))?;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = runtime.spawn(async move {
            info!("Starting polling fallback (interval={:?})", period);

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        detector.run_cycle(CycleTrigger::Poll);
                    }

                    _ = &mut stop_rx => {
                        debug!("Polling fallback stop signal received");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            stop_tx: Some(stop_tx),
            task,
        })
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }

        self.task
            .await
            .map_err(|e| Error::Other(format!("polling task failed: {e}")))
    }
}
