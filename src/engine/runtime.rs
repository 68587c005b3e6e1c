// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::build::{Scheduler, Trigger};
use crate::errors::Result;
use crate::reload::Broadcaster;

use super::RuntimeEvent;

/// Drives the scheduler in response to `RuntimeEvent`s and announces each
/// finished batch to the reload broadcaster.
///
/// Task-level failures are already isolated inside the scheduler's report;
/// even a whole failed batch only logs and keeps the loop alive. The loop
/// ends on shutdown request or when every event sender is gone.
pub struct Runtime {
    scheduler: Scheduler,
    broadcaster: Broadcaster,
    event_rx: mpsc::Receiver<RuntimeEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        scheduler: Scheduler,
        broadcaster: Broadcaster,
        event_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            scheduler,
            broadcaster,
            event_rx,
        }
    }

    /// Main event loop.
    pub async fn run(mut self) -> Result<()> {
        info!("assetwatch runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::ChangesDetected(changes) => {
                    match self.scheduler.schedule(Trigger::Changes(changes)) {
                        Ok(report) => self.broadcaster.announce(&report),
                        Err(e) => {
                            // Keep watching; a failed batch must not take the
                            // process down.
                            warn!(error = %e, "change batch failed");
                        }
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping runtime");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }
}
