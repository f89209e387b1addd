use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// One tick request for the match clock. `generation` identifies the ticker
/// that sent it, so pulses still queued from a stopped ticker can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPulse {
    pub generation: u64,
}

/// A periodic task that sends [`ClockPulse`]s until stopped or dropped.
#[derive(Debug)]
pub struct ClockTicker {
    generation: u64,
    handle: JoinHandle<()>,
}

impl ClockTicker {
    pub fn spawn(every: Duration, generation: u64, tx: mpsc::Sender<ClockPulse>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(ClockPulse { generation }).await.is_err() {
                    break;
                }
            }
        });
        debug!(generation, "ticker started");
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(generation = self.generation, "ticker stopped");
    }
}
