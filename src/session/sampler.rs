//! Live metrics sampler
//!
//! While the session is live, a background task nudges the session actor
//! once per interval. The actor does the actual read and broadcast, so a
//! tick can never be published after the actor has moved out of `Live`:
//! ticks from a cancelled sampler are recognised by id and dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Request to take one metrics sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SamplerTick {
    pub sampler_id: u64,
}

pub(crate) struct MetricsSampler {
    id: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MetricsSampler {
    /// Spawn a sampler. It stops when `stop` is called, when it is dropped,
    /// or when `parent` is cancelled.
    pub(crate) fn spawn(
        id: u64,
        interval: Duration,
        parent: &CancellationToken,
        ticks: mpsc::Sender<SamplerTick>,
    ) -> Self {
        let token = parent.child_token();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        // A full queue means the previous tick is still pending
                        match ticks.try_send(SamplerTick { sampler_id: id }) {
                            Ok(()) | Err(TrySendError::Full(_)) => {}
                            Err(TrySendError::Closed(_)) => break,
                        }
                    }
                }
            }
            tracing::trace!(sampler_id = id, "Metrics sampler exited");
        });

        tracing::debug!(
            sampler_id = id,
            interval_ms = interval.as_millis() as u64,
            "Metrics sampler started"
        );

        Self { id, token, task }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Cancel the task. Any tick already queued is discarded by the actor.
    pub(crate) fn stop(self) {
        self.token.cancel();
        tracing::debug!(sampler_id = self.id, "Metrics sampler stopped");
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MetricsSampler {
    fn drop(&mut self) {
        self.token.cancel();
        self.task.abort();
    }
}
