// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The sampling loop and the thread that drives it.

use crate::evaluator::{AdaptiveEvaluator, Verdict};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;
use vitals_core::config::SharedConfig;
use vitals_core::error::{VitalsError, VitalsResult};
use vitals_core::snapshot::Snapshot;
use vitals_telemetry::{MetricsAggregator, SubscriberHub};

/// What the loop has observed so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    /// The snapshot scored by the latest tick, `None` before the first one.
    pub metrics: Option<Snapshot>,
    /// The latest verdict.
    pub is_low_performance: bool,
}

/// [`MonitorState`] shared between the loop and its readers.
#[derive(Debug, Clone, Default)]
pub struct SharedMonitorState {
    inner: Arc<RwLock<MonitorState>>,
}

impl SharedMonitorState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current state.
    pub fn current(&self) -> MonitorState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The latest verdict.
    pub fn is_low_performance(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_low_performance
    }

    /// The snapshot scored by the latest tick.
    pub fn latest_metrics(&self) -> Option<Snapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .metrics
            .clone()
    }

    /// Stores a scored snapshot. Returns the previous verdict.
    fn record(&self, snapshot: Snapshot, is_low: bool) -> bool {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = state.is_low_performance;
        state.metrics = Some(snapshot);
        state.is_low_performance = is_low;
        previous
    }

    /// Forgets everything observed.
    pub fn reset(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = MonitorState::default();
    }
}

/// One step of the adaptive loop, with the delay it chose for the next step.
///
/// Hosts with their own cooperative loop call [`tick`](Self::tick) whenever
/// [`current_delay`](Self::current_delay) has elapsed; otherwise the
/// [`SamplingService`] does it on a thread.
pub struct SamplingScheduler {
    aggregator: MetricsAggregator,
    hub: SubscriberHub,
    config: SharedConfig,
    evaluator: AdaptiveEvaluator,
    state: SharedMonitorState,
    current_delay: Duration,
}

impl SamplingScheduler {
    /// Creates a scheduler. The first delay is the configured sample rate.
    pub fn new(
        aggregator: MetricsAggregator,
        hub: SubscriberHub,
        config: SharedConfig,
        evaluator: AdaptiveEvaluator,
        state: SharedMonitorState,
    ) -> Self {
        let current_delay = config.current().sample_rate();
        Self {
            aggregator,
            hub,
            config,
            evaluator,
            state,
            current_delay,
        }
    }

    /// The delay chosen by the latest tick.
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// The state this scheduler writes to.
    pub fn state(&self) -> &SharedMonitorState {
        &self.state
    }

    /// Samples, scores, records and publishes one snapshot.
    pub fn tick(&mut self) -> Verdict {
        let snapshot = self.aggregator.refresh();
        let config = self.config.current();
        let verdict = self.evaluator.evaluate(&snapshot, &config);

        log::trace!("Tick: {}", snapshot.json_line());
        let was_low = self.state.record(snapshot.clone(), verdict.is_low);
        if verdict.is_low != was_low {
            if verdict.is_low {
                let reasons: Vec<String> = verdict.breaches.iter().map(ToString::to_string).collect();
                log::warn!("Low performance detected: {}", reasons.join(", "));
            } else {
                log::info!("Performance recovered");
            }
        }

        self.hub.publish(&snapshot);
        self.current_delay = verdict.next_delay;
        verdict
    }
}

impl std::fmt::Debug for SamplingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingScheduler")
            .field("current_delay", &self.current_delay)
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

/// Runs a [`SamplingScheduler`] on a background thread.
///
/// The first tick runs immediately; each later tick waits for the delay the
/// previous one chose. Stopping interrupts the wait.
#[derive(Debug)]
pub struct SamplingService {
    running: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SamplingService {
    /// Spawns the sampling thread.
    pub fn start(scheduler: SamplingScheduler) -> VitalsResult<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("vitals-sampler".to_string())
            .spawn(move || run(scheduler, stop_rx, thread_running))
            .map_err(|e| VitalsError::Spawn(e.to_string()))?;

        log::info!("Sampling service started");
        Ok(Self {
            running,
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Whether the sampling thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the sampling thread and waits for it to exit.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);
        let _ = self.stop_tx.try_send(());

        // A subscriber stopping the monitor from inside a tick runs on this thread.
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::error!("Sampling thread panicked");
        }
        log::info!("Sampling service stopped");
    }
}

impl Drop for SamplingService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut scheduler: SamplingScheduler, stop_rx: Receiver<()>, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        scheduler.tick();
        match stop_rx.recv_timeout(scheduler.current_delay()) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    running.store(false, Ordering::SeqCst);
}
