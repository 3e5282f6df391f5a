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

//! Named traces around caller work.
//!
//! A trace captures the ambient frame rate and memory when it opens and
//! reports the signed change when it closes. At most one trace is open per
//! name.

use crate::aggregator::MetricsAggregator;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use vitals_core::trace::{Trace, TraceResult};
use vitals_core::utils::time::now_timestamp_ms;

type TraceCallback = Box<dyn FnOnce(&TraceResult) + Send>;

/// Options for [`Tracer::execute_task`].
#[derive(Default)]
pub struct TaskOptions {
    name: Option<String>,
    threshold: Option<Duration>,
    on_complete: Option<TraceCallback>,
    on_threshold_exceeded: Option<TraceCallback>,
}

impl TaskOptions {
    /// Options with a generated trace name and no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trace name. Defaults to `task-<timestamp_ms>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the duration above which `on_threshold_exceeded` fires.
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Called with the trace result after the task succeeds.
    pub fn on_complete(mut self, callback: impl FnOnce(&TraceResult) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Called before `on_complete` when the task succeeded but took longer than the threshold.
    pub fn on_threshold_exceeded(
        mut self,
        callback: impl FnOnce(&TraceResult) + Send + 'static,
    ) -> Self {
        self.on_threshold_exceeded = Some(Box::new(callback));
        self
    }

    fn trace_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("task-{}", now_timestamp_ms()))
    }

    fn report(self, result: &TraceResult) {
        if let (Some(threshold), Some(callback)) = (self.threshold, self.on_threshold_exceeded) {
            if result.duration > threshold {
                callback(result);
            }
        }
        if let Some(callback) = self.on_complete {
            callback(result);
        }
    }
}

impl std::fmt::Debug for TaskOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskOptions")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

/// Opens and closes named traces against the aggregator's ambient readings.
#[derive(Clone)]
pub struct Tracer {
    aggregator: MetricsAggregator,
    open: Arc<Mutex<HashMap<String, Trace>>>,
}

impl Tracer {
    /// Creates a tracer reading from `aggregator`.
    pub fn new(aggregator: MetricsAggregator) -> Self {
        Self {
            aggregator,
            open: Arc::default(),
        }
    }

    fn open(&self) -> MutexGuard<'_, HashMap<String, Trace>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a trace named `name`, replacing any open trace with the same name.
    pub fn start_trace(&self, name: &str) {
        let memory = self.aggregator.sample_memory().used();
        let fps = self.aggregator.current_fps();
        let trace = Trace::new(name, Instant::now(), memory, fps);
        if self.open().insert(name.to_string(), trace).is_some() {
            log::debug!("Trace '{name}' restarted; the previous start was discarded");
        }
    }

    /// Closes the trace named `name`. Returns `None` if no such trace is open.
    pub fn end_trace(&self, name: &str) -> Option<TraceResult> {
        let trace = self.open().remove(name)?;
        let end_time = Instant::now();
        let memory = self.aggregator.sample_memory().used();
        let fps = self.aggregator.current_fps();
        let result = trace.finish(end_time, memory, fps, now_timestamp_ms());
        log::trace!(
            "Trace '{}' closed after {:.2}ms",
            result.name,
            result.duration_ms()
        );
        Some(result)
    }

    /// Opens a trace that closes itself when the guard is dropped.
    pub fn guard(&self, name: impl Into<String>) -> TraceGuard {
        let name = name.into();
        self.start_trace(&name);
        TraceGuard {
            tracer: self.clone(),
            name: Some(name),
        }
    }

    /// Number of open traces.
    pub fn open_traces(&self) -> usize {
        self.open().len()
    }

    /// Discards every open trace.
    pub fn clear(&self) {
        self.open().clear();
    }

    /// Runs `work` inside a trace.
    ///
    /// On success, `on_threshold_exceeded` (if the threshold was exceeded) and
    /// then `on_complete` receive the trace result. On failure the trace is
    /// closed, the callbacks are skipped and the error is returned unchanged.
    /// If the returned future is dropped early, the trace is closed too.
    pub async fn execute_task<F, T, E>(&self, work: F, options: TaskOptions) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let guard = self.guard(options.trace_name());
        let outcome = work.await;
        let result = guard.finish();

        if outcome.is_ok() {
            if let Some(result) = &result {
                options.report(result);
            }
        }
        outcome
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("open_traces", &self.open_traces())
            .finish()
    }
}

/// An open trace that is closed on drop.
#[derive(Debug)]
#[must_use = "dropping a TraceGuard closes the trace immediately"]
pub struct TraceGuard {
    tracer: Tracer,
    name: Option<String>,
}

impl TraceGuard {
    /// Closes the trace and returns its result.
    pub fn finish(mut self) -> Option<TraceResult> {
        let name = self.name.take()?;
        self.tracer.end_trace(&name)
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            self.tracer.end_trace(&name);
        }
    }
}
