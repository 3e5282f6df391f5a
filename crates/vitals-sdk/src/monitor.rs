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

use crate::builder::PerformanceMonitorBuilder;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use vitals_control::{
    AdaptiveEvaluator, PerformanceBoundary, SamplingScheduler, SamplingService,
    SharedMonitorState,
};
use vitals_core::config::{ConfigPatch, MonitorConfig, SharedConfig};
use vitals_core::error::VitalsResult;
use vitals_core::platform::Capabilities;
use vitals_core::snapshot::Snapshot;
use vitals_core::trace::TraceResult;
use vitals_infra::PlatformSources;
use vitals_telemetry::{
    LoadTimeline, MetricsAggregator, Milestone, ResourceSampler, SubscriberHub, Subscription,
    TaskOptions, Tracer,
};

/// The runtime performance monitor.
///
/// Owns the aggregator, the subscriber hub, the trace registry and the
/// sampling service. Dropping the monitor tears everything down.
pub struct PerformanceMonitor {
    config: SharedConfig,
    capabilities: Capabilities,
    evaluator: AdaptiveEvaluator,
    aggregator: MetricsAggregator,
    hub: SubscriberHub,
    tracer: Tracer,
    timeline: LoadTimeline,
    state: SharedMonitorState,
    service: Mutex<Option<SamplingService>>,
}

impl PerformanceMonitor {
    /// Starts configuring a monitor.
    pub fn builder() -> PerformanceMonitorBuilder {
        PerformanceMonitorBuilder::new()
    }

    pub(crate) fn from_parts(config: MonitorConfig, platform: PlatformSources) -> Self {
        let capabilities = platform.capabilities();
        log::info!("Creating performance monitor ({capabilities:?})");

        let hub = SubscriberHub::new();
        let sampler = ResourceSampler::new(platform.memory, platform.battery);
        let aggregator = MetricsAggregator::new(platform.refresh, sampler, hub.clone());

        Self {
            config: SharedConfig::new(config),
            capabilities,
            evaluator: AdaptiveEvaluator::new(capabilities),
            tracer: Tracer::new(aggregator.clone()),
            timeline: LoadTimeline::new(aggregator.clone()),
            aggregator,
            hub,
            state: SharedMonitorState::new(),
            service: Mutex::new(None),
        }
    }

    fn service(&self) -> MutexGuard<'_, Option<SamplingService>> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the latest composed snapshot, registering with the platform on first use.
    pub fn get_metrics(&self) -> Snapshot {
        self.aggregator.get_metrics()
    }

    /// Registers `listener` for every published snapshot.
    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) -> Subscription {
        self.hub.subscribe(listener)
    }

    /// Returns a channel receiving every published snapshot.
    pub fn subscribe_channel(&self) -> flume::Receiver<Snapshot> {
        self.hub.subscribe_channel()
    }

    /// Opens a trace named `name`, replacing any open trace with that name.
    pub fn start_trace(&self, name: &str) {
        self.tracer.start_trace(name);
    }

    /// Closes the trace named `name`.
    pub fn end_trace(&self, name: &str) -> Option<TraceResult> {
        self.tracer.end_trace(name)
    }

    /// Runs `work` inside a trace. See [`Tracer::execute_task`].
    pub async fn execute_task<F, T, E>(&self, work: F, options: TaskOptions) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.tracer.execute_task(work, options).await
    }

    /// Merges `patch` over the configuration. Takes effect from the next tick.
    pub fn set_config(&self, patch: &ConfigPatch) -> VitalsResult<MonitorConfig> {
        let config = self.config.apply(patch)?;
        log::debug!("Configuration updated: {config:?}");
        Ok(config)
    }

    /// The configuration currently in effect.
    pub fn config(&self) -> MonitorConfig {
        self.config.current()
    }

    /// A scheduler sharing this monitor's state, for hosts that drive ticks
    /// from their own loop instead of calling [`start`](Self::start).
    pub fn scheduler(&self) -> SamplingScheduler {
        SamplingScheduler::new(
            self.aggregator.clone(),
            self.hub.clone(),
            self.config.clone(),
            self.evaluator,
            self.state.clone(),
        )
    }

    /// Starts the background sampling loop. No-op if it is already running.
    pub fn start(&self) -> VitalsResult<()> {
        let mut service = self.service();
        if service.as_ref().is_some_and(SamplingService::is_running) {
            return Ok(());
        }
        *service = Some(SamplingService::start(self.scheduler())?);
        Ok(())
    }

    /// Stops the background sampling loop, keeping registrations and subscribers.
    pub fn stop(&self) {
        let service = self.service().take();
        if let Some(mut service) = service {
            service.stop();
        }
    }

    /// Whether the background sampling loop is running.
    pub fn is_running(&self) -> bool {
        self.service()
            .as_ref()
            .is_some_and(SamplingService::is_running)
    }

    /// Tears the monitor down: stops sampling, cancels the refresh and
    /// battery registrations, and drops subscribers and open traces.
    ///
    /// The monitor stays usable; the next read registers again.
    pub fn destroy(&self) {
        self.stop();
        self.aggregator.cleanup();
        self.hub.clear();
        self.tracer.clear();
        log::info!("Performance monitor destroyed");
    }

    /// The latest verdict of the sampling loop.
    pub fn is_low_performance(&self) -> bool {
        self.state.is_low_performance()
    }

    /// The snapshot scored by the latest tick, `None` before the first one.
    pub fn latest_metrics(&self) -> Option<Snapshot> {
        self.state.latest_metrics()
    }

    /// Whether the host exposes a battery.
    pub fn is_battery_monitoring_available(&self) -> bool {
        self.aggregator.is_battery_monitoring_available()
    }

    /// The platform capabilities detected at construction.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Records a load milestone reached now. Returns the time since the monitor was built.
    pub fn mark_milestone(&self, milestone: Milestone) -> Duration {
        self.timeline.mark(milestone)
    }

    /// A rendering boundary that follows this monitor's configuration.
    pub fn boundary(&self) -> PerformanceBoundary {
        PerformanceBoundary::new(self.evaluator, self.config.clone())
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("capabilities", &self.capabilities)
            .field("config", &self.config())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
