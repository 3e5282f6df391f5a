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

//! The single owner of the current snapshot.
//!
//! Push signals (frame rate, battery, load milestones) arrive through
//! [`MetricsAggregator::apply`]; memory is pulled from the sampler every time
//! a snapshot is composed. Platform registrations are made lazily, on the
//! first call to [`MetricsAggregator::get_metrics`], and torn down by
//! [`MetricsAggregator::cleanup`].

use crate::frame_rate::{FrameRateSample, FrameRateTracker, DEFAULT_FPS};
use crate::hub::SubscriberHub;
use crate::sampler::ResourceSampler;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;
use vitals_core::platform::{RefreshSource, SourceHandle};
use vitals_core::snapshot::{BatteryInfo, MemoryUsage, Snapshot, WebVitals};
use vitals_core::utils::time::now_timestamp_ms;

/// A pushed signal update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalUpdate {
    /// A frame-rate window closed.
    FrameRate(FrameRateSample),
    /// The battery reported a new status.
    Battery(BatteryInfo),
    /// The load milestones changed.
    WebVitals(WebVitals),
}

struct SignalState {
    tracker: FrameRateTracker,
    fps: f64,
    battery: Option<BatteryInfo>,
    web_vitals: Option<WebVitals>,
    current: Snapshot,
}

impl SignalState {
    fn compose(&mut self, memory: MemoryUsage) -> &Snapshot {
        self.current = Snapshot {
            fps: self.fps.round(),
            memory,
            battery_info: self.battery,
            web_vitals: self.web_vitals,
            timestamp_ms: now_timestamp_ms(),
            performance_issue: None,
        };
        &self.current
    }
}

#[derive(Default)]
struct Registrations {
    initialized: bool,
    refresh: Option<SourceHandle>,
    battery: Option<SourceHandle>,
}

struct AggregatorInner {
    sampler: ResourceSampler,
    refresh: Arc<dyn RefreshSource>,
    refresh_available: bool,
    hub: SubscriberHub,
    state: Mutex<SignalState>,
    registrations: Mutex<Registrations>,
}

/// Composes snapshots from the pushed and pulled signals.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct MetricsAggregator {
    inner: Arc<AggregatorInner>,
}

impl MetricsAggregator {
    /// Creates an aggregator. Nothing is registered until the first
    /// [`get_metrics`](Self::get_metrics).
    pub fn new(
        refresh: Arc<dyn RefreshSource>,
        sampler: ResourceSampler,
        hub: SubscriberHub,
    ) -> Self {
        let refresh_available = refresh.is_available();
        Self {
            inner: Arc::new(AggregatorInner {
                sampler,
                refresh,
                refresh_available,
                hub,
                state: Mutex::new(SignalState {
                    tracker: FrameRateTracker::new(),
                    fps: DEFAULT_FPS,
                    battery: None,
                    web_vitals: None,
                    current: Snapshot::empty(),
                }),
                registrations: Mutex::new(Registrations::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SignalState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn registrations(&self) -> MutexGuard<'_, Registrations> {
        self.inner
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn from_weak(weak: &Weak<AggregatorInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Returns the latest composed snapshot, initializing on first use.
    pub fn get_metrics(&self) -> Snapshot {
        self.ensure_initialized();
        self.state().current.clone()
    }

    /// Recomposes the snapshot now, pulling fresh memory.
    pub fn refresh(&self) -> Snapshot {
        self.ensure_initialized();
        let memory = self.inner.sampler.sample();
        self.state().compose(memory).clone()
    }

    /// Feeds a pushed signal and recomposes the snapshot.
    ///
    /// A frame-rate window that raised a frame-time issue also publishes an
    /// issue-tagged copy to subscribers. That copy never becomes current.
    pub fn apply(&self, update: SignalUpdate) {
        let memory = self.inner.sampler.sample();
        let issue_snapshot = {
            let mut state = self.state();
            let issue = match update {
                SignalUpdate::FrameRate(sample) => {
                    state.fps = sample.fps;
                    sample.frame_time_issue()
                }
                SignalUpdate::Battery(info) => {
                    state.battery = Some(info);
                    None
                }
                SignalUpdate::WebVitals(vitals) => {
                    state.web_vitals = Some(vitals);
                    None
                }
            };
            let snapshot = state.compose(memory);
            issue.map(|issue| snapshot.with_issue(issue))
        };

        if let Some(snapshot) = issue_snapshot {
            log::debug!(
                "Frame-time issue: longest frame {:.1}ms",
                snapshot.performance_issue.map_or(0.0, |i| i.value)
            );
            self.inner.hub.publish(&snapshot);
        }
    }

    /// Records a frame presented at `now`, applying the sample if a window closed.
    pub fn record_frame(&self, now: Instant) {
        let sample = self.state().tracker.record_frame(now);
        if let Some(sample) = sample {
            self.apply(SignalUpdate::FrameRate(sample));
        }
    }

    /// The current frame rate, rounded like the snapshot's.
    pub fn current_fps(&self) -> f64 {
        self.state().fps.round()
    }

    /// Reads memory now, without recomposing.
    pub fn sample_memory(&self) -> MemoryUsage {
        self.inner.sampler.sample()
    }

    /// Whether the host exposes a battery.
    pub fn is_battery_monitoring_available(&self) -> bool {
        self.inner.sampler.is_battery_monitoring_available()
    }

    /// Whether platform registrations are currently active.
    pub fn is_initialized(&self) -> bool {
        self.registrations().initialized
    }

    fn ensure_initialized(&self) {
        let mut registrations = self.registrations();
        if registrations.initialized {
            return;
        }
        registrations.initialized = true;
        log::info!("Initializing metrics aggregator");

        let memory = self.inner.sampler.sample();
        {
            let mut state = self.state();
            state.tracker.reset(Instant::now());
            state.compose(memory);
        }

        let weak = Arc::downgrade(&self.inner);
        registrations.battery = self.inner.sampler.watch_battery(Box::new(move |info| {
            if let Some(aggregator) = Self::from_weak(&weak) {
                aggregator.apply(SignalUpdate::Battery(info));
            }
        }));

        if self.inner.refresh_available {
            let weak = Arc::downgrade(&self.inner);
            let registered = self.inner.refresh.register(Box::new(move |now| {
                if let Some(aggregator) = Self::from_weak(&weak) {
                    aggregator.record_frame(now);
                }
            }));
            match registered {
                Ok(handle) => registrations.refresh = Some(handle),
                Err(e) => log::debug!("Frame-rate tracking not available: {e}"),
            }
        } else {
            log::debug!("No refresh primitive; frame rate stays at {DEFAULT_FPS}");
        }
    }

    /// Cancels the refresh and battery registrations.
    ///
    /// The last composed snapshot is kept. A later
    /// [`get_metrics`](Self::get_metrics) registers again.
    pub fn cleanup(&self) {
        let (refresh, battery) = {
            let mut registrations = self.registrations();
            if !registrations.initialized {
                return;
            }
            registrations.initialized = false;
            (registrations.refresh.take(), registrations.battery.take())
        };
        if let Some(handle) = refresh {
            handle.cancel();
        }
        if let Some(handle) = battery {
            handle.cancel();
        }
        log::info!("Metrics aggregator cleaned up");
    }
}

impl std::fmt::Debug for MetricsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsAggregator")
            .field("sampler", &self.inner.sampler)
            .field("refresh_available", &self.inner.refresh_available)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vitals_core::platform::{MemoryProbe, MemoryReading};
    use vitals_core::snapshot::IssueKind;
    use vitals_infra::{ManualBatterySource, ManualRefreshSource, Unsupported};

    struct FixedMemory;

    impl MemoryProbe for FixedMemory {
        fn is_available(&self) -> bool {
            true
        }
        fn read(&self) -> Option<MemoryReading> {
            Some(MemoryReading {
                used: 300,
                total: 1000,
            })
        }
    }

    fn aggregator(
        refresh: &ManualRefreshSource,
        battery: &ManualBatterySource,
    ) -> (MetricsAggregator, SubscriberHub) {
        let hub = SubscriberHub::new();
        let sampler = ResourceSampler::new(Arc::new(FixedMemory), Arc::new(battery.clone()));
        (
            MetricsAggregator::new(Arc::new(refresh.clone()), sampler, hub.clone()),
            hub,
        )
    }

    #[test]
    fn first_call_composes_initial_snapshot() {
        let (aggregator, _) = aggregator(&ManualRefreshSource::new(), &ManualBatterySource::new());
        let snapshot = aggregator.get_metrics();
        assert_eq!(snapshot.fps, DEFAULT_FPS);
        assert_eq!(snapshot.memory.used(), 300);
        assert_eq!(snapshot.memory.percentage(), 30.0);
        assert!(snapshot.battery_info.is_none());
        assert!(snapshot.timestamp_ms > 0);
    }

    #[test]
    fn initialization_registers_once() {
        let refresh = ManualRefreshSource::new();
        let battery = ManualBatterySource::new();
        let (aggregator, _) = aggregator(&refresh, &battery);

        aggregator.get_metrics();
        aggregator.get_metrics();
        aggregator.refresh();
        assert_eq!(refresh.registrations(), 1);
        assert_eq!(battery.watchers(), 1);
    }

    #[test]
    fn concurrent_first_calls_register_once() {
        let refresh = ManualRefreshSource::new();
        let battery = ManualBatterySource::new();
        let (aggregator, _) = aggregator(&refresh, &battery);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let a = aggregator.clone();
                std::thread::spawn(move || a.get_metrics())
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(refresh.registrations(), 1);
        assert_eq!(battery.watchers(), 1);
    }

    #[test]
    fn frames_update_rounded_fps() {
        let refresh = ManualRefreshSource::new();
        let (aggregator, _) = aggregator(&refresh, &ManualBatterySource::new());
        aggregator.get_metrics();

        let origin = Instant::now();
        aggregator.state().tracker.reset(origin);
        // 45 frames over 1010ms -> 44.55 fps, rounded to 45.
        for i in 1..=44 {
            refresh.frame_at(origin + Duration::from_millis(i * 20));
        }
        refresh.frame_at(origin + Duration::from_millis(1010));

        assert_eq!(aggregator.get_metrics().fps, 45.0);
        assert_eq!(aggregator.current_fps(), 45.0);
    }

    #[test]
    fn battery_events_are_applied() {
        let battery = ManualBatterySource::with_status(BatteryInfo::from_fraction(0.5, false));
        let (aggregator, _) = aggregator(&ManualRefreshSource::new(), &battery);

        assert_eq!(aggregator.get_metrics().battery_info.map(|b| b.level), Some(50.0));
        battery.set(BatteryInfo::from_fraction(0.1, false));
        assert_eq!(aggregator.get_metrics().battery_info.map(|b| b.level), Some(10.0));
    }

    #[test]
    fn long_frame_publishes_issue_without_storing_it() {
        let refresh = ManualRefreshSource::new();
        let (aggregator, hub) = aggregator(&refresh, &ManualBatterySource::new());
        let rx = hub.subscribe_channel();
        aggregator.get_metrics();

        let origin = Instant::now();
        aggregator.state().tracker.reset(origin);
        refresh.frame_at(origin + Duration::from_millis(10));
        refresh.frame_at(origin + Duration::from_millis(1100));

        let issue = rx.try_recv().unwrap().performance_issue.unwrap();
        assert_eq!(issue.kind, IssueKind::HighFrameTime);
        assert!(aggregator.get_metrics().performance_issue.is_none());
    }

    #[test]
    fn cleanup_cancels_and_allows_reinit() {
        let refresh = ManualRefreshSource::new();
        let battery = ManualBatterySource::new();
        let (aggregator, _) = aggregator(&refresh, &battery);

        aggregator.get_metrics();
        aggregator.cleanup();
        assert_eq!(refresh.registrations(), 0);
        assert_eq!(battery.watchers(), 0);
        assert!(!aggregator.is_initialized());

        aggregator.get_metrics();
        assert_eq!(refresh.registrations(), 1);
    }

    #[test]
    fn unsupported_platform_still_produces_snapshots() {
        let sampler = ResourceSampler::new(Arc::new(Unsupported), Arc::new(Unsupported));
        let aggregator = MetricsAggregator::new(Arc::new(Unsupported), sampler, SubscriberHub::new());
        let snapshot = aggregator.refresh();
        assert_eq!(snapshot.fps, DEFAULT_FPS);
        assert_eq!(snapshot.memory, MemoryUsage::zero());
        assert!(snapshot.battery_info.is_none());
        assert!(!aggregator.is_battery_monitoring_available());
    }

    #[test]
    fn web_vitals_update_recomposes() {
        let (aggregator, _) = aggregator(&ManualRefreshSource::new(), &ManualBatterySource::new());
        aggregator.get_metrics();
        aggregator.apply(SignalUpdate::WebVitals(WebVitals {
            page_load_time: Some(Duration::from_millis(1200)),
            ..WebVitals::default()
        }));
        let vitals = aggregator.get_metrics().web_vitals.unwrap();
        assert_eq!(vitals.page_load_time, Some(Duration::from_millis(1200)));
    }
}
