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

//! End-to-end checks of the adaptive policy.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use vitals_control::{AdaptiveEvaluator, SamplingScheduler, SharedMonitorState};
use vitals_core::config::{MonitorConfig, SharedConfig, Thresholds};
use vitals_core::platform::Capabilities;
use vitals_core::snapshot::{BatteryInfo, MemoryUsage, Snapshot};
use vitals_infra::{ManualBatterySource, Unsupported};
use vitals_telemetry::{
    LoadTimeline, MetricsAggregator, Milestone, ResourceSampler, SubscriberHub, TaskOptions,
    Tracer,
};

fn fps_only_config() -> MonitorConfig {
    MonitorConfig {
        thresholds: Thresholds {
            fps: Some(30.0),
            ..Thresholds::none()
        },
        sample_rate_ms: 1000,
        adaptive_monitoring: true,
        ..MonitorConfig::default()
    }
}

fn snapshot(fps: f64) -> Snapshot {
    Snapshot {
        fps,
        memory: MemoryUsage::new(10, 100),
        ..Snapshot::empty()
    }
}

#[test]
fn low_frame_rate_doubles_the_delay() {
    let verdict = AdaptiveEvaluator::new(Capabilities::all()).evaluate(&snapshot(20.0), &fps_only_config());
    assert!(verdict.is_low);
    assert_eq!(verdict.next_delay, Duration::from_millis(2000));
}

#[test]
fn healthy_frame_rate_keeps_the_delay() {
    let verdict = AdaptiveEvaluator::new(Capabilities::all()).evaluate(&snapshot(40.0), &fps_only_config());
    assert!(!verdict.is_low);
    assert_eq!(verdict.next_delay, Duration::from_millis(1000));
}

#[tokio::test]
async fn failing_task_leaves_no_open_trace() {
    let sampler = ResourceSampler::new(Arc::new(Unsupported), Arc::new(Unsupported));
    let aggregator = MetricsAggregator::new(Arc::new(Unsupported), sampler, SubscriberHub::new());
    let tracer = Tracer::new(aggregator);

    let completed = Arc::new(Mutex::new(false));
    let c = completed.clone();
    let err = tracer
        .execute_task(
            async { Err::<(), _>("x".to_string()) },
            TaskOptions::new().on_complete(move |_| *c.lock().unwrap() = true),
        )
        .await
        .unwrap_err();

    assert_eq!(err, "x");
    assert_eq!(tracer.open_traces(), 0);
    assert!(!*completed.lock().unwrap());
}

#[test]
fn disabled_battery_monitoring_ignores_critical_level() {
    let battery = ManualBatterySource::with_status(BatteryInfo::from_fraction(0.125, false));
    let hub = SubscriberHub::new();
    let sampler = ResourceSampler::new(Arc::new(Unsupported), Arc::new(battery));
    let capabilities = Capabilities {
        battery: sampler.is_battery_monitoring_available(),
        ..Capabilities::default()
    };
    let aggregator = MetricsAggregator::new(Arc::new(Unsupported), sampler, hub.clone());

    let config = SharedConfig::new(MonitorConfig {
        enable_battery_monitoring: false,
        ..MonitorConfig::default()
    });
    let mut scheduler = SamplingScheduler::new(
        aggregator,
        hub,
        config.clone(),
        AdaptiveEvaluator::new(capabilities),
        SharedMonitorState::new(),
    );

    let verdict = scheduler.tick();
    let metrics = scheduler.state().latest_metrics().unwrap();
    assert_eq!(metrics.battery_info.map(|b| b.level), Some(12.5));
    assert!(!verdict.is_low);

    config
        .apply(&vitals_core::config::ConfigPatch::new().enable_battery_monitoring(true))
        .unwrap();
    assert!(scheduler.tick().is_low);
}

#[test]
fn slow_load_does_not_pin_default_verdict() {
    let hub = SubscriberHub::new();
    let sampler = ResourceSampler::new(Arc::new(Unsupported), Arc::new(Unsupported));
    let aggregator = MetricsAggregator::new(Arc::new(Unsupported), sampler, hub.clone());
    let timeline = LoadTimeline::new(aggregator.clone());
    let config = SharedConfig::new(MonitorConfig::default());
    let mut scheduler = SamplingScheduler::new(
        aggregator,
        hub,
        config.clone(),
        AdaptiveEvaluator::new(Capabilities::default()),
        SharedMonitorState::new(),
    );

    timeline.mark_elapsed(Milestone::Loaded, Duration::from_secs(4));
    for _ in 0..3 {
        let verdict = scheduler.tick();
        assert!(!verdict.is_low, "{:?}", verdict.breaches);
        assert_eq!(verdict.next_delay, Duration::from_millis(1000));
    }
    let metrics = scheduler.state().latest_metrics().unwrap();
    assert_eq!(
        metrics.web_vitals.and_then(|v| v.page_load_time),
        Some(Duration::from_secs(4))
    );

    config
        .apply(&vitals_core::config::ConfigPatch::new().thresholds(Thresholds {
            page_load_time_ms: Some(3000),
            ..Thresholds::default()
        }))
        .unwrap();
    assert!(scheduler.tick().is_low);
}
