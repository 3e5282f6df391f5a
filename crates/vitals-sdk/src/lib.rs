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

//! The public-facing API of the Vitals performance monitor.
//!
//! Build a [`PerformanceMonitor`] with [`PerformanceMonitor::builder`], start
//! its sampling loop, and read snapshots, verdicts and traces from it. A
//! single process-wide instance can be installed with [`init_global`].
//!
//! ```rust,no_run
//! use vitals_sdk::prelude::*;
//!
//! let monitor = PerformanceMonitor::builder().build()?;
//! monitor.start()?;
//! let _subscription = monitor.subscribe(|snapshot| {
//!     println!("fps={} memory={:.1}%", snapshot.fps, snapshot.memory.percentage());
//! });
//! # Ok::<(), vitals_sdk::prelude::VitalsError>(())
//! ```

mod builder;
mod global;
mod monitor;

pub use builder::PerformanceMonitorBuilder;
pub use global::{global, init_global};
pub use monitor::PerformanceMonitor;

/// Re-exports of the types most callers need.
pub mod prelude {
    pub use crate::{global, init_global, PerformanceMonitor, PerformanceMonitorBuilder};
    pub use vitals_control::{PerformanceBoundary, Rendering, Verdict};
    pub use vitals_core::{
        BatteryInfo, Capabilities, ConfigPatch, MemoryUsage, MonitorConfig, Snapshot, Thresholds,
        TraceResult, VitalsError, VitalsResult, WebVitals,
    };
    pub use vitals_infra::{
        default_platform, IntervalRefreshSource, ManualRefreshSource, PlatformSources,
    };
    pub use vitals_telemetry::{Milestone, Subscription, TaskOptions};
}
