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

//! Foundational types and contracts for the Vitals performance monitor.
//!
//! This crate holds the "common language" shared by every other crate of the
//! workspace: the immutable [`Snapshot`] produced on each sampling tick, the
//! monitor configuration, the trace records, and the platform traits that
//! concrete sources (in `vitals-infra`) implement.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod memory;
pub mod platform;
pub mod snapshot;
pub mod trace;
pub mod utils;

pub use config::{ConfigPatch, MonitorConfig, SharedConfig, Thresholds};
pub use error::{VitalsError, VitalsResult};
pub use platform::{
    BatteryCallback, BatterySource, Capabilities, FrameCallback, MemoryProbe, MemoryReading,
    RefreshSource, SourceHandle,
};
pub use snapshot::{
    BatteryInfo, IssueKind, MemoryUsage, PerformanceIssue, Snapshot, WebVitals,
};
pub use trace::{Trace, TraceResult};
pub use utils::timer::Stopwatch;
pub use utils::time::now_timestamp_ms;
