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

//! The immutable bundle of performance signals produced on every sampling tick.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Point-in-time memory usage, in bytes.
///
/// Only `used` and `total` are stored. The usage percentage is always
/// derived from them so the two can never drift apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    used: u64,
    total: u64,
}

impl MemoryUsage {
    /// Creates a usage record from raw byte counts.
    pub const fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// The all-zero record reported when the host exposes no memory introspection.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Bytes currently in use.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Total bytes available to the monitored process.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Usage as a percentage of `total`, or `0.0` when `total` is zero.
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.used as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Power-source status, as reported by a battery source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// Charge level, from 0 to 100.
    pub level: f64,
    /// `true` while the device is connected to a charger.
    pub charging: bool,
    /// Remaining time until fully charged, if the platform knows it.
    pub charging_time: Option<Duration>,
    /// Remaining time until empty, if the platform knows it.
    pub discharging_time: Option<Duration>,
}

impl BatteryInfo {
    /// Builds a battery record from a 0.0–1.0 charge fraction.
    pub fn from_fraction(fraction: f64, charging: bool) -> Self {
        Self {
            level: (fraction * 100.0).clamp(0.0, 100.0),
            charging,
            charging_time: None,
            discharging_time: None,
        }
    }

    /// Returns `true` if the level or the charging state differ from `other`.
    ///
    /// Battery sources only raise an event for these two changes.
    pub fn differs_from(&self, other: &BatteryInfo) -> bool {
        self.charging != other.charging || (self.level - other.level).abs() > f64::EPSILON
    }
}

/// Load-time milestones of the monitored application.
///
/// Every field is measured from the monitor's origin and is `None` until the
/// host reports the corresponding milestone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebVitals {
    /// Time until the application reported itself fully loaded.
    pub page_load_time: Option<Duration>,
    /// Time until the first meaningful content was presented.
    pub first_contentful_paint: Option<Duration>,
    /// Time until the largest content element was presented.
    pub largest_contentful_paint: Option<Duration>,
    /// Time until the application started accepting input.
    pub time_to_interactive: Option<Duration>,
}

impl WebVitals {
    /// Returns `true` if no milestone has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.page_load_time.is_none()
            && self.first_contentful_paint.is_none()
            && self.largest_contentful_paint.is_none()
            && self.time_to_interactive.is_none()
    }
}

/// The kinds of out-of-band issues the monitor can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// A single frame took longer than the frame-time budget.
    HighFrameTime,
}

impl IssueKind {
    /// Returns the stable, human-readable name of the issue.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::HighFrameTime => "high-frame-time",
        }
    }
}

/// An out-of-band issue attached to a snapshot pushed outside the regular tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceIssue {
    /// What went wrong.
    pub kind: IssueKind,
    /// The offending measurement (milliseconds for frame times).
    pub value: f64,
}

/// One immutable, timestamped bundle of all currently known performance signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frames per second, as of the last frame-rate checkpoint.
    pub fps: f64,
    /// Memory usage read at composition time.
    pub memory: MemoryUsage,
    /// Power-source status; absent until the first battery event or when unsupported.
    pub battery_info: Option<BatteryInfo>,
    /// Load milestones; absent until the host reports at least one.
    pub web_vitals: Option<WebVitals>,
    /// Wall-clock composition time, in milliseconds since the UNIX epoch.
    pub timestamp_ms: u64,
    /// Present only on snapshots pushed because of an out-of-band issue.
    pub performance_issue: Option<PerformanceIssue>,
}

impl Snapshot {
    /// The placeholder held before the first composition.
    pub fn empty() -> Self {
        Self {
            fps: 0.0,
            memory: MemoryUsage::zero(),
            battery_info: None,
            web_vitals: None,
            timestamp_ms: 0,
            performance_issue: None,
        }
    }

    /// Returns a copy of this snapshot tagged with an issue.
    pub fn with_issue(&self, issue: PerformanceIssue) -> Self {
        Self {
            performance_issue: Some(issue),
            ..self.clone()
        }
    }

    /// Serializes the snapshot as a single JSON line, for logs.
    pub fn json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
