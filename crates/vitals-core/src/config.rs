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

//! Monitor configuration: thresholds, sampling cadence, and feature switches.
//!
//! A [`MonitorConfig`] is always complete. Callers change it through a
//! [`ConfigPatch`], which is merged over the current value: every field present
//! in the patch replaces the current one, absent fields are kept.

use crate::error::{VitalsError, VitalsResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Default sampling interval, in milliseconds.
pub const DEFAULT_SAMPLE_RATE_MS: u64 = 1000;
/// Default minimum acceptable frame rate.
pub const DEFAULT_FPS_THRESHOLD: f64 = 30.0;
/// Default maximum acceptable memory usage, in percent.
pub const DEFAULT_MEMORY_PERCENTAGE_THRESHOLD: f64 = 80.0;
/// Default minimum acceptable battery level, in percent.
pub const DEFAULT_BATTERY_LEVEL_THRESHOLD: f64 = 20.0;

/// Independent triggers for the low-performance verdict.
///
/// A `None` threshold never participates in the verdict. It is not treated as
/// zero. Load-time thresholds are unset by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Breached when the frame rate drops below this value.
    pub fps: Option<f64>,
    /// Breached when memory usage rises above this percentage.
    pub memory_percentage: Option<f64>,
    /// Breached when the reported load time exceeds this many milliseconds.
    pub page_load_time_ms: Option<u64>,
    /// Breached when time-to-interactive exceeds this many milliseconds.
    pub time_to_interactive_ms: Option<u64>,
    /// Breached when the battery level drops below this percentage.
    pub battery_level: Option<f64>,
}

impl Thresholds {
    /// A threshold set where nothing can be breached.
    pub const fn none() -> Self {
        Self {
            fps: None,
            memory_percentage: None,
            page_load_time_ms: None,
            time_to_interactive_ms: None,
            battery_level: None,
        }
    }

    fn validate(&self) -> VitalsResult<()> {
        let checks = [
            ("thresholds.fps", self.fps),
            ("thresholds.memory_percentage", self.memory_percentage),
            ("thresholds.battery_level", self.battery_level),
        ];
        for (field, value) in checks {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(VitalsError::InvalidConfig {
                        field,
                        reason: format!("must be a non-negative number (got {v})"),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fps: Some(DEFAULT_FPS_THRESHOLD),
            memory_percentage: Some(DEFAULT_MEMORY_PERCENTAGE_THRESHOLD),
            page_load_time_ms: None,
            time_to_interactive_ms: None,
            battery_level: Some(DEFAULT_BATTERY_LEVEL_THRESHOLD),
        }
    }
}

/// The complete, merged monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Triggers for the low-performance verdict.
    pub thresholds: Thresholds,
    /// Milliseconds between two sampling ticks. Zero means "use the default".
    pub sample_rate_ms: u64,
    /// Whether the battery level participates in the verdict.
    pub enable_battery_monitoring: bool,
    /// Whether load milestones participate in the verdict.
    pub enable_web_vitals: bool,
    /// Whether the sampling interval widens while performance is low.
    pub adaptive_monitoring: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            sample_rate_ms: DEFAULT_SAMPLE_RATE_MS,
            enable_battery_monitoring: true,
            enable_web_vitals: true,
            adaptive_monitoring: true,
        }
    }
}

impl MonitorConfig {
    /// Returns the sampling interval, falling back to the default when unset.
    pub fn sample_rate(&self) -> Duration {
        let ms = if self.sample_rate_ms == 0 {
            DEFAULT_SAMPLE_RATE_MS
        } else {
            self.sample_rate_ms
        };
        Duration::from_millis(ms)
    }

    /// Returns a copy of this configuration with `patch` merged over it.
    pub fn merged(&self, patch: &ConfigPatch) -> Self {
        Self {
            thresholds: patch.thresholds.unwrap_or(self.thresholds),
            sample_rate_ms: match patch.sample_rate_ms {
                Some(0) => DEFAULT_SAMPLE_RATE_MS,
                Some(ms) => ms,
                None => self.sample_rate_ms,
            },
            enable_battery_monitoring: patch
                .enable_battery_monitoring
                .unwrap_or(self.enable_battery_monitoring),
            enable_web_vitals: patch.enable_web_vitals.unwrap_or(self.enable_web_vitals),
            adaptive_monitoring: patch
                .adaptive_monitoring
                .unwrap_or(self.adaptive_monitoring),
        }
    }

    /// Builds a configuration by merging `patch` over the documented defaults.
    pub fn from_patch(patch: &ConfigPatch) -> VitalsResult<Self> {
        let config = Self::default().merged(patch);
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is within its valid range.
    pub fn validate(&self) -> VitalsResult<()> {
        self.thresholds.validate()
    }

    /// Load a configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> VitalsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: &str) -> VitalsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| VitalsError::ConfigIo {
            path: path.to_string(),
            source_error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Save the configuration to a JSON file.
    pub fn to_file(&self, path: &str) -> VitalsResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| VitalsError::ConfigIo {
            path: path.to_string(),
            source_error: e.to_string(),
        })
    }
}

/// A partial configuration, merged over the current one.
///
/// `thresholds` is replaced as a whole: to disable a single trigger, pass a
/// threshold set without it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    /// Replacement threshold set.
    pub thresholds: Option<Thresholds>,
    /// Replacement sampling interval in milliseconds (zero restores the default).
    pub sample_rate_ms: Option<u64>,
    /// Replacement battery switch.
    pub enable_battery_monitoring: Option<bool>,
    /// Replacement load-milestone switch.
    pub enable_web_vitals: Option<bool>,
    /// Replacement adaptive-sampling switch.
    pub adaptive_monitoring: Option<bool>,
}

impl ConfigPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the replacement threshold set.
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Sets the replacement sampling interval.
    pub fn sample_rate_ms(mut self, ms: u64) -> Self {
        self.sample_rate_ms = Some(ms);
        self
    }

    /// Sets the replacement battery switch.
    pub fn enable_battery_monitoring(mut self, enabled: bool) -> Self {
        self.enable_battery_monitoring = Some(enabled);
        self
    }

    /// Sets the replacement load-milestone switch.
    pub fn enable_web_vitals(mut self, enabled: bool) -> Self {
        self.enable_web_vitals = Some(enabled);
        self
    }

    /// Sets the replacement adaptive-sampling switch.
    pub fn adaptive_monitoring(mut self, enabled: bool) -> Self {
        self.adaptive_monitoring = Some(enabled);
        self
    }

    /// Load a patch from a JSON string.
    pub fn from_json(json: &str) -> VitalsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The configuration shared between the facade and the sampling loop.
///
/// Readers always take a copy, so a change only affects scheduling decisions
/// made after it.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<MonitorConfig>>,
}

impl SharedConfig {
    /// Wraps an initial configuration.
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Returns a copy of the configuration currently in effect.
    pub fn current(&self) -> MonitorConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merges `patch` over the current configuration and returns the result.
    ///
    /// The current configuration is left untouched if the merged one is invalid.
    pub fn apply(&self, patch: &ConfigPatch) -> VitalsResult<MonitorConfig> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let merged = guard.merged(patch);
        merged.validate()?;
        *guard = merged.clone();
        Ok(merged)
    }
}
