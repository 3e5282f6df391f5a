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

use crate::monitor::PerformanceMonitor;
use std::sync::Arc;
use vitals_core::config::{ConfigPatch, MonitorConfig};
use vitals_core::error::VitalsResult;
use vitals_core::platform::{BatterySource, MemoryProbe, RefreshSource};
use vitals_infra::{default_platform, PlatformSources};

/// Configures and builds a [`PerformanceMonitor`].
///
/// Sources that are not injected come from [`default_platform`].
#[derive(Default)]
pub struct PerformanceMonitorBuilder {
    config: MonitorConfig,
    patch: ConfigPatch,
    platform: Option<PlatformSources>,
    refresh: Option<Arc<dyn RefreshSource>>,
    memory: Option<Arc<dyn MemoryProbe>>,
    battery: Option<Arc<dyn BatterySource>>,
}

impl PerformanceMonitorBuilder {
    /// A builder with the default configuration and platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the base configuration.
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Merges `patch` over the base configuration at build time.
    pub fn patch(mut self, patch: ConfigPatch) -> Self {
        self.patch = patch;
        self
    }

    /// Loads the base configuration from a JSON file.
    pub fn config_file(mut self, path: &str) -> VitalsResult<Self> {
        self.config = MonitorConfig::from_file(path)?;
        Ok(self)
    }

    /// Uses a complete set of platform sources.
    pub fn platform(mut self, platform: PlatformSources) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Injects the refresh source.
    pub fn refresh_source(mut self, source: Arc<dyn RefreshSource>) -> Self {
        self.refresh = Some(source);
        self
    }

    /// Injects the memory probe.
    pub fn memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory = Some(probe);
        self
    }

    /// Injects the battery source.
    pub fn battery_source(mut self, source: Arc<dyn BatterySource>) -> Self {
        self.battery = Some(source);
        self
    }

    /// Builds the monitor. Nothing is registered with the platform until the
    /// first read or [`PerformanceMonitor::start`].
    pub fn build(self) -> VitalsResult<PerformanceMonitor> {
        let config = self.config.merged(&self.patch);
        config.validate()?;

        let base = match self.platform {
            Some(platform) => platform,
            None if self.refresh.is_some() && self.memory.is_some() && self.battery.is_some() => {
                PlatformSources::unsupported()
            }
            None => default_platform(),
        };
        let platform = PlatformSources {
            refresh: self.refresh.unwrap_or(base.refresh),
            memory: self.memory.unwrap_or(base.memory),
            battery: self.battery.unwrap_or(base.battery),
        };

        Ok(PerformanceMonitor::from_parts(config, platform))
    }
}

impl std::fmt::Debug for PerformanceMonitorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitorBuilder")
            .field("config", &self.config)
            .field("patch", &self.patch)
            .finish_non_exhaustive()
    }
}
