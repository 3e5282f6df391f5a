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

//! Platform sources and the default bundle used when the host injects none.

pub mod battery;
pub mod heap;
pub mod refresh;
pub mod sysinfo_memory;
pub mod unsupported;

mod worker;

use std::sync::Arc;
use vitals_core::platform::{BatterySource, Capabilities, MemoryProbe, RefreshSource};

/// The three platform sources a monitor samples from.
#[derive(Clone)]
pub struct PlatformSources {
    /// Per-frame callback primitive.
    pub refresh: Arc<dyn RefreshSource>,
    /// Memory footprint reader.
    pub memory: Arc<dyn MemoryProbe>,
    /// Power-source status provider.
    pub battery: Arc<dyn BatterySource>,
}

impl PlatformSources {
    /// Probes each source once.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::detect(
            self.refresh.as_ref(),
            self.memory.as_ref(),
            self.battery.as_ref(),
        )
    }

    /// A bundle where no facility is backed.
    pub fn unsupported() -> Self {
        let none = Arc::new(unsupported::Unsupported);
        Self {
            refresh: none.clone(),
            memory: none.clone(),
            battery: none,
        }
    }
}

impl std::fmt::Debug for PlatformSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSources")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Builds the sources best suited to a headless host.
///
/// A headless host has no presentation loop, so no refresh source is wired
/// and the frame rate stays at its default. Hosts that render inject their
/// own (a [`refresh::ManualRefreshSource`] driven from the frame loop, or an
/// [`refresh::IntervalRefreshSource`]). Memory comes from `sysinfo`, and on
/// Linux the battery is read from `/sys/class/power_supply`.
pub fn default_platform() -> PlatformSources {
    PlatformSources {
        refresh: Arc::new(unsupported::Unsupported),
        memory: Arc::new(sysinfo_memory::SysinfoMemoryProbe::new()),
        battery: default_battery(),
    }
}

#[cfg(target_os = "linux")]
fn default_battery() -> Arc<dyn BatterySource> {
    Arc::new(battery::SysfsBatterySource::system())
}

#[cfg(not(target_os = "linux"))]
fn default_battery() -> Arc<dyn BatterySource> {
    Arc::new(unsupported::Unsupported)
}
