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

//! Reads memory on demand and acquires the battery source.

use std::sync::Arc;
use vitals_core::platform::{BatteryCallback, BatterySource, MemoryProbe, SourceHandle};
use vitals_core::snapshot::MemoryUsage;

/// Wraps the memory probe and battery source behind infallible reads.
#[derive(Clone)]
pub struct ResourceSampler {
    memory: Arc<dyn MemoryProbe>,
    battery: Arc<dyn BatterySource>,
    memory_available: bool,
    battery_available: bool,
}

impl ResourceSampler {
    /// Creates a sampler. Both capabilities are probed once, here.
    pub fn new(memory: Arc<dyn MemoryProbe>, battery: Arc<dyn BatterySource>) -> Self {
        let memory_available = memory.is_available();
        let battery_available = battery.is_available();
        log::debug!(
            "ResourceSampler: memory introspection={memory_available}, battery={battery_available}"
        );
        Self {
            memory,
            battery,
            memory_available,
            battery_available,
        }
    }

    /// Reads the current memory usage. All-zero when the host has no introspection.
    pub fn sample(&self) -> MemoryUsage {
        if !self.memory_available {
            return MemoryUsage::zero();
        }
        self.memory
            .read()
            .map(|reading| MemoryUsage::new(reading.used, reading.total))
            .unwrap_or_else(MemoryUsage::zero)
    }

    /// Acquires the battery and registers `callback` for status changes.
    ///
    /// Returns `None` when there is no battery or acquisition fails; the
    /// battery fields then stay absent for the session.
    pub fn watch_battery(&self, callback: BatteryCallback) -> Option<SourceHandle> {
        if !self.battery_available {
            return None;
        }
        match self.battery.watch(callback) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::debug!("Battery monitoring not available: {e}");
                None
            }
        }
    }

    /// Whether the host exposes a battery. Evaluated once at construction.
    pub fn is_battery_monitoring_available(&self) -> bool {
        self.battery_available
    }
}

impl std::fmt::Debug for ResourceSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSampler")
            .field("memory_available", &self.memory_available)
            .field("battery_available", &self.battery_available)
            .finish()
    }
}
