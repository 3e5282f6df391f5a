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

//! sysinfo-based implementation of the `MemoryProbe` trait.

use std::sync::{Mutex, PoisonError};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use vitals_core::platform::{MemoryProbe, MemoryReading};

/// Reports the resident memory of the current process against total system memory.
pub struct SysinfoMemoryProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SysinfoMemoryProbe {
    /// Creates a probe for the current process.
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| log::debug!("Cannot resolve current pid: {e}"))
            .ok();
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoMemoryProbe {
    fn is_available(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM && self.pid.is_some()
    }

    fn read(&self) -> Option<MemoryReading> {
        let pid = self.pid?;
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let total = system.total_memory();
        let used = system.process(pid)?.memory();
        log::trace!("sysinfo memory reading: {used}/{total} bytes");
        Some(MemoryReading { used, total })
    }
}

impl std::fmt::Debug for SysinfoMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoMemoryProbe")
            .field("pid", &self.pid)
            .finish()
    }
}
