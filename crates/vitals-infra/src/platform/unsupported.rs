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

//! Stand-in for a facility the host does not provide.

use vitals_core::error::{VitalsError, VitalsResult};
use vitals_core::platform::{
    BatteryCallback, BatterySource, FrameCallback, MemoryProbe, MemoryReading, RefreshSource,
    SourceHandle,
};

/// A source that reports itself unavailable for every contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl RefreshSource for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    fn register(&self, _callback: FrameCallback) -> VitalsResult<SourceHandle> {
        Err(VitalsError::SourceUnavailable("refresh"))
    }
}

impl MemoryProbe for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    fn read(&self) -> Option<MemoryReading> {
        None
    }
}

impl BatterySource for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    fn watch(&self, _callback: BatteryCallback) -> VitalsResult<SourceHandle> {
        Err(VitalsError::SourceUnavailable("battery"))
    }
}
