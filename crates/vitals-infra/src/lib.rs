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

//! Concrete implementations of the platform contracts defined in `vitals-core`.
//!
//! Every source here degrades gracefully: a host that lacks the facility
//! reports it through `is_available()` instead of failing at construction.

pub mod platform;

pub use platform::battery::{ManualBatterySource, SysfsBatterySource};
pub use platform::heap::{HeapProbe, TrackingAllocator};
pub use platform::refresh::{IntervalRefreshSource, ManualRefreshSource};
pub use platform::sysinfo_memory::SysinfoMemoryProbe;
pub use platform::unsupported::Unsupported;
pub use platform::{default_platform, PlatformSources};
