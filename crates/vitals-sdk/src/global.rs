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

//! The optional process-wide monitor.

use crate::builder::PerformanceMonitorBuilder;
use crate::monitor::PerformanceMonitor;
use std::sync::OnceLock;
use vitals_core::error::{VitalsError, VitalsResult};

static GLOBAL: OnceLock<PerformanceMonitor> = OnceLock::new();

/// Builds and installs the process-wide monitor.
///
/// Fails with [`VitalsError::AlreadyInitialized`] on a second call. The
/// instance lives until the process exits; call
/// [`PerformanceMonitor::destroy`] to release its platform registrations.
pub fn init_global(
    builder: PerformanceMonitorBuilder,
) -> VitalsResult<&'static PerformanceMonitor> {
    if GLOBAL.get().is_some() {
        return Err(VitalsError::AlreadyInitialized);
    }
    let monitor = builder.build()?;
    GLOBAL
        .set(monitor)
        .map_err(|_| VitalsError::AlreadyInitialized)?;
    GLOBAL.get().ok_or(VitalsError::AlreadyInitialized)
}

/// The process-wide monitor, if [`init_global`] has run.
pub fn global() -> Option<&'static PerformanceMonitor> {
    GLOBAL.get()
}
