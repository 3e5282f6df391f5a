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

//! Provides abstractions over the host facilities the monitor samples.
//!
//! This module defines the contracts that concrete sources in `vitals-infra`
//! implement: a refresh source that calls back once per presented frame, a
//! memory probe, and an event-driven battery source. Each contract reports
//! whether the host backs it at all, which the monitor turns into a
//! [`Capabilities`] descriptor once at construction.

use crate::error::VitalsResult;
use crate::snapshot::BatteryInfo;
use std::fmt;
use std::time::Instant;

/// Callback invoked by a [`RefreshSource`] with the instant of each frame.
pub type FrameCallback = Box<dyn FnMut(Instant) + Send>;

/// Callback invoked by a [`BatterySource`] whenever the power status changes.
pub type BatteryCallback = Box<dyn FnMut(BatteryInfo) + Send>;

/// A cancellable registration with a platform source.
///
/// Dropping the handle cancels the registration.
#[must_use = "dropping a SourceHandle cancels the registration"]
pub struct SourceHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SourceHandle {
    /// Creates a handle that runs `cancel` exactly once when cancelled or dropped.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancels the registration now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A per-frame callback primitive, such as a vsync or render-loop hook.
pub trait RefreshSource: Send + Sync {
    /// Returns `true` if the host provides a refresh primitive.
    fn is_available(&self) -> bool;

    /// Registers `callback` to be invoked once per frame until the handle is cancelled.
    fn register(&self, callback: FrameCallback) -> VitalsResult<SourceHandle>;
}

/// A raw memory reading, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryReading {
    /// Bytes currently in use.
    pub used: u64,
    /// Bytes available to the process.
    pub total: u64,
}

/// Reads the memory footprint of the monitored process.
pub trait MemoryProbe: Send + Sync {
    /// Returns `true` if the host exposes memory introspection.
    fn is_available(&self) -> bool;

    /// Reads the current footprint, or `None` if no reading is possible right now.
    fn read(&self) -> Option<MemoryReading>;
}

/// An event-driven power-source status provider.
pub trait BatterySource: Send + Sync {
    /// Returns `true` if the host exposes a battery.
    fn is_available(&self) -> bool;

    /// Acquires the battery and registers `callback` for status changes.
    ///
    /// Implementations invoke the callback once with the current status right
    /// after acquisition, then only when the level or charging state changes.
    fn watch(&self, callback: BatteryCallback) -> VitalsResult<SourceHandle>;
}

/// Which host facilities are backed on this platform.
///
/// Computed once when the monitor is built; absence is permanent for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// A refresh primitive exists.
    pub refresh: bool,
    /// Memory introspection exists.
    pub memory: bool,
    /// A battery exists.
    pub battery: bool,
}

impl Capabilities {
    /// Probes each source once.
    pub fn detect(
        refresh: &dyn RefreshSource,
        memory: &dyn MemoryProbe,
        battery: &dyn BatterySource,
    ) -> Self {
        let caps = Self {
            refresh: refresh.is_available(),
            memory: memory.is_available(),
            battery: battery.is_available(),
        };
        log::debug!("Detected platform capabilities: {caps:?}");
        caps
    }

    /// Every facility present.
    pub const fn all() -> Self {
        Self {
            refresh: true,
            memory: true,
            battery: true,
        }
    }
}
