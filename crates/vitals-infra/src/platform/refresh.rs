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

//! Refresh sources: a timer-driven one for headless hosts and a manual one
//! that the host's own render loop pumps.

use super::worker::spawn_periodic;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use vitals_core::error::VitalsResult;
use vitals_core::platform::{FrameCallback, RefreshSource, SourceHandle};

/// Calls every registered callback from a dedicated thread at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct IntervalRefreshSource {
    interval: Duration,
}

impl IntervalRefreshSource {
    /// Creates a source that "presents" a frame every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The configured frame interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl RefreshSource for IntervalRefreshSource {
    fn is_available(&self) -> bool {
        true
    }

    fn register(&self, mut callback: FrameCallback) -> VitalsResult<SourceHandle> {
        log::debug!(
            "Starting interval refresh source every {:?}",
            self.interval
        );
        spawn_periodic("vitals-refresh", self.interval, move || {
            callback(Instant::now())
        })
    }
}

type SharedCallback = Arc<Mutex<FrameCallback>>;

/// A refresh source pumped by the host, one [`ManualRefreshSource::frame`] call per frame.
#[derive(Clone, Default)]
pub struct ManualRefreshSource {
    callbacks: Arc<Mutex<HashMap<u64, SharedCallback>>>,
    next_id: Arc<AtomicU64>,
}

impl ManualRefreshSource {
    /// Creates a source with no registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals a frame presented now.
    pub fn frame(&self) {
        self.frame_at(Instant::now());
    }

    /// Signals a frame presented at `now`.
    pub fn frame_at(&self, now: Instant) {
        // Snapshot the list so callbacks may cancel their own registration.
        let callbacks: Vec<SharedCallback> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            let mut callback = callback.lock().unwrap_or_else(PoisonError::into_inner);
            callback(now);
        }
    }

    /// Number of live registrations.
    pub fn registrations(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RefreshSource for ManualRefreshSource {
    fn is_available(&self) -> bool {
        true
    }

    fn register(&self, callback: FrameCallback) -> VitalsResult<SourceHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(callback)));

        let callbacks = Arc::downgrade(&self.callbacks);
        Ok(SourceHandle::new(move || {
            if let Some(callbacks) = callbacks.upgrade() {
                callbacks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
            }
        }))
    }
}

impl std::fmt::Debug for ManualRefreshSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualRefreshSource")
            .field("registrations", &self.registrations())
            .finish()
    }
}
