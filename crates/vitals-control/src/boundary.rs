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

//! Chooses between a full and a reduced rendering from the current verdict.

use crate::evaluator::AdaptiveEvaluator;
use std::sync::atomic::{AtomicBool, Ordering};
use vitals_core::config::SharedConfig;
use vitals_core::snapshot::Snapshot;

/// The rendering a boundary selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rendering {
    /// The rich alternative.
    #[default]
    Full,
    /// The reduced alternative, used while performance is low.
    Fallback,
}

type ChangeCallback = Box<dyn Fn(bool, Option<&Snapshot>) + Send + Sync>;

/// Picks one of two alternatives based on the low-performance verdict.
///
/// Without a snapshot the boundary always selects the full rendering.
pub struct PerformanceBoundary {
    evaluator: AdaptiveEvaluator,
    config: SharedConfig,
    last_low: AtomicBool,
    on_change: Option<ChangeCallback>,
}

impl PerformanceBoundary {
    /// Creates a boundary that scores snapshots with `evaluator` against `config`.
    pub fn new(evaluator: AdaptiveEvaluator, config: SharedConfig) -> Self {
        Self {
            evaluator,
            config,
            last_low: AtomicBool::new(false),
            on_change: None,
        }
    }

    /// Registers a callback fired whenever the selection flips.
    pub fn on_change(
        mut self,
        callback: impl Fn(bool, Option<&Snapshot>) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Returns `true` if `snapshot` should get the reduced rendering.
    pub fn prefers_fallback(&self, snapshot: Option<&Snapshot>) -> bool {
        snapshot.is_some_and(|s| self.evaluator.evaluate(s, &self.config.current()).is_low)
    }

    /// Decides the rendering for `snapshot`, firing the change callback on a flip.
    pub fn decide(&self, snapshot: Option<&Snapshot>) -> Rendering {
        let is_low = self.prefers_fallback(snapshot);
        let was_low = self.last_low.swap(is_low, Ordering::SeqCst);
        if is_low != was_low {
            let rendering = if is_low { "fallback" } else { "full" };
            log::debug!("Performance boundary switched to {rendering}");
            if let Some(callback) = &self.on_change {
                callback(is_low, snapshot);
            }
        }
        if is_low {
            Rendering::Fallback
        } else {
            Rendering::Full
        }
    }

    /// Returns `fallback` while performance is low, `full` otherwise.
    pub fn select<T>(&self, snapshot: Option<&Snapshot>, full: T, fallback: T) -> T {
        match self.decide(snapshot) {
            Rendering::Full => full,
            Rendering::Fallback => fallback,
        }
    }
}

impl std::fmt::Debug for PerformanceBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceBoundary")
            .field("last_low", &self.last_low.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use vitals_core::config::MonitorConfig;
    use vitals_core::platform::Capabilities;

    fn boundary() -> PerformanceBoundary {
        PerformanceBoundary::new(
            AdaptiveEvaluator::new(Capabilities::all()),
            SharedConfig::new(MonitorConfig::default()),
        )
    }

    fn snapshot(fps: f64) -> Snapshot {
        Snapshot {
            fps,
            ..Snapshot::empty()
        }
    }

    #[test]
    fn no_snapshot_selects_full() {
        assert_eq!(boundary().select(None, "full", "fallback"), "full");
    }

    #[test]
    fn low_snapshot_selects_fallback() {
        let b = boundary();
        assert_eq!(b.select(Some(&snapshot(12.0)), "full", "fallback"), "fallback");
        assert_eq!(b.select(Some(&snapshot(55.0)), "full", "fallback"), "full");
    }

    #[test]
    fn change_callback_fires_only_on_flips() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let b = boundary().on_change(move |is_low, snapshot| {
            s.lock().unwrap().push((is_low, snapshot.map(|m| m.fps)));
        });

        b.decide(Some(&snapshot(60.0)));
        b.decide(Some(&snapshot(20.0)));
        b.decide(Some(&snapshot(18.0)));
        b.decide(Some(&snapshot(45.0)));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(true, Some(20.0)), (false, Some(45.0))]
        );
    }
}
