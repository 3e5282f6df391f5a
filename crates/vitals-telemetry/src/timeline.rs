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

//! Load milestones, measured from the monitor's origin.

use crate::aggregator::{MetricsAggregator, SignalUpdate};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use vitals_core::snapshot::WebVitals;
use vitals_core::utils::timer::Stopwatch;

/// A load milestone reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Milestone {
    /// First meaningful content presented.
    FirstContentfulPaint,
    /// Largest content element presented.
    LargestContentfulPaint,
    /// The application accepts input.
    Interactive,
    /// The application is fully loaded.
    Loaded,
}

/// Records milestones and forwards them to the aggregator.
#[derive(Debug)]
pub struct LoadTimeline {
    origin: Stopwatch,
    vitals: Mutex<WebVitals>,
    aggregator: MetricsAggregator,
}

impl LoadTimeline {
    /// Starts a timeline whose origin is now.
    pub fn new(aggregator: MetricsAggregator) -> Self {
        Self::with_origin(aggregator, Instant::now())
    }

    /// Starts a timeline with an explicit origin.
    pub fn with_origin(aggregator: MetricsAggregator, origin: Instant) -> Self {
        Self {
            origin: Stopwatch::started_at(origin),
            vitals: Mutex::new(WebVitals::default()),
            aggregator,
        }
    }

    /// Marks `milestone` as reached now.
    pub fn mark(&self, milestone: Milestone) -> Duration {
        let elapsed = self.origin.elapsed().unwrap_or_default();
        self.mark_elapsed(milestone, elapsed);
        elapsed
    }

    /// Marks `milestone` as reached `elapsed` after the origin.
    ///
    /// Marking a milestone again overwrites its previous value.
    pub fn mark_elapsed(&self, milestone: Milestone, elapsed: Duration) {
        let vitals = {
            let mut vitals = self.vitals.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = match milestone {
                Milestone::FirstContentfulPaint => &mut vitals.first_contentful_paint,
                Milestone::LargestContentfulPaint => &mut vitals.largest_contentful_paint,
                Milestone::Interactive => &mut vitals.time_to_interactive,
                Milestone::Loaded => &mut vitals.page_load_time,
            };
            *slot = Some(elapsed);
            *vitals
        };
        log::debug!("Load milestone {milestone:?} at {elapsed:?}");
        self.aggregator.apply(SignalUpdate::WebVitals(vitals));
    }

    /// The milestones recorded so far.
    pub fn vitals(&self) -> WebVitals {
        *self.vitals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::SubscriberHub;
    use crate::sampler::ResourceSampler;
    use std::sync::Arc;
    use vitals_infra::Unsupported;

    fn aggregator() -> MetricsAggregator {
        let sampler = ResourceSampler::new(Arc::new(Unsupported), Arc::new(Unsupported));
        MetricsAggregator::new(Arc::new(Unsupported), sampler, SubscriberHub::new())
    }

    #[test]
    fn milestones_accumulate_into_snapshot() {
        let aggregator = aggregator();
        let timeline = LoadTimeline::new(aggregator.clone());
        assert!(timeline.vitals().is_empty());

        timeline.mark_elapsed(Milestone::FirstContentfulPaint, Duration::from_millis(400));
        timeline.mark_elapsed(Milestone::Loaded, Duration::from_millis(2500));

        let vitals = aggregator.get_metrics().web_vitals.unwrap();
        assert_eq!(vitals.first_contentful_paint, Some(Duration::from_millis(400)));
        assert_eq!(vitals.page_load_time, Some(Duration::from_millis(2500)));
        assert_eq!(vitals.time_to_interactive, None);
    }

    #[test]
    fn mark_measures_from_origin() {
        let origin = Instant::now() - Duration::from_millis(300);
        let timeline = LoadTimeline::with_origin(aggregator(), origin);
        let elapsed = timeline.mark(Milestone::Interactive);
        assert!(elapsed >= Duration::from_millis(300));
        assert_eq!(timeline.vitals().time_to_interactive, Some(elapsed));
    }
}
