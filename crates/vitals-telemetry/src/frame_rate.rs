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

//! Frames-per-second estimation over fixed one-second windows.

use std::time::{Duration, Instant};
use vitals_core::snapshot::{IssueKind, PerformanceIssue};

/// The frame rate reported before the first window closes, or when the host
/// has no refresh primitive.
pub const DEFAULT_FPS: f64 = 60.0;

/// Minimum elapsed time between two frame-rate recomputations.
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// A single frame longer than this raises a [`IssueKind::HighFrameTime`] issue.
pub const FRAME_TIME_ISSUE_THRESHOLD: Duration = Duration::from_millis(32);

/// The result of a closed frame-rate window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRateSample {
    /// Frames per second over the window.
    pub fps: f64,
    /// Longest interval between two consecutive frames in the window.
    pub longest_frame: Duration,
}

impl FrameRateSample {
    /// Returns the frame-time issue this window raises, if any.
    pub fn frame_time_issue(&self) -> Option<PerformanceIssue> {
        (self.longest_frame > FRAME_TIME_ISSUE_THRESHOLD).then(|| PerformanceIssue {
            kind: IssueKind::HighFrameTime,
            value: self.longest_frame.as_secs_f64() * 1000.0,
        })
    }
}

/// Counts frames and recomputes the rate once per [`FPS_WINDOW`].
///
/// The tracker is a pure state machine: it is fed frame instants and never
/// reads the clock itself.
#[derive(Debug, Clone)]
pub struct FrameRateTracker {
    checkpoint: Option<Instant>,
    last_frame: Option<Instant>,
    frame_count: u32,
    longest_frame: Duration,
    fps: f64,
}

impl FrameRateTracker {
    /// Creates a tracker reporting [`DEFAULT_FPS`] until its first window closes.
    pub fn new() -> Self {
        Self {
            checkpoint: None,
            last_frame: None,
            frame_count: 0,
            longest_frame: Duration::ZERO,
            fps: DEFAULT_FPS,
        }
    }

    /// Starts a fresh window at `origin`, keeping the last computed rate.
    pub fn reset(&mut self, origin: Instant) {
        self.checkpoint = Some(origin);
        self.last_frame = Some(origin);
        self.frame_count = 0;
        self.longest_frame = Duration::ZERO;
    }

    /// The most recently computed frame rate.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Records a frame presented at `now`.
    ///
    /// Returns a sample when this frame closes the current window.
    pub fn record_frame(&mut self, now: Instant) -> Option<FrameRateSample> {
        let Some(checkpoint) = self.checkpoint else {
            self.reset(now);
            return None;
        };

        self.frame_count += 1;
        if let Some(previous) = self.last_frame {
            self.longest_frame = self
                .longest_frame
                .max(now.saturating_duration_since(previous));
        }
        self.last_frame = Some(now);

        let elapsed = now.saturating_duration_since(checkpoint);
        if elapsed < FPS_WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.fps = f64::from(self.frame_count) * 1000.0 / elapsed_ms;
        let sample = FrameRateSample {
            fps: self.fps,
            longest_frame: self.longest_frame,
        };

        self.frame_count = 0;
        self.longest_frame = Duration::ZERO;
        self.checkpoint = Some(now);
        Some(sample)
    }
}

impl Default for FrameRateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feed(tracker: &mut FrameRateTracker, origin: Instant, interval_ms: u64, frames: u64) -> Vec<FrameRateSample> {
        (1..=frames)
            .filter_map(|i| tracker.record_frame(origin + Duration::from_millis(i * interval_ms)))
            .collect()
    }

    #[test]
    fn reports_default_before_first_window() {
        let mut tracker = FrameRateTracker::new();
        let origin = Instant::now();
        tracker.reset(origin);
        assert!(feed(&mut tracker, origin, 16, 10).is_empty());
        assert_eq!(tracker.fps(), DEFAULT_FPS);
    }

    #[test]
    fn first_frame_without_origin_starts_the_window() {
        let mut tracker = FrameRateTracker::new();
        let origin = Instant::now();
        assert!(tracker.record_frame(origin).is_none());
        let samples = feed(&mut tracker, origin, 10, 100);
        assert_eq!(samples.len(), 1);
        assert_relative_eq!(samples[0].fps, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn computes_rate_over_elapsed_window() {
        let mut tracker = FrameRateTracker::new();
        let origin = Instant::now();
        tracker.reset(origin);

        // 40 frames, 25ms apart: the window closes on the 40th frame at 1000ms.
        let samples = feed(&mut tracker, origin, 25, 40);
        assert_eq!(samples.len(), 1);
        assert_relative_eq!(samples[0].fps, 40.0, epsilon = 1e-9);
        assert_eq!(samples[0].longest_frame, Duration::from_millis(25));
        assert!(samples[0].frame_time_issue().is_none());
        assert_relative_eq!(tracker.fps(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn counter_resets_after_each_window() {
        let mut tracker = FrameRateTracker::new();
        let origin = Instant::now();
        tracker.reset(origin);

        let samples = feed(&mut tracker, origin, 20, 100);
        assert_eq!(samples.len(), 2);
        assert_relative_eq!(samples[0].fps, 50.0, epsilon = 1e-9);
        assert_relative_eq!(samples[1].fps, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn long_frame_raises_issue() {
        let mut tracker = FrameRateTracker::new();
        let origin = Instant::now();
        tracker.reset(origin);

        assert!(tracker.record_frame(origin + Duration::from_millis(16)).is_none());
        assert!(tracker.record_frame(origin + Duration::from_millis(66)).is_none());
        let sample = tracker
            .record_frame(origin + Duration::from_millis(1000))
            .unwrap();

        assert_eq!(sample.longest_frame, Duration::from_millis(934));
        let issue = sample.frame_time_issue().unwrap();
        assert_eq!(issue.kind, IssueKind::HighFrameTime);
        assert_relative_eq!(issue.value, 934.0, epsilon = 1e-6);
    }
}
