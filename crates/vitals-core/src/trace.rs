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

//! Named, caller-delimited measurement spans.

use serde::Serialize;
use std::time::{Duration, Instant};

/// An open measurement span.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// The trace key.
    pub name: String,
    /// When the trace was opened.
    pub start_time: Instant,
    /// Bytes in use when the trace was opened.
    pub start_memory: u64,
    /// Frame rate when the trace was opened.
    pub start_fps: f64,
}

impl Trace {
    /// Opens a trace at `start_time` with the given ambient readings.
    pub fn new(
        name: impl Into<String>,
        start_time: Instant,
        start_memory: u64,
        start_fps: f64,
    ) -> Self {
        Self {
            name: name.into(),
            start_time,
            start_memory,
            start_fps,
        }
    }

    /// Closes the trace against the readings taken at `end_time`.
    pub fn finish(
        self,
        end_time: Instant,
        end_memory: u64,
        end_fps: f64,
        timestamp_ms: u64,
    ) -> TraceResult {
        TraceResult {
            duration: end_time.saturating_duration_since(self.start_time),
            memory_impact: end_memory as i64 - self.start_memory as i64,
            fps_impact: end_fps - self.start_fps,
            name: self.name,
            timestamp_ms,
        }
    }
}

/// The outcome of a closed trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceResult {
    /// The trace key.
    pub name: String,
    /// Elapsed time between start and end.
    pub duration: Duration,
    /// Signed change in bytes in use (end minus start).
    pub memory_impact: i64,
    /// Signed change in frame rate (end minus start).
    pub fps_impact: f64,
    /// Wall-clock time the trace was closed, in milliseconds since the UNIX epoch.
    pub timestamp_ms: u64,
}

impl TraceResult {
    /// Duration in fractional milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}
