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

//! The adaptive feedback loop.
//!
//! Every sampling tick the [`SamplingScheduler`] asks the aggregator for a
//! fresh snapshot, scores it with the [`AdaptiveEvaluator`], records the
//! verdict, publishes the snapshot and uses the verdict's delay for the next
//! tick. The [`SamplingService`] runs that loop on a background thread; the
//! [`PerformanceBoundary`] turns the same verdict into a rendering choice.

pub mod boundary;
pub mod evaluator;
pub mod scheduler;

pub use boundary::{PerformanceBoundary, Rendering};
pub use evaluator::{next_delay, AdaptiveEvaluator, Breach, Verdict};
pub use scheduler::{MonitorState, SamplingScheduler, SamplingService, SharedMonitorState};
