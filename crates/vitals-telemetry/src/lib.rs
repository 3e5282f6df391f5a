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

//! Sampling and aggregation of runtime performance signals.
//!
//! The [`MetricsAggregator`] owns the current [`Snapshot`](vitals_core::Snapshot).
//! It is fed by the [`FrameRateTracker`] through a refresh source, pulls
//! memory from the [`ResourceSampler`] at composition time, and receives
//! battery and load-milestone updates as [`SignalUpdate`]s. Snapshots are
//! fanned out by the [`SubscriberHub`]; the [`Tracer`] measures spans of
//! caller work against the same ambient readings.

pub mod aggregator;
pub mod frame_rate;
pub mod hub;
pub mod sampler;
pub mod timeline;
pub mod traces;

pub use aggregator::{MetricsAggregator, SignalUpdate};
pub use frame_rate::{FrameRateSample, FrameRateTracker};
pub use hub::{SubscriberHub, Subscription};
pub use sampler::ResourceSampler;
pub use timeline::{LoadTimeline, Milestone};
pub use traces::{TaskOptions, TraceGuard, Tracer};
