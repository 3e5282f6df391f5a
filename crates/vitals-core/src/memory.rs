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

//! Global heap counters.
//!
//! A tracking global allocator (see `vitals-infra`) increments these counters;
//! the heap memory probe reads them. When no tracking allocator is registered
//! they simply stay at zero.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Bytes currently allocated through the registered global allocator.
pub static CURRENTLY_ALLOCATED_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Highest value ever reached by [`CURRENTLY_ALLOCATED_BYTES`].
pub static PEAK_ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Number of allocation calls made.
pub static TOTAL_ALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// Gets the total number of bytes currently allocated by the global allocator.
pub fn get_currently_allocated_bytes() -> usize {
    CURRENTLY_ALLOCATED_BYTES.load(Ordering::Relaxed)
}

/// Returns `true` once a tracking allocator has recorded at least one allocation.
pub fn is_tracking_active() -> bool {
    TOTAL_ALLOCATIONS.load(Ordering::Relaxed) > 0
}
