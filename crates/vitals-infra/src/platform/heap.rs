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

//! Heap tracking: a counting global allocator and the probe that reads it.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::Ordering;
use vitals_core::memory::{
    get_currently_allocated_bytes, is_tracking_active, CURRENTLY_ALLOCATED_BYTES,
    PEAK_ALLOCATED_BYTES, TOTAL_ALLOCATIONS,
};
use vitals_core::platform::{MemoryProbe, MemoryReading};

/// A wrapper around a `GlobalAlloc` that keeps the heap counters in
/// `vitals_core::memory` up to date.
///
/// # Usage
///
/// ```rust,ignore
/// use vitals_infra::TrackingAllocator;
///
/// #[global_allocator]
/// static GLOBAL: TrackingAllocator = TrackingAllocator::new(std::alloc::System);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackingAllocator<A = System> {
    inner: A,
}

impl<A> TrackingAllocator<A> {
    /// Creates a tracking allocator that wraps `inner`.
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

fn record_alloc(size: usize) {
    if let Ok(previous) = CURRENTLY_ALLOCATED_BYTES.fetch_update(
        Ordering::Relaxed,
        Ordering::Relaxed,
        |current| current.checked_add(size),
    ) {
        PEAK_ALLOCATED_BYTES.fetch_max((previous + size) as u64, Ordering::Relaxed);
        TOTAL_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    }
}

fn record_dealloc(size: usize) {
    let _ = CURRENTLY_ALLOCATED_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(size))
    });
}

// Logging is off-limits in here: the logger itself allocates.
unsafe impl<A: GlobalAlloc> GlobalAlloc for TrackingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        record_dealloc(layout.size());
        self.inner.dealloc(ptr, layout);
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let old_size = layout.size();
            if new_size >= old_size {
                record_alloc(new_size - old_size);
            } else {
                record_dealloc(old_size - new_size);
            }
        }
        new_ptr
    }
}

/// Reads the heap counters against a fixed budget.
///
/// The probe is available only once a [`TrackingAllocator`] is installed and
/// has seen an allocation.
#[derive(Debug, Clone, Copy)]
pub struct HeapProbe {
    limit_bytes: u64,
}

impl HeapProbe {
    /// Creates a probe that reports usage against `limit_bytes`.
    pub fn new(limit_bytes: u64) -> Self {
        Self { limit_bytes }
    }
}

impl MemoryProbe for HeapProbe {
    fn is_available(&self) -> bool {
        is_tracking_active()
    }

    fn read(&self) -> Option<MemoryReading> {
        if !self.is_available() {
            return None;
        }
        Some(MemoryReading {
            used: get_currently_allocated_bytes() as u64,
            total: self.limit_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_updates_counters() {
        let allocator = TrackingAllocator::new(System);
        let layout = Layout::from_size_align(4096, 8).unwrap();
        let before = TOTAL_ALLOCATIONS.load(Ordering::Relaxed);

        unsafe {
            let ptr = allocator.alloc(layout);
            assert!(!ptr.is_null());
            assert!(TOTAL_ALLOCATIONS.load(Ordering::Relaxed) > before);
            assert!(PEAK_ALLOCATED_BYTES.load(Ordering::Relaxed) >= 4096);
            allocator.dealloc(ptr, layout);
        }
    }

    #[test]
    fn probe_reports_against_limit_once_tracking() {
        let allocator = TrackingAllocator::new(System);
        let layout = Layout::from_size_align(64, 8).unwrap();
        unsafe {
            let ptr = allocator.alloc(layout);
            let probe = HeapProbe::new(1 << 30);
            assert!(probe.is_available());
            let reading = probe.read().unwrap();
            assert_eq!(reading.total, 1 << 30);
            allocator.dealloc(ptr, layout);
        }
    }
}
