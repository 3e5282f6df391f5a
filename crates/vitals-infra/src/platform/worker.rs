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

//! A named background thread that calls a closure at a fixed interval.

use crossbeam_channel::{bounded, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use vitals_core::error::{VitalsError, VitalsResult};
use vitals_core::platform::SourceHandle;

/// Spawns `tick` on a thread named `name`, every `interval`, until the handle is cancelled.
pub(crate) fn spawn_periodic(
    name: &str,
    interval: Duration,
    mut tick: impl FnMut() + Send + 'static,
) -> VitalsResult<SourceHandle> {
    let (stop_tx, stop_rx) = bounded::<()>(1);

    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })
        .map_err(|e| VitalsError::Spawn(e.to_string()))?;

    let thread_name = name.to_string();
    Ok(SourceHandle::new(move || {
        let _ = stop_tx.send(());
        // Cancelling from inside the tick itself must not wait on its own thread.
        if handle.thread().id() != thread::current().id() && handle.join().is_err() {
            log::warn!("Worker thread '{thread_name}' panicked");
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handle = spawn_periodic("test-worker", Duration::from_millis(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        handle.cancel();
        let after_cancel = count.load(Ordering::SeqCst);
        assert!(after_cancel > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }
}
