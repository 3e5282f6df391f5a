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

//! Fan-out of snapshots to subscribers.
//!
//! Listeners are called synchronously on the publishing thread, in
//! subscription order. A panicking listener is isolated: it is logged and
//! the remaining listeners still run. Channel subscribers receive a clone of
//! each snapshot and are pruned once their receiver is dropped.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use vitals_core::snapshot::Snapshot;

type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct HubState {
    listeners: BTreeMap<u64, Listener>,
    channels: Vec<flume::Sender<Snapshot>>,
    next_id: u64,
}

/// A registry of snapshot listeners.
#[derive(Clone, Default)]
pub struct SubscriberHub {
    state: Arc<Mutex<HubState>>,
}

impl SubscriberHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener` for every published snapshot.
    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) -> Subscription {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            hub: Arc::downgrade(&self.state),
        }
    }

    /// Returns a receiver that gets a copy of every published snapshot.
    pub fn subscribe_channel(&self) -> flume::Receiver<Snapshot> {
        let (tx, rx) = flume::unbounded();
        self.lock().channels.push(tx);
        rx
    }

    /// Delivers `snapshot` to every subscriber.
    pub fn publish(&self, snapshot: &Snapshot) {
        let listeners: Vec<(u64, Listener)> = {
            let mut state = self.lock();
            state
                .channels
                .retain(|tx| tx.send(snapshot.clone()).is_ok());
            state
                .listeners
                .iter()
                .map(|(id, listener)| (*id, listener.clone()))
                .collect()
        };

        log::trace!("Publishing snapshot to {} listener(s)", listeners.len());
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| (*listener)(snapshot))).is_err() {
                log::warn!("Snapshot listener #{id} panicked; continuing with the others");
            }
        }
    }

    /// Number of live listeners and channels.
    pub fn subscriber_count(&self) -> usize {
        let state = self.lock();
        state.listeners.len() + state.channels.len()
    }

    /// Drops every listener and channel.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.listeners.clear();
        state.channels.clear();
    }
}

impl std::fmt::Debug for SubscriberHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A listener registration, removed with [`Subscription::unsubscribe`].
///
/// Dropping the handle leaves the listener registered for the hub's lifetime.
#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe()"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<HubState>>,
}

impl Subscription {
    /// Removes the listener. No-op if the hub is gone.
    pub fn unsubscribe(self) {
        if let Some(state) = self.hub.upgrade() {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn listeners_receive_published_snapshots() {
        let hub = SubscriberHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sub = hub.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(&Snapshot::empty());
        hub.publish(&Snapshot::empty());
        assert_eq!(count.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        hub.publish(&Snapshot::empty());
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn dropped_handle_keeps_listener() {
        let hub = SubscriberHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        drop(hub.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        hub.publish(&Snapshot::empty());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(hub.subscriber_count(), 1);

        hub.clear();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let hub = SubscriberHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _bad = hub.subscribe(|_| panic!("listener failure"));
        let c = count.clone();
        let _good = hub.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(&Snapshot::empty());
        hub.publish(&Snapshot::empty());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn channels_receive_and_are_pruned() {
        let hub = SubscriberHub::new();
        let rx = hub.subscribe_channel();
        let dropped = hub.subscribe_channel();
        drop(dropped);

        let snapshot = Snapshot {
            fps: 42.0,
            ..Snapshot::empty()
        };
        hub.publish(&snapshot);
        assert_eq!(rx.try_recv().unwrap().fps, 42.0);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn listener_may_unsubscribe_others_while_publishing() {
        let hub = SubscriberHub::new();
        let target = Arc::new(Mutex::new(None::<Subscription>));
        let t = target.clone();
        let _first = hub.subscribe(move |_| {
            if let Some(sub) = t.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *target.lock().unwrap() = Some(hub.subscribe(|_| {}));

        hub.publish(&Snapshot::empty());
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let hub = SubscriberHub::new();
        let _sub = hub.subscribe(|_| {});
        let _rx = hub.subscribe_channel();
        hub.clear();
        assert_eq!(hub.subscriber_count(), 0);
    }
}
