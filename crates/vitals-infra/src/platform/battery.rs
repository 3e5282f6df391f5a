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

//! Battery sources.
//!
//! [`SysfsBatterySource`] reads the Linux power-supply class and polls it for
//! changes. [`ManualBatterySource`] lets the host (or a test) push status
//! updates directly.

use super::worker::spawn_periodic;
use anyhow::{anyhow, Context};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use vitals_core::error::{VitalsError, VitalsResult};
use vitals_core::platform::{BatteryCallback, BatterySource, SourceHandle};
use vitals_core::snapshot::BatteryInfo;

const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Reads battery status from a sysfs `power_supply` directory.
#[derive(Debug, Clone)]
pub struct SysfsBatterySource {
    root: PathBuf,
    poll_interval: Duration,
}

impl SysfsBatterySource {
    /// A source over the system's `/sys/class/power_supply`.
    pub fn system() -> Self {
        Self::with_root(POWER_SUPPLY_ROOT)
    }

    /// A source over an arbitrary `power_supply`-shaped directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets how often the battery is re-read for changes.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn find_battery(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.root).ok()?;
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                fs::read_to_string(path.join("type"))
                    .map(|kind| kind.trim().eq_ignore_ascii_case("battery"))
                    .unwrap_or(false)
            })
    }
}

fn read_attr(dir: &Path, name: &str) -> anyhow::Result<String> {
    let path = dir.join(name);
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(raw.trim().to_string())
}

fn read_seconds(dir: &Path, name: &str) -> Option<Duration> {
    read_attr(dir, name)
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Parses one battery directory into a status record.
fn read_battery(dir: &Path) -> anyhow::Result<BatteryInfo> {
    let capacity: f64 = read_attr(dir, "capacity")?
        .parse()
        .map_err(|e| anyhow!("invalid capacity: {e}"))?;
    let status = read_attr(dir, "status").unwrap_or_default();
    let charging = matches!(status.as_str(), "Charging" | "Full");

    let mut info = BatteryInfo::from_fraction(capacity / 100.0, charging);
    info.charging_time = read_seconds(dir, "time_to_full_now");
    info.discharging_time = read_seconds(dir, "time_to_empty_now");
    Ok(info)
}

impl BatterySource for SysfsBatterySource {
    fn is_available(&self) -> bool {
        self.find_battery().is_some()
    }

    fn watch(&self, mut callback: BatteryCallback) -> VitalsResult<SourceHandle> {
        let dir = self
            .find_battery()
            .ok_or(VitalsError::SourceUnavailable("battery"))?;
        let initial = read_battery(&dir).map_err(|e| VitalsError::SourceFailed {
            source_name: "battery",
            details: format!("{e:#}"),
        })?;
        log::debug!("Acquired battery at {}", dir.display());
        callback(initial);

        let mut last = initial;
        spawn_periodic("vitals-battery", self.poll_interval, move || {
            match read_battery(&dir) {
                Ok(info) if info.differs_from(&last) => {
                    last = info;
                    callback(info);
                }
                Ok(_) => {}
                Err(e) => log::trace!("Battery poll failed: {e:#}"),
            }
        })
    }
}

type SharedBatteryCallback = Arc<Mutex<BatteryCallback>>;

#[derive(Default)]
struct ManualBatteryState {
    current: Option<BatteryInfo>,
    watchers: HashMap<u64, SharedBatteryCallback>,
}

/// A battery source whose status is pushed by the host.
#[derive(Clone)]
pub struct ManualBatterySource {
    available: bool,
    fail_acquisition: bool,
    state: Arc<Mutex<ManualBatteryState>>,
    next_id: Arc<AtomicU64>,
}

impl ManualBatterySource {
    /// A present battery with no status reported yet.
    pub fn new() -> Self {
        Self {
            available: true,
            fail_acquisition: false,
            state: Arc::default(),
            next_id: Arc::default(),
        }
    }

    /// A present battery with an initial status.
    pub fn with_status(info: BatteryInfo) -> Self {
        let source = Self::new();
        source.lock().current = Some(info);
        source
    }

    /// A battery that is reported present but refuses acquisition.
    pub fn failing() -> Self {
        Self {
            fail_acquisition: true,
            ..Self::new()
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualBatteryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reports a new status. Watchers are notified only if the level or the
    /// charging state changed.
    pub fn set(&self, info: BatteryInfo) {
        let watchers: Vec<SharedBatteryCallback> = {
            let mut state = self.lock();
            if state.current.is_some_and(|current| !info.differs_from(&current)) {
                state.current = Some(info);
                return;
            }
            state.current = Some(info);
            state.watchers.values().cloned().collect()
        };
        for watcher in watchers {
            let mut watcher = watcher.lock().unwrap_or_else(PoisonError::into_inner);
            watcher(info);
        }
    }

    /// Number of live watchers.
    pub fn watchers(&self) -> usize {
        self.lock().watchers.len()
    }
}

impl Default for ManualBatterySource {
    fn default() -> Self {
        Self::new()
    }
}

impl BatterySource for ManualBatterySource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn watch(&self, mut callback: BatteryCallback) -> VitalsResult<SourceHandle> {
        if self.fail_acquisition {
            return Err(VitalsError::SourceFailed {
                source_name: "battery",
                details: "acquisition refused".to_string(),
            });
        }

        let current = self.lock().current;
        if let Some(current) = current {
            callback(current);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .watchers
            .insert(id, Arc::new(Mutex::new(callback)));

        let state = Arc::downgrade(&self.state);
        Ok(SourceHandle::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .watchers
                    .remove(&id);
            }
        }))
    }
}

impl std::fmt::Debug for ManualBatterySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualBatterySource")
            .field("available", &self.available)
            .field("current", &self.lock().current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn fake_battery(root: &Path, capacity: &str, status: &str) -> PathBuf {
        let ac = root.join("AC");
        fs::create_dir_all(&ac).unwrap();
        fs::write(ac.join("type"), "Mains\n").unwrap();

        let bat = root.join("BAT0");
        fs::create_dir_all(&bat).unwrap();
        fs::write(bat.join("type"), "Battery\n").unwrap();
        fs::write(bat.join("capacity"), capacity).unwrap();
        fs::write(bat.join("status"), status).unwrap();
        bat
    }

    #[test]
    fn sysfs_reads_capacity_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let bat = fake_battery(dir.path(), "73\n", "Charging\n");
        fs::write(bat.join("time_to_full_now"), "1200\n").unwrap();

        let info = read_battery(&bat).unwrap();
        assert_eq!(info.level, 73.0);
        assert!(info.charging);
        assert_eq!(info.charging_time, Some(Duration::from_secs(1200)));
        assert_eq!(info.discharging_time, None);
    }

    #[test]
    fn sysfs_without_battery_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = SysfsBatterySource::with_root(dir.path());
        assert!(!source.is_available());
        let err = source.watch(Box::new(|_| {})).unwrap_err();
        assert_eq!(err, VitalsError::SourceUnavailable("battery"));
    }

    #[test]
    fn sysfs_emits_initial_status_then_changes() {
        let dir = tempfile::tempdir().unwrap();
        let bat = fake_battery(dir.path(), "50\n", "Discharging\n");
        let source = SysfsBatterySource::with_root(dir.path()).poll_interval(Duration::from_millis(5));
        assert!(source.is_available());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let handle = source
            .watch(Box::new(move |info| s.lock().unwrap().push(info)))
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);

        fs::write(bat.join("capacity"), "49\n").unwrap();
        thread::sleep(Duration::from_millis(80));
        handle.cancel();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].level, 50.0);
        assert_eq!(seen[1].level, 49.0);
        assert!(!seen[1].charging);
    }

    #[test]
    fn manual_source_notifies_only_on_change() {
        let source = ManualBatterySource::with_status(BatteryInfo::from_fraction(0.75, false));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let handle = source
            .watch(Box::new(move |info| s.lock().unwrap().push(info.level)))
            .unwrap();

        source.set(BatteryInfo::from_fraction(0.75, false));
        source.set(BatteryInfo::from_fraction(0.25, false));
        assert_eq!(*seen.lock().unwrap(), vec![75.0, 25.0]);

        drop(handle);
        assert_eq!(source.watchers(), 0);
    }

    #[test]
    fn failing_source_refuses_acquisition() {
        let source = ManualBatterySource::failing();
        assert!(source.is_available());
        assert!(matches!(
            source.watch(Box::new(|_| {})),
            Err(VitalsError::SourceFailed { .. })
        ));
    }
}
