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

//! Scores a snapshot against the configured thresholds.
//!
//! The evaluator is pure: the same snapshot, configuration and capabilities
//! always produce the same verdict. Each threshold is independent and the
//! verdict is low as soon as one of them is breached.

use std::fmt;
use std::time::Duration;
use vitals_core::config::MonitorConfig;
use vitals_core::platform::Capabilities;
use vitals_core::snapshot::Snapshot;

/// A single tripped threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breach {
    /// Frame rate below the minimum.
    Fps {
        /// Observed frame rate.
        value: f64,
        /// Configured minimum.
        threshold: f64,
    },
    /// Memory usage above the maximum.
    Memory {
        /// Observed usage, in percent.
        percentage: f64,
        /// Configured maximum, in percent.
        threshold: f64,
    },
    /// Battery level below the minimum.
    Battery {
        /// Observed level, in percent.
        level: f64,
        /// Configured minimum, in percent.
        threshold: f64,
    },
    /// Load time above the maximum.
    PageLoadTime {
        /// Observed load time.
        value: Duration,
        /// Configured maximum.
        threshold: Duration,
    },
    /// Time-to-interactive above the maximum.
    TimeToInteractive {
        /// Observed time-to-interactive.
        value: Duration,
        /// Configured maximum.
        threshold: Duration,
    },
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breach::Fps { value, threshold } => {
                write!(f, "FPS {value:.0} below {threshold:.0}")
            }
            Breach::Memory {
                percentage,
                threshold,
            } => write!(f, "memory {percentage:.1}% above {threshold:.1}%"),
            Breach::Battery { level, threshold } => {
                write!(f, "battery {level:.0}% below {threshold:.0}%")
            }
            Breach::PageLoadTime { value, threshold } => {
                write!(f, "load time {value:?} above {threshold:?}")
            }
            Breach::TimeToInteractive { value, threshold } => {
                write!(f, "time to interactive {value:?} above {threshold:?}")
            }
        }
    }
}

/// The outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// `true` if any configured threshold is breached.
    pub is_low: bool,
    /// Delay before the next sampling tick.
    pub next_delay: Duration,
    /// Every threshold that tripped, for logging.
    pub breaches: Vec<Breach>,
}

/// Returns the delay before the next tick.
///
/// The sampling interval is doubled while performance is low and adaptive
/// monitoring is on. An unset interval counts as the default.
pub fn next_delay(config: &MonitorConfig, is_low: bool) -> Duration {
    let base = config.sample_rate();
    if config.adaptive_monitoring && is_low {
        base * 2
    } else {
        base
    }
}

/// Evaluates snapshots against a configuration.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveEvaluator {
    capabilities: Capabilities,
}

impl AdaptiveEvaluator {
    /// Creates an evaluator for a platform with the given capabilities.
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// The capabilities this evaluator was built with.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Scores `snapshot` against `config`.
    pub fn evaluate(&self, snapshot: &Snapshot, config: &MonitorConfig) -> Verdict {
        let breaches = self.breaches(snapshot, config);
        let is_low = !breaches.is_empty();
        Verdict {
            is_low,
            next_delay: next_delay(config, is_low),
            breaches,
        }
    }

    fn breaches(&self, snapshot: &Snapshot, config: &MonitorConfig) -> Vec<Breach> {
        let thresholds = &config.thresholds;
        let mut breaches = Vec::new();

        if let Some(threshold) = thresholds.fps {
            if snapshot.fps < threshold {
                breaches.push(Breach::Fps {
                    value: snapshot.fps,
                    threshold,
                });
            }
        }

        if let Some(threshold) = thresholds.memory_percentage {
            let percentage = snapshot.memory.percentage();
            if percentage > threshold {
                breaches.push(Breach::Memory {
                    percentage,
                    threshold,
                });
            }
        }

        if config.enable_battery_monitoring && self.capabilities.battery {
            if let (Some(threshold), Some(battery)) = (thresholds.battery_level, snapshot.battery_info) {
                if battery.level < threshold {
                    breaches.push(Breach::Battery {
                        level: battery.level,
                        threshold,
                    });
                }
            }
        }

        if config.enable_web_vitals {
            if let Some(vitals) = snapshot.web_vitals {
                let page_load = thresholds.page_load_time_ms.map(Duration::from_millis);
                if let (Some(value), Some(threshold)) = (vitals.page_load_time, page_load) {
                    if value > threshold {
                        breaches.push(Breach::PageLoadTime { value, threshold });
                    }
                }

                let tti = thresholds.time_to_interactive_ms.map(Duration::from_millis);
                if let (Some(value), Some(threshold)) = (vitals.time_to_interactive, tti) {
                    if value > threshold {
                        breaches.push(Breach::TimeToInteractive { value, threshold });
                    }
                }
            }
        }

        breaches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::config::Thresholds;
    use vitals_core::snapshot::{BatteryInfo, MemoryUsage, WebVitals};

    fn snapshot(fps: f64) -> Snapshot {
        Snapshot {
            fps,
            memory: MemoryUsage::new(100, 1000),
            ..Snapshot::empty()
        }
    }

    fn evaluator() -> AdaptiveEvaluator {
        AdaptiveEvaluator::new(Capabilities::all())
    }

    #[test]
    fn healthy_snapshot_is_not_low() {
        let verdict = evaluator().evaluate(&snapshot(60.0), &MonitorConfig::default());
        assert!(!verdict.is_low);
        assert!(verdict.breaches.is_empty());
        assert_eq!(verdict.next_delay, Duration::from_millis(1000));
    }

    #[test]
    fn fps_at_threshold_is_not_a_breach() {
        let verdict = evaluator().evaluate(&snapshot(30.0), &MonitorConfig::default());
        assert!(!verdict.is_low);
    }

    #[test]
    fn memory_above_threshold_is_low() {
        let s = Snapshot {
            memory: MemoryUsage::new(900, 1000),
            ..snapshot(60.0)
        };
        let verdict = evaluator().evaluate(&s, &MonitorConfig::default());
        assert!(verdict.is_low);
        assert!(matches!(verdict.breaches[0], Breach::Memory { .. }));
        assert_eq!(verdict.next_delay, Duration::from_millis(2000));
    }

    #[test]
    fn absent_thresholds_never_breach() {
        let config = MonitorConfig {
            thresholds: Thresholds::none(),
            ..MonitorConfig::default()
        };
        let s = Snapshot {
            fps: 1.0,
            memory: MemoryUsage::new(999, 1000),
            battery_info: Some(BatteryInfo::from_fraction(0.01, false)),
            ..Snapshot::empty()
        };
        assert!(!evaluator().evaluate(&s, &config).is_low);
    }

    #[test]
    fn battery_requires_capability_and_reading() {
        let low_battery = Snapshot {
            battery_info: Some(BatteryInfo::from_fraction(0.05, false)),
            ..snapshot(60.0)
        };
        let config = MonitorConfig::default();

        assert!(evaluator().evaluate(&low_battery, &config).is_low);

        let no_battery = AdaptiveEvaluator::new(Capabilities {
            battery: false,
            ..Capabilities::all()
        });
        assert!(!no_battery.evaluate(&low_battery, &config).is_low);

        assert!(!evaluator().evaluate(&snapshot(60.0), &config).is_low);
    }

    #[test]
    fn load_vitals_are_gated_by_switch() {
        let slow_load = Snapshot {
            web_vitals: Some(WebVitals {
                page_load_time: Some(Duration::from_millis(4500)),
                ..WebVitals::default()
            }),
            ..snapshot(60.0)
        };
        assert!(!evaluator().evaluate(&slow_load, &MonitorConfig::default()).is_low);

        let enabled = MonitorConfig {
            thresholds: Thresholds {
                page_load_time_ms: Some(3000),
                ..Thresholds::default()
            },
            ..MonitorConfig::default()
        };
        let verdict = evaluator().evaluate(&slow_load, &enabled);
        assert!(verdict.is_low);
        assert_eq!(
            verdict.breaches,
            vec![Breach::PageLoadTime {
                value: Duration::from_millis(4500),
                threshold: Duration::from_millis(3000),
            }]
        );

        let disabled = MonitorConfig {
            enable_web_vitals: false,
            ..enabled
        };
        assert!(!evaluator().evaluate(&slow_load, &disabled).is_low);
    }

    #[test]
    fn time_to_interactive_needs_its_own_threshold() {
        let slow_tti = Snapshot {
            web_vitals: Some(WebVitals {
                time_to_interactive: Some(Duration::from_millis(9000)),
                ..WebVitals::default()
            }),
            ..snapshot(60.0)
        };
        assert!(!evaluator().evaluate(&slow_tti, &MonitorConfig::default()).is_low);

        let config = MonitorConfig {
            thresholds: Thresholds {
                time_to_interactive_ms: Some(5000),
                ..Thresholds::default()
            },
            ..MonitorConfig::default()
        };
        assert!(evaluator().evaluate(&slow_tti, &config).is_low);
    }

    #[test]
    fn delay_doubles_only_when_adaptive() {
        let mut config = MonitorConfig {
            sample_rate_ms: 500,
            ..MonitorConfig::default()
        };
        assert_eq!(next_delay(&config, true), Duration::from_millis(1000));
        assert_eq!(next_delay(&config, false), Duration::from_millis(500));

        config.adaptive_monitoring = false;
        assert_eq!(next_delay(&config, true), Duration::from_millis(500));

        config.sample_rate_ms = 0;
        config.adaptive_monitoring = true;
        assert_eq!(next_delay(&config, true), Duration::from_millis(2000));
    }

    #[test]
    fn evaluation_is_pure() {
        let s = snapshot(12.0);
        let config = MonitorConfig::default();
        let e = evaluator();
        assert_eq!(e.evaluate(&s, &config), e.evaluate(&s, &config));
    }

    #[test]
    fn breach_messages_are_readable() {
        let breach = Breach::Fps {
            value: 20.0,
            threshold: 30.0,
        };
        assert_eq!(breach.to_string(), "FPS 20 below 30");
    }
}
