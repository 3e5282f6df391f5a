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

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use vitals_sdk::prelude::*;

/// Simulated work traced by the monitor.
async fn load_assets() -> Result<usize> {
    let assets: Vec<Vec<u8>> = (0..64).map(|i| vec![i as u8; 16 * 1024]).collect();
    tokio::time::sleep(Duration::from_millis(250)).await;
    Ok(assets.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut builder = PerformanceMonitor::builder().refresh_source(Arc::new(
        IntervalRefreshSource::new(Duration::from_micros(16_667)),
    ));
    if let Some(path) = std::env::args().nth(1) {
        builder = builder
            .config_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?;
    }
    let monitor = builder.build()?;
    log::info!("{monitor:?}");

    let _subscription = monitor.subscribe(|snapshot| log::info!("{}", snapshot.json_line()));
    monitor.start()?;

    monitor.mark_milestone(Milestone::FirstContentfulPaint);
    let count = monitor
        .execute_task(
            load_assets(),
            TaskOptions::new()
                .name("load-assets")
                .threshold(Duration::from_millis(100))
                .on_threshold_exceeded(|r| {
                    log::warn!("{} took {}ms", r.name, r.duration_ms())
                })
                .on_complete(|r| log::info!("{} used {} bytes", r.name, r.memory_impact)),
        )
        .await?;
    log::info!("Loaded {count} assets");
    monitor.mark_milestone(Milestone::Interactive);
    monitor.mark_milestone(Milestone::Loaded);

    let boundary = monitor.boundary().on_change(|low, _| {
        log::info!("Rendering switched to {}", if low { "fallback" } else { "full" })
    });
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let rendering = boundary.decide(monitor.latest_metrics().as_ref());
        log::info!("Rendering: {rendering:?}");
    }

    monitor.destroy();
    Ok(())
}
