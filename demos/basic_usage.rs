// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic holiday-sync usage example.
//!
//! Demonstrates:
//! 1. Connecting to a local SQLite file and the public Nager.Date API
//! 2. Running an initial load for two years
//! 3. Re-running it (nothing should be written the second time)
//! 4. Paging through search results
//! 5. Displaying metrics
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use holiday_sync::{HolidayFilter, HolidaySyncConfig, HolidaySyncEngine, PageRequest};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

const DB_PATH: &str = "./holiday_sync_demo.db";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           holiday-sync: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Configure and connect
    // ─────────────────────────────────────────────────────────────────────────
    let config = HolidaySyncConfig {
        sql_url: Some(format!("sqlite://{}?mode=rwc", DB_PATH)),
        start_year: 2024,
        end_year: 2025,
        ..Default::default()
    };
    println!("📦 Connecting to {} and {}", DB_PATH, config.provider_base_url);
    let engine = HolidaySyncEngine::connect(config).await?;

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Initial load, twice
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🚀 Initial load...");
    let started = std::time::Instant::now();
    let report = engine.initial_load().await;
    println!("   └─ {} ({:?})", report, started.elapsed());

    println!("\n🔁 Initial load again (should write nothing)...");
    let report = engine.initial_load().await;
    println!("   └─ {}", report);

    let countries = engine.countries().await?;
    println!("\n🌍 {} countries stored", countries.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Search
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Korean holidays in 2025, 5 per page:");
    let filter = HolidayFilter::new().country("KR").year(2025);
    let mut page_no = 0;
    loop {
        let page = engine.search(&filter, &PageRequest::new(page_no, 5)).await?;
        println!("   ├─ page {}/{} ({} total)", page.page + 1, page.total_pages.max(1), page.total_elements);
        for h in &page.content {
            println!("   │  └─ {} {} / {} [{}]", h.date, h.name, h.local_name, h.types);
        }
        if page.last {
            break;
        }
        page_no += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    drop(engine);
    let _ = std::fs::remove_file(DB_PATH);
    let _ = std::fs::remove_file(format!("{}-shm", DB_PATH));
    let _ = std::fs::remove_file(format!("{}-wal", DB_PATH));

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");
    Ok(())
}

fn dump_metrics(snapshotter: &Snapshotter) {
    let mut lines: Vec<String> = Vec::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() { String::new() } else { format!("{{{}}}", labels.join(",")) };
        let rendered = match value {
            DebugValue::Counter(v) => format!("{}", v),
            DebugValue::Gauge(v) => format!("{:.2}", v.into_inner()),
            DebugValue::Histogram(samples) => {
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                format!("count={} sum={:.4}", samples.len(), sum)
            }
        };
        lines.push(format!("{}{} = {}", key.name(), label_str, rendered));
    }
    lines.sort();

    if lines.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
    for line in &lines {
        println!("   └─ {}", line);
    }
}
