mod fridge;

use chrono::Utc;
use clap::Parser;
use fridge::{out_of_safe_range, Fridge, SAFE_TEMP_MAX, SAFE_TEMP_MIN};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Scripted load generator for the Smart Fridge REST API.
#[derive(Debug, Parser)]
#[command(name = "simulator")]
struct Args {
    /// Base URL of the fridge API
    #[arg(long, env = "REST_API_BASE_URL", default_value = "http://127.0.0.1:8080")]
    api_base: String,

    /// Number of simulated fridges
    #[arg(long, env = "DEVICES", default_value_t = 1)]
    devices: usize,

    /// Device id prefix; fridges are named <prefix>01, <prefix>02, ...
    #[arg(long, env = "DEVICE_PREFIX", default_value = "MyFridge")]
    device_prefix: String,

    /// Milliseconds between ticks
    #[arg(long, env = "TICK_INTERVAL_MS", default_value_t = 1000)]
    tick_interval_ms: u64,

    /// Total ticks to run; 0 runs forever
    #[arg(long, env = "TICKS", default_value_t = 0)]
    ticks: u64,

    /// Sync local inventory to the API every N ticks; 0 disables syncing
    #[arg(long, env = "SYNC_EVERY", default_value_t = 10)]
    sync_every: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting Smart Fridge simulator");
    info!(
        "API: {}, devices: {}, tick interval: {}ms",
        args.api_base, args.devices, args.tick_interval_ms
    );

    let client = reqwest::Client::new();
    let mut rng = rand::thread_rng();

    let mut fridges: Vec<Fridge> = (0..args.devices)
        .map(|i| Fridge::new(format!("{}{:02}", args.device_prefix, i + 1), &mut rng))
        .collect();

    fetch_recipes(&client, &args.api_base).await;

    let interval = Duration::from_millis(args.tick_interval_ms);
    let mut tick = 0u64;

    loop {
        tick += 1;
        let tick_start = Instant::now();

        for fridge in &mut fridges {
            let temperature = fridge.step_temperature(&mut rng);
            if out_of_safe_range(temperature) {
                warn!(
                    "ALERT: {} temperature {:.2}°C out of safe range ({:.1}-{:.1})",
                    fridge.device_id, temperature, SAFE_TEMP_MIN, SAFE_TEMP_MAX
                );
            }
            post_telemetry(&client, &args.api_base, fridge).await;
        }

        if args.sync_every > 0 && tick % args.sync_every == 0 {
            for fridge in &fridges {
                report_inventory_state(fridge);
                sync_inventory(&client, &args.api_base, fridge).await;
            }
        }

        if args.ticks > 0 && tick >= args.ticks {
            info!("Completed {} ticks, exiting", tick);
            break;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        } else {
            warn!(
                "Tick took {:?}, target was {:?} - API may be overloaded",
                elapsed, interval
            );
        }
    }
}

async fn post_telemetry(client: &reqwest::Client, base: &str, fridge: &Fridge) {
    let reading = fridge.reading();
    let url = format!("{}/telemetry", base);

    match client.post(&url).json(&reading).send().await {
        Ok(resp) if resp.status() == StatusCode::CREATED => {
            info!(
                "{}: telemetry posted ({:.2}°C)",
                fridge.device_id, reading.temperature
            );
        }
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(
                "{}: telemetry rejected: {} {}",
                fridge.device_id, status, body
            );
        }
        Err(e) => {
            error!("{}: failed to post telemetry: {}", fridge.device_id, e);
        }
    }
}

/// Pushes the local stock to the API. Items keep their generated ids, so a
/// repeat sync of an unchanged item is answered with a conflict.
async fn sync_inventory(client: &reqwest::Client, base: &str, fridge: &Fridge) {
    let url = format!("{}/inventory", base);

    for item in &fridge.items {
        match client.post(&url).json(item).send().await {
            Ok(resp) if resp.status() == StatusCode::CREATED => {
                info!("{}: inventory item posted: {}", fridge.device_id, item.item_name);
            }
            Ok(resp) if resp.status() == StatusCode::CONFLICT => {
                debug!(
                    "{}: inventory item already synced: {}",
                    fridge.device_id, item.item_name
                );
            }
            Ok(resp) => {
                warn!(
                    "{}: failed to post {}: {}",
                    fridge.device_id,
                    item.item_name,
                    resp.status()
                );
            }
            Err(e) => {
                error!(
                    "{}: error posting inventory item {}: {}",
                    fridge.device_id, item.item_name, e
                );
            }
        }
    }
}

fn report_inventory_state(fridge: &Fridge) {
    let today = Utc::now().date_naive();
    for item in &fridge.items {
        match item.days_left(today) {
            Some(days) if days <= 2 => {
                warn!(
                    "{}: {} expires in {} day(s)",
                    fridge.device_id, item.item_name, days
                );
            }
            None => {
                warn!(
                    "{}: {} has an unreadable expiration date",
                    fridge.device_id, item.item_name
                );
            }
            _ => {}
        }
        if item.low_stock() {
            warn!(
                "{}: low stock - {} only has {} left",
                fridge.device_id, item.item_name, item.quantity
            );
        }
    }
}

async fn fetch_recipes(client: &reqwest::Client, base: &str) {
    let url = format!("{}/recipes", base);

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.json::<serde_json::Value>().await {
            Ok(body) => info!("Recipe suggestions: {}", body),
            Err(e) => warn!("Failed to decode recipe suggestions: {}", e),
        },
        Ok(resp) => warn!("Failed to get recipes: {}", resp.status()),
        Err(e) => error!("Error calling recipe endpoint: {}", e),
    }
}
