use chrono::Utc;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryPayload {
    device_id: String,
    timestamp: chrono::DateTime<Utc>,
    temperature: f64,
}

impl TelemetryPayload {
    fn random(device_id: String) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        Self {
            device_id,
            timestamp: Utc::now(),
            temperature: rng.gen_range(1.0..5.0),
        }
    }
}

fn api_base() -> String {
    std::env::var("REST_API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

#[tokio::test]
#[ignore]
async fn test_200_posts_per_second() {
    println!("\n🚀 Starting Load Test: 200 POST/s");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let test_duration_secs = 10;
    let target_rate = 200;
    let total_requests = test_duration_secs * target_rate;
    let base = api_base();
    let url = format!("{}/telemetry", base);

    let client = reqwest::Client::new();

    println!("\n📊 Test Configuration:");
    println!("  Target Rate:    {} POST/s", target_rate);
    println!("  Duration:       {} seconds", test_duration_secs);
    println!("  Total Requests: {}", total_requests);
    println!("  Endpoint:       {}", url);
    println!("  Devices:        10");

    let start = Instant::now();
    let mut created_count = 0;
    let mut error_count = 0;

    let burst_size = 20;
    let delay_per_burst = Duration::from_micros((burst_size * 1_000_000) / target_rate as u64);

    for batch_start in (0..total_requests).step_by(burst_size as usize) {
        for i in batch_start..std::cmp::min(batch_start + burst_size, total_requests) {
            let device_id = format!("load-test-dev-{}", i % 10);
            let payload = TelemetryPayload::random(device_id);

            match client.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status() == reqwest::StatusCode::CREATED => {
                    created_count += 1;
                }
                Ok(resp) => {
                    error_count += 1;
                    if error_count < 10 {
                        eprintln!("Unexpected status: {}", resp.status());
                    }
                }
                Err(e) => {
                    error_count += 1;
                    if error_count < 10 {
                        eprintln!("Send error: {}", e);
                    }
                }
            }
        }

        let elapsed = start.elapsed();
        let expected = delay_per_burst * ((batch_start / burst_size) as u32 + 1);
        if elapsed < expected {
            sleep(expected - elapsed).await;
        }

        if (batch_start + burst_size) % 500 == 0 {
            let elapsed = start.elapsed().as_secs_f64();
            let rate = (batch_start + burst_size) as f64 / elapsed;
            println!("{} requests ({:.0} POST/s)", batch_start + burst_size, rate);
        }
    }

    let duration = start.elapsed();

    println!("\n✅ Test Complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\n📈 Results:");
    println!("  Total Created:  {}", created_count);
    println!("  Errors:         {}", error_count);
    println!("  Duration:       {:.2}s", duration.as_secs_f64());
    println!(
        "  Actual Rate:    {:.2} POST/s",
        created_count as f64 / duration.as_secs_f64()
    );
    println!(
        "  Success Rate:   {:.2}%",
        (created_count as f64 / total_requests as f64) * 100.0
    );

    let actual_rate = created_count as f64 / duration.as_secs_f64();
    assert!(
        actual_rate >= 150.0,
        "Throughput too low: {:.2} POST/s (expected >= 150)",
        actual_rate
    );
    assert!(
        error_count == 0,
        "Too many errors: {} (expected 0)",
        error_count
    );

    println!("\n✅ Performance Requirements Met!");
    println!("  ✓ Throughput >= 150 POST/s");
    println!("  ✓ Error rate = 0%");
}
