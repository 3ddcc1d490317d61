//! One caller submitting the same document twenty times.
//!
//! With the default limit of 5 requests per second, the twenty submissions are
//! spread over four windows. Set `CRPT_ENDPOINT` to point at another host and
//! `RUST_LOG=debug` to see admissions.

use crpt_throttle::{codec, CrptClient, DEFAULT_ENDPOINT};
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let endpoint = std::env::var("CRPT_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let client = CrptClient::builder()
        .with_request_limit(5)
        .with_window(Duration::from_secs(1))
        .with_endpoint(endpoint)
        .build()?;

    let document = codec::read_document(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/document.json"))?;

    println!("=== Single Caller Example ===\n");
    println!("Limit: 5 requests per second, 20 submissions\n");

    let start = Instant::now();
    for i in 1..=20 {
        match client.create_document(&document, "Signature").await {
            Ok(body) => info!(iteration = i, bytes = body.len(), "submitted"),
            Err(e) => error!(iteration = i, error = %e, "submission failed"),
        }
    }

    client.shutdown();

    let snapshot = client.metrics().snapshot();
    println!("\n=== Example Complete ===");
    println!("Elapsed: {:?}", start.elapsed());
    println!(
        "Permits: {}, delayed: {}, submitted: {}, failed: {}",
        snapshot.permits_granted,
        snapshot.admissions_delayed,
        snapshot.documents_submitted,
        snapshot.submissions_failed
    );
    Ok(())
}
