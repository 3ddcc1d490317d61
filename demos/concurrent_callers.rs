//! Several tasks sharing one client.
//!
//! Ten tasks each submit twenty documents through a client limited to
//! 5 requests per minute. Submissions that have not been admitted after
//! `DEADLINE` are abandoned by shutting the client down, which releases every
//! waiting task with a "closed" error.

use crpt_throttle::{codec, CrptClient, CrptError, DEFAULT_ENDPOINT};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TASKS: usize = 10;
const PER_TASK: usize = 20;
const DEADLINE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let endpoint = std::env::var("CRPT_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let client = CrptClient::builder()
        .with_request_limit(5)
        .with_window(Duration::from_secs(60))
        .with_endpoint(endpoint)
        .build()?;

    let document = codec::read_document(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/document.json"))?;

    let mut handles = Vec::with_capacity(TASKS);
    for task in 0..TASKS {
        let client = client.clone();
        let document = document.clone();
        handles.push(tokio::spawn(async move {
            info!(task, "task started");
            for _ in 0..PER_TASK {
                match client.create_document(&document, "Signature").await {
                    Ok(_) => {}
                    Err(CrptError::Closed) => {
                        warn!(task, "client closed, stopping");
                        return;
                    }
                    Err(e) => warn!(task, error = %e, "submission failed"),
                }
            }
            info!(task, "task finished");
        }));
    }

    tokio::time::sleep(DEADLINE).await;
    client.shutdown();

    for handle in handles {
        handle.await?;
    }

    let snapshot = client.metrics().snapshot();
    println!(
        "Permits: {}, submitted: {}, failed: {}",
        snapshot.permits_granted, snapshot.documents_submitted, snapshot.submissions_failed
    );
    Ok(())
}
