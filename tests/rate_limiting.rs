use crpt_throttle::infrastructure::mocks::{MockCaptureLayer, MockTransport};
use crpt_throttle::{CrptClient, CrptError, Document, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn document(id: usize) -> Document {
    Document {
        doc_id: Some(id.to_string()),
        ..Document::default()
    }
}

fn client(limit: u32, window: Duration, transport: &MockTransport) -> CrptClient {
    CrptClient::builder()
        .with_request_limit(limit)
        .with_window(window)
        .with_transport(Arc::new(transport.clone()))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_seven_concurrent_calls_with_limit_five() {
    let transport = MockTransport::new();
    let client = client(5, Duration::from_secs(1), &transport);
    let start = Instant::now();

    let handles: Vec<_> = (0..7)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.create_document(&document(i), "sig").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let offsets: Vec<Duration> = transport
        .submissions()
        .iter()
        .map(|s| s.at - start)
        .collect();

    assert_eq!(offsets.len(), 7);
    assert_eq!(
        offsets.iter().filter(|d| **d < Duration::from_secs(1)).count(),
        5
    );
    assert_eq!(
        offsets.iter().filter(|d| **d >= Duration::from_secs(1)).count(),
        2
    );

    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.permits_granted, 7);
    assert_eq!(snapshot.admissions_delayed, 2);
    assert_eq!(snapshot.documents_submitted, 7);
}

#[tokio::test(start_paused = true)]
async fn test_no_window_exceeds_limit() {
    let transport = MockTransport::new();
    let window = Duration::from_secs(60);
    let client = client(3, window, &transport);
    let start = Instant::now();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.create_document(&document(i), "sig").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let submissions = transport.submissions();
    assert_eq!(submissions.len(), 20);

    // Any span shorter than the window holds at most `limit` submissions
    for (i, first) in submissions.iter().enumerate() {
        let in_span = submissions[i..]
            .iter()
            .take_while(|s| s.at - first.at < window)
            .count();
        assert!(in_span <= 3, "{} submissions within one window", in_span);
    }

    // 20 requests at 3 per window need 7 windows
    let last = submissions.last().unwrap().at - start;
    assert!(last >= Duration::from_secs(6 * 60));
    assert!(last < Duration::from_secs(7 * 60));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_waiting_callers() {
    let transport = MockTransport::new();
    let client = client(1, Duration::from_secs(3600), &transport);
    client.create_document(&document(0), "sig").await.unwrap();

    let waiting: Vec<_> = (1..4)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.create_document(&document(i), "sig").await })
        })
        .collect();

    time::sleep(Duration::from_secs(1)).await;
    client.shutdown();

    for handle in waiting {
        assert_eq!(handle.await.unwrap(), Err(CrptError::Closed));
    }
    assert_eq!(transport.submissions().len(), 1);

    // Later calls fail without waiting
    let before = Instant::now();
    let result = client.create_document(&document(9), "sig").await;
    assert!(result.unwrap_err().is_closed());
    assert!(before.elapsed() < Duration::from_millis(1));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_caller_keeps_its_permit_unused() {
    let transport = MockTransport::new();
    let client = client(1, Duration::from_secs(10), &transport);
    client.create_document(&document(0), "sig").await.unwrap();

    let cancelled = client
        .create_document_until(&document(1), "sig", time::sleep(Duration::from_secs(2)))
        .await;
    assert_eq!(cancelled, Err(CrptError::Cancelled));

    // The next window's permit is still there for the next caller
    let start = Instant::now();
    client.create_document(&document(2), "sig").await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(8));
    assert!(start.elapsed() < Duration::from_secs(9));
    assert_eq!(transport.submissions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_queued_caller_cancels_on_time() {
    let transport = MockTransport::new();
    let client = client(1, Duration::from_secs(60), &transport);
    client.create_document(&document(0), "sig").await.unwrap();

    let parked = {
        let client = client.clone();
        tokio::spawn(async move { client.create_document(&document(1), "sig").await })
    };
    time::sleep(Duration::from_millis(10)).await;

    let start = Instant::now();
    let cancelled = client
        .create_document_until(&document(2), "sig", time::sleep(Duration::from_secs(5)))
        .await;
    assert_eq!(cancelled, Err(CrptError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(6));

    parked.await.unwrap().unwrap();
    assert_eq!(transport.submissions().len(), 2);
    assert_eq!(client.limiter().available_permits(), 0);
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    let transport = MockTransport::new();
    transport.push_response(Err(TransportError::Timeout {
        endpoint: "https://ismp.crpt.ru/api/v3/lk/documents/create".to_string(),
    }));
    let client = client(5, Duration::from_secs(1), &transport);

    let result = client.create_document(&document(1), "sig").await;
    assert!(matches!(
        result,
        Err(CrptError::Transport(TransportError::Timeout { .. }))
    ));

    // The next call is unaffected
    assert_eq!(client.create_document(&document(2), "sig").await.unwrap(), "{}");
    assert_eq!(client.metrics().submissions_failed(), 1);
    assert_eq!(client.metrics().documents_submitted(), 1);
}

#[tokio::test]
async fn test_submission_is_logged() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = MockTransport::new().with_default_response(r#"{"value":"accepted"}"#);
    transport.push_response(Err(TransportError::Body {
        reason: "connection reset".to_string(),
    }));
    let client = client(5, Duration::from_secs(1), &transport);

    let _ = client.create_document(&document(7), "sig").await;
    client.create_document(&document(8), "sig").await.unwrap();

    let failures = capture.with_message("document submission failed");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].level, Level::ERROR);
    assert_eq!(failures[0].field("doc_id"), Some("7"));

    let submitted = capture.with_message("document submitted");
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].level, Level::INFO);
    assert_eq!(submitted[0].field("doc_id"), Some("8"));
    assert_eq!(submitted[0].field("response"), Some(r#"{"value":"accepted"}"#));
}
