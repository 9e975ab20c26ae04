//! The HTTP inference client against a local endpoint.

mod common;

use common::{client, idle_listener, serve_once};
use neuroscan_core::{InferenceClient, PredictionError, PredictionRequest};
use std::time::Duration;

fn request(n: usize) -> PredictionRequest {
    PredictionRequest {
        payloads: (0..n).map(|i| format!("data:image/png;base64,{i}")).collect(),
    }
}

#[tokio::test]
async fn posts_payloads_and_parses_scores() {
    let (url, server) = serve_once("200 OK", r#"{"result":[0.25,0.75]}"#, None).await;
    let response = client(&url, 5.0).predict(&request(2)).await.unwrap();
    assert_eq!(response.scores, [0.25, 0.75]);

    let sent: PredictionRequest = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(sent, request(2));
}

#[tokio::test]
async fn non_success_status_carries_server_message() {
    let (url, _server) = serve_once(
        "500 Internal Server Error",
        r#"{"error":"model not loaded"}"#,
        None,
    )
    .await;
    let err = client(&url, 5.0).predict(&request(1)).await.unwrap_err();
    match err {
        PredictionError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "model not loaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn body_without_result_array_is_malformed() {
    let (url, _server) = serve_once("200 OK", r#"{"result":"0.4"}"#, None).await;
    let err = client(&url, 5.0).predict(&request(1)).await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() {
    let (url, listener) = idle_listener().await;
    drop(listener);
    let err = client(&url, 5.0).predict(&request(1)).await.unwrap_err();
    assert!(matches!(err, PredictionError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn hung_server_times_out() {
    let (url, listener) = idle_listener().await;
    let _hold = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(socket);
    });
    let err = client(&url, 0.2).predict(&request(1)).await.unwrap_err();
    assert!(matches!(err, PredictionError::Timeout(_)), "{err:?}");
}
