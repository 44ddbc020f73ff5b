//! `RpcClient` and `Benchmarker` against mockito endpoints.

use crate::mock_infrastructure::RpcMockBuilder;
use chainscan_core::upstream::{
    sort_fastest_first, Benchmarker, RpcClient, RpcClientConfig, ScanError,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

const DEAD_URL: &str = "http://127.0.0.1:1";

fn client() -> Arc<RpcClient> {
    Arc::new(
        RpcClient::with_config(RpcClientConfig {
            request_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(1),
            ..RpcClientConfig::default()
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_block_number() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_block_number(0x1234);

    let block = client().block_number(&mock.url()).await.unwrap();

    assert_eq!(block, 0x1234);
    mock.assert_all();
}

#[tokio::test]
async fn test_get_balance_and_gas_price() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_get_balance(1_500_000_000_000_000_000).mock_gas_price(21_000_000_000);
    let client = client();

    let balance = client
        .get_balance(&mock.url(), "0x00000000219ab540356cbb839cbe05303d7705fa")
        .await
        .unwrap();
    let gas = client.gas_price(&mock.url()).await.unwrap();

    assert_eq!(balance, 1_500_000_000_000_000_000);
    assert_eq!(gas, 21_000_000_000);
}

#[tokio::test]
async fn test_rpc_error_object() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_rpc_error("eth_gasPrice", -32005, "rate limited");

    let err = client().gas_price(&mock.url()).await.unwrap_err();

    assert_eq!(err, ScanError::Rpc { code: -32005, message: "rate limited".to_string() });
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_status_error() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_server_error(503);

    let err = client().block_number(&mock.url()).await.unwrap_err();

    assert!(matches!(err, ScanError::Http(503, _)));
}

#[tokio::test]
async fn test_non_quantity_result_is_protocol_error() {
    let mut mock = RpcMockBuilder::new().await;
    mock.mock_raw_result("eth_blockNumber", json!({ "unexpected": true }));

    let err = client().block_number(&mock.url()).await.unwrap_err();

    assert_eq!(err.kind(), "protocol");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let err = client().block_number(DEAD_URL).await.unwrap_err();

    assert!(matches!(err, ScanError::Network(_)), "got {err:?}");
    assert!(!err.to_string().contains("127.0.0.1"));
}

#[tokio::test]
async fn test_benchmark_over_http() {
    let mut healthy = RpcMockBuilder::new().await;
    healthy.mock_block_number(100);
    let mut failing = RpcMockBuilder::new().await;
    failing.mock_server_error(500);

    let benchmarker = Benchmarker::new(client());
    let urls = vec![DEAD_URL.to_string(), failing.url(), healthy.url()];

    let mut results = benchmarker.benchmark(&urls, Duration::from_secs(3)).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().map(|r| r.url.clone()).collect::<Vec<_>>(), urls);

    sort_fastest_first(&mut results);
    assert_eq!(results[0].url, healthy.url());
    assert_eq!(results[0].block(), Some(100));
    assert!(results[1..].iter().all(|r| !r.is_healthy()));
}
