//! Endpoint selection over real HTTP and scripted probes.

use crate::mock_infrastructure::{RpcMockBuilder, ScriptedProbe};
use chainscan_core::upstream::{
    Benchmarker, EndpointSelector, RpcClient, ScanError, SelectionAlgorithm,
};
use std::{sync::Arc, time::Duration};

const DEAD_URL: &str = "http://127.0.0.1:1";

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| (*u).to_string()).collect()
}

#[tokio::test]
async fn test_failover_skips_dead_endpoint_over_http() {
    let mut good = RpcMockBuilder::new().await;
    good.mock_block_number(7);
    let selector = EndpointSelector::new(Benchmarker::new(Arc::new(RpcClient::new().unwrap())));
    let candidates = vec![DEAD_URL.to_string(), good.url()];

    let first = selector
        .select("ethereum", &candidates, SelectionAlgorithm::Failover, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(first, good.url());
    assert!(selector.is_cooling_down(DEAD_URL));
    assert!(!selector.is_cooling_down(&good.url()));

    // the dead URL is now tried last, so the next call goes straight to the good one
    let second = selector
        .select("ethereum", &candidates, SelectionAlgorithm::Failover, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(second, good.url());
}

#[tokio::test(start_paused = true)]
async fn test_fastest_picks_lowest_latency_healthy() {
    let probe = Arc::new(
        ScriptedProbe::default()
            .with("http://a", 50, true)
            .with("http://b", 10, true)
            .with("http://c", 1, false),
    );
    let selector = EndpointSelector::new(Benchmarker::new(probe.clone()));

    let chosen = selector
        .select(
            "polygon",
            &urls(&["http://a", "http://b", "http://c"]),
            SelectionAlgorithm::Fastest,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(chosen, "http://b");
    assert_eq!(probe.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_fastest_all_failed_carries_last_cause() {
    let probe = Arc::new(
        ScriptedProbe::default().with("http://a", 1, false).with("http://b", 60_000, true),
    );
    let selector = EndpointSelector::new(Benchmarker::new(probe));

    let err = selector
        .select(
            "bsc",
            &urls(&["http://a", "http://b"]),
            SelectionAlgorithm::Fastest,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

    match err {
        ScanError::SelectionExhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert_eq!(*last, ScanError::Timeout(Duration::from_secs(5)));
        }
        other => panic!("expected SelectionExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_round_robin_sequence_without_probing() {
    let probe = Arc::new(ScriptedProbe::default());
    let selector = EndpointSelector::new(Benchmarker::new(probe.clone()));
    let candidates = urls(&["A", "B"]);

    let mut picked = Vec::new();
    for _ in 0..5 {
        picked.push(
            selector
                .select("ethereum", &candidates, SelectionAlgorithm::RoundRobin, Duration::ZERO)
                .await
                .unwrap(),
        );
    }

    assert_eq!(picked, urls(&["A", "B", "A", "B", "A"]));
    assert!(probe.calls().is_empty());
}

#[tokio::test]
async fn test_single_candidate_returned_for_every_algorithm() {
    let probe = Arc::new(ScriptedProbe::default());
    let selector = EndpointSelector::new(Benchmarker::new(probe.clone()));
    let candidates = urls(&["http://only"]);

    for algorithm in
        [SelectionAlgorithm::Fastest, SelectionAlgorithm::RoundRobin, SelectionAlgorithm::Failover]
    {
        let chosen =
            selector.select("base", &candidates, algorithm, Duration::from_secs(1)).await.unwrap();
        assert_eq!(chosen, "http://only");
    }
    assert!(probe.calls().is_empty());
}

#[tokio::test]
async fn test_empty_candidates_is_config_error() {
    let selector = EndpointSelector::new(Benchmarker::new(Arc::new(ScriptedProbe::default())));

    let err = selector
        .select("gnosis", &[], SelectionAlgorithm::Fastest, Duration::from_secs(1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "config");
}
