//! Full scan sessions driven through the orchestrator, aggregator and session loop.

use crate::mock_infrastructure::{
    RetryOnceSink, ScriptedFetcher, ScriptedProbe, StaticSource, Step,
};
use chainscan_core::{
    scan::{
        CombinedStatus, GasPriceOrdering, GasPricePayload, LatencyOrdering, OrchestratorConfig,
        ResultAggregator, RowOrdering, RowStatus, ScanFetcher, ScanOrchestrator, ScanOutcome,
        ScanSession,
    },
    types::{NetworkMode, ScanTarget},
    upstream::{Benchmarker, EndpointSelector},
};
use std::sync::Arc;
use tokio::sync::mpsc;

const MAINNET: NetworkMode = NetworkMode::Mainnet;
const TESTNET: NetworkMode = NetworkMode::Testnet;

fn orchestrator(source: StaticSource) -> Arc<ScanOrchestrator> {
    let selector =
        Arc::new(EndpointSelector::new(Benchmarker::new(Arc::new(ScriptedProbe::default()))));
    Arc::new(ScanOrchestrator::new(selector, Arc::new(source), OrchestratorConfig::default()))
}

fn one_url_each(chains: &[&str], modes: &[NetworkMode]) -> StaticSource {
    let mut source = StaticSource::default();
    for chain in chains {
        for mode in modes {
            let url = format!("http://{chain}-{mode}");
            source = source.with(chain, *mode, &[url.as_str()]);
        }
    }
    source
}

fn aggregator(chains: &[&str], modes: &[NetworkMode]) -> ResultAggregator<GasPricePayload> {
    let mut aggregator = ResultAggregator::new(48);
    for chain in chains {
        for mode in modes {
            aggregator.register(&ScanTarget::new(*chain, *mode), chain, "ETH");
        }
    }
    aggregator
}

async fn run(
    chains: &[&str],
    modes: &[NetworkMode],
    fetcher: Arc<ScriptedFetcher>,
    ordering: Box<dyn RowOrdering<GasPricePayload>>,
    retry: bool,
) -> (ScanOutcome, RetryOnceSink) {
    let (tx, rx) = mpsc::channel(4);
    let mut sink = RetryOnceSink::new(tx, retry);
    let dyn_fetcher: Arc<dyn ScanFetcher<GasPricePayload>> = fetcher;

    let outcome = ScanSession::new(
        aggregator(chains, modes),
        orchestrator(one_url_each(chains, modes)),
        dyn_fetcher,
        ordering,
    )
    .run(rx, &mut sink)
    .await;

    (outcome, sink)
}

#[tokio::test(start_paused = true)]
async fn test_results_sorted_by_latency_both_directions() {
    let fetcher = || {
        Arc::new(
            ScriptedFetcher::default()
                .with("a", MAINNET, &[Step::Ok { delay_ms: 50, wei: 50 }])
                .with("b", MAINNET, &[Step::Ok { delay_ms: 10, wei: 10 }])
                .with("c", MAINNET, &[Step::Ok { delay_ms: 200, wei: 200 }]),
        )
    };

    let (outcome, sink) =
        run(&["a", "b", "c"], &[MAINNET], fetcher(), Box::new(GasPriceOrdering), false).await;
    assert_eq!(outcome.done, 3);
    let last = sink.last().unwrap();
    assert!(last.sorted);
    assert_eq!(last.order, vec!["b", "a", "c"]);

    let (_, sink) = run(
        &["a", "b", "c"],
        &[MAINNET],
        fetcher(),
        Box::new(LatencyOrdering::descending()),
        false,
    )
    .await;
    assert_eq!(sink.last().unwrap().order, vec!["c", "a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_target_times_out_without_blocking_others() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with("fast", MAINNET, &[Step::Ok { delay_ms: 20, wei: 1 }])
            .with("slow", MAINNET, &[Step::Ok { delay_ms: 10_000, wei: 2 }])
            .with("mid", MAINNET, &[Step::Ok { delay_ms: 40, wei: 3 }]),
    );

    let (outcome, sink) =
        run(&["fast", "slow", "mid"], &[MAINNET], fetcher, Box::new(GasPriceOrdering), false)
            .await;

    assert!(outcome.completed);
    assert_eq!(outcome.done, 2);
    assert_eq!(outcome.errors, 1);

    // both healthy rows were reported before the slow one timed out
    let two_done = sink.frames.iter().position(|f| f.done == 2).unwrap();
    let three_done = sink.frames.iter().position(|f| f.done == 3).unwrap();
    assert!(two_done < three_done);

    assert_eq!(sink.last().unwrap().order, vec!["fast", "mid", "slow"]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_redispatches_only_failed_target() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with("fast", MAINNET, &[Step::Ok { delay_ms: 20, wei: 5 }])
            .with(
                "slow",
                MAINNET,
                &[Step::Ok { delay_ms: 10_000, wei: 1 }, Step::Ok { delay_ms: 30, wei: 1 }],
            )
            .with("mid", MAINNET, &[Step::Ok { delay_ms: 40, wei: 3 }]),
    );

    let (outcome, sink) = run(
        &["fast", "slow", "mid"],
        &[MAINNET],
        fetcher.clone(),
        Box::new(GasPriceOrdering),
        true,
    )
    .await;

    assert_eq!(fetcher.attempts("fast", MAINNET), 1);
    assert_eq!(fetcher.attempts("mid", MAINNET), 1);
    assert_eq!(fetcher.attempts("slow", MAINNET), 2);

    assert!(outcome.completed);
    assert_eq!(outcome.done, 3);
    assert_eq!(outcome.errors, 0);
    assert!(sink.statuses.iter().any(|s| s == "retrying 1 failed"));

    let last = sink.last().unwrap();
    assert!(last.sorted);
    assert_eq!(last.order, vec!["slow", "mid", "fast"]);
}

#[tokio::test(start_paused = true)]
async fn test_dual_mode_half_done_retry_touches_testnet_only() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with("ethereum", MAINNET, &[Step::Ok { delay_ms: 10, wei: 20 }])
            .with(
                "ethereum",
                TESTNET,
                &[Step::Fail { delay_ms: 5 }, Step::Ok { delay_ms: 5, wei: 1 }],
            )
            .with("polygon", MAINNET, &[Step::Ok { delay_ms: 15, wei: 30 }])
            .with("polygon", TESTNET, &[Step::Ok { delay_ms: 15, wei: 2 }]),
    );
    let chains = ["ethereum", "polygon"];
    let modes = [MAINNET, TESTNET];

    let mut view = aggregator(&chains, &modes);
    let orchestrator = orchestrator(one_url_each(&chains, &modes));
    let dyn_fetcher: Arc<dyn ScanFetcher<GasPricePayload>> = fetcher.clone();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let dispatches = view.start();
    assert_eq!(dispatches.len(), 4);
    orchestrator.dispatch(dispatches, &dyn_fetcher, &tx);
    while !view.is_complete() {
        view.apply(rx.recv().await.unwrap());
    }

    let eth = view.row("ethereum").unwrap();
    assert_eq!(eth.combined_status(), CombinedStatus::HalfDone);
    assert_eq!(eth.combined_status().label(true), "half-done");
    let mainnet_before = eth.sub_row(MAINNET).unwrap().clone();
    assert_eq!(view.row("polygon").unwrap().combined_status().label(true), "both-done");

    let retries = view.retry_failed();
    assert_eq!(retries.len(), 1);
    assert_eq!(retries[0].target, ScanTarget::new("ethereum", TESTNET));

    let eth = view.row("ethereum").unwrap();
    assert_eq!(eth.sub_row(TESTNET).unwrap().status, RowStatus::Fetching);
    let mainnet_now = eth.sub_row(MAINNET).unwrap();
    assert_eq!(mainnet_now.status, RowStatus::Done);
    assert_eq!(mainnet_now.generation, mainnet_before.generation);
    assert_eq!(mainnet_now.payload, mainnet_before.payload);

    orchestrator.dispatch(retries, &dyn_fetcher, &tx);
    while !view.is_complete() {
        view.apply(rx.recv().await.unwrap());
    }

    assert_eq!(view.row("ethereum").unwrap().combined_status(), CombinedStatus::Done);
    assert_eq!(fetcher.attempts("ethereum", MAINNET), 1);
    assert_eq!(fetcher.total_attempts(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_late_result_from_superseded_attempt_is_dropped() {
    let fetcher = Arc::new(ScriptedFetcher::default().with(
        "a",
        MAINNET,
        &[Step::Fail { delay_ms: 10 }, Step::Ok { delay_ms: 10, wei: 9 }],
    ));
    let mut view = aggregator(&["a"], &[MAINNET]);
    let orchestrator = orchestrator(one_url_each(&["a"], &[MAINNET]));
    let dyn_fetcher: Arc<dyn ScanFetcher<GasPricePayload>> = fetcher;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let first = view.start();
    orchestrator.dispatch(first.clone(), &dyn_fetcher, &tx);
    view.apply(rx.recv().await.unwrap());
    assert_eq!(view.error_count(), 1);

    let retry = view.retry_failed();
    orchestrator.dispatch(retry, &dyn_fetcher, &tx);
    // replay the first dispatch: its generation is superseded and must not land
    orchestrator.dispatch(first, &dyn_fetcher, &tx);

    view.apply(rx.recv().await.unwrap());
    view.apply(rx.recv().await.unwrap());

    assert!(view.is_complete());
    assert_eq!(view.stale_dropped(), 1);
    let sub = view.row("a").unwrap().sub_row(MAINNET).unwrap();
    assert_eq!(sub.status, RowStatus::Done);
    assert_eq!(sub.payload, Some(GasPricePayload { wei: 9 }));
}
