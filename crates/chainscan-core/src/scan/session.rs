use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender};

use crate::scan::{
    aggregator::{ApplyOutcome, ResultAggregator},
    fetchers::ScanFetcher,
    orchestrator::{ScanOrchestrator, ScanResult},
    ordering::RowOrdering,
};

/// User controls accepted while a scan view is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    /// Re-dispatch every failed sub-row
    Retry,
    /// Open the explorer or portfolio page for the scanned subject
    Open,
    /// Leave the view without waiting for in-flight tasks
    Quit,
}

/// Renders scan state. Called from the consumer loop after every state change.
///
/// Implementations must cope with being handed the same state more than once.
pub trait PresentationSink<P> {
    fn render(&mut self, view: &ResultAggregator<P>);

    /// One-line status message (e.g. "nothing to retry").
    fn status(&mut self, _message: &str) {}

    /// Opens `url` for the user.
    fn open(&mut self, _url: &str) {}
}

/// Summary returned when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Sub-rows in `Done`
    pub done: usize,
    /// Sub-rows in `Error`
    pub errors: usize,
    /// Whether every dispatched target had reported when the session ended
    pub completed: bool,
    pub stale_dropped: u64,
}

/// Controller tying the orchestrator, the aggregator and a presentation sink together.
///
/// `run` is the single consumer of result messages; rows are only ever mutated from there.
pub struct ScanSession<P> {
    aggregator: ResultAggregator<P>,
    orchestrator: Arc<ScanOrchestrator>,
    fetcher: Arc<dyn ScanFetcher<P>>,
    ordering: Box<dyn RowOrdering<P>>,
    results_tx: UnboundedSender<ScanResult<P>>,
    results_rx: UnboundedReceiver<ScanResult<P>>,
    open_url: Option<String>,
    exit_on_complete: bool,
}

impl<P> ScanSession<P>
where
    P: Send + 'static,
{
    pub fn new(
        aggregator: ResultAggregator<P>,
        orchestrator: Arc<ScanOrchestrator>,
        fetcher: Arc<dyn ScanFetcher<P>>,
        ordering: Box<dyn RowOrdering<P>>,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            aggregator,
            orchestrator,
            fetcher,
            ordering,
            results_tx,
            results_rx,
            open_url: None,
            exit_on_complete: false,
        }
    }

    /// URL handed to the sink on [`ScanCommand::Open`].
    #[must_use]
    pub fn with_open_url(mut self, url: impl Into<String>) -> Self {
        self.open_url = Some(url.into());
        self
    }

    /// End the session as soon as every target has reported.
    #[must_use]
    pub fn exit_on_complete(mut self, exit: bool) -> Self {
        self.exit_on_complete = exit;
        self
    }

    fn outcome(&self) -> ScanOutcome {
        let errors = self.aggregator.error_count();
        ScanOutcome {
            done: self.aggregator.done_count() - errors,
            errors,
            completed: self.aggregator.is_complete(),
            stale_dropped: self.aggregator.stale_dropped(),
        }
    }

    /// Runs the scan until quit, or until completion when exiting on completion.
    ///
    /// A closed command channel means no more input will arrive, so the session then ends on
    /// completion as well.
    pub async fn run(
        mut self,
        mut commands: Receiver<ScanCommand>,
        sink: &mut dyn PresentationSink<P>,
    ) -> ScanOutcome {
        let initial = self.aggregator.start();
        self.orchestrator.dispatch(initial, &self.fetcher, &self.results_tx);
        sink.render(&self.aggregator);

        let mut commands_open = true;

        loop {
            if self.aggregator.is_complete() && (self.exit_on_complete || !commands_open) {
                break;
            }

            tokio::select! {
                Some(result) = self.results_rx.recv() => {
                    if self.aggregator.apply(result) == ApplyOutcome::Accepted {
                        self.aggregator.sort_if_complete(self.ordering.as_ref());
                        sink.render(&self.aggregator);
                    }
                }
                command = commands.recv(), if commands_open => match command {
                    None => commands_open = false,
                    Some(ScanCommand::Retry) => {
                        let dispatches = self.aggregator.retry_failed();
                        if dispatches.is_empty() {
                            sink.status("nothing to retry");
                        } else {
                            sink.status(&format!("retrying {} failed", dispatches.len()));
                            self.orchestrator.dispatch(
                                dispatches,
                                &self.fetcher,
                                &self.results_tx,
                            );
                        }
                        sink.render(&self.aggregator);
                    }
                    Some(ScanCommand::Open) => {
                        match &self.open_url {
                            Some(url) => sink.open(url),
                            None => sink.status("nothing to open"),
                        }
                        sink.render(&self.aggregator);
                    }
                    Some(ScanCommand::Quit) => {
                        tracing::info!(done = self.aggregator.done_count(), "scan quit by user");
                        break;
                    }
                },
                else => break,
            }
        }

        self.outcome()
    }
}
