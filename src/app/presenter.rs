use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

use crate::app::view::StockView;
use crate::fetch::{CancelSignal, FetchOrchestrator, FetchRequest, FetchResult, DEFAULT_TIMEOUT};
use crate::records::Ticker;

struct ActiveSearch {
    signal: CancelSignal,
    label: String,
}

/// Drives searches on behalf of a view. At most one search is live at a time: starting a
/// new one cancels the previous one first.
///
/// Only the search that still owns the active slot when it finishes renders its outcome.
/// A search that was cancelled or superseded has its status shown at that moment instead.
pub struct SearchPresenter<V> {
    orchestrator: FetchOrchestrator,
    view: V,
    timeout: Duration,
    active: Mutex<Option<ActiveSearch>>,
}

impl<V: StockView> SearchPresenter<V> {
    pub fn new(orchestrator: FetchOrchestrator, view: V) -> Self {
        Self {
            orchestrator,
            view,
            timeout: DEFAULT_TIMEOUT,
            active: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn is_searching(&self) -> bool {
        self.active_slot().is_some()
    }

    /// Cancel the in-flight search, if any. Returns whether there was one.
    pub fn cancel_active(&self) -> bool {
        let mut slot = self.active_slot();
        let Some(previous) = slot.take() else {
            return false;
        };
        previous.signal.cancel();
        self.show_cancelled(&previous.label);
        self.view.set_busy(false);
        true
    }

    pub async fn search(&self, symbols: Vec<Ticker>) -> FetchResult {
        let started = Instant::now();
        let label = describe(&symbols);
        let cancel = self.begin(&label);

        let result = match FetchRequest::new(symbols, cancel.clone())
            .and_then(|request| request.with_timeout(self.timeout))
        {
            Ok(request) => self.orchestrator.run(request).await,
            Err(err) => FetchResult::Failed(err.to_string()),
        };

        self.finish(&cancel, &result, &label, started.elapsed());
        result
    }

    // View updates happen under the slot lock so they follow slot ownership.
    fn begin(&self, label: &str) -> CancelSignal {
        let signal = CancelSignal::new();
        let mut slot = self.active_slot();
        let previous = slot.replace(ActiveSearch {
            signal: signal.clone(),
            label: label.to_string(),
        });
        if let Some(previous) = previous {
            debug!("Superseding the in-flight search for {}", previous.label);
            previous.signal.cancel();
            self.show_cancelled(&previous.label);
        }
        self.view.set_busy(true);
        signal
    }

    fn finish(&self, signal: &CancelSignal, result: &FetchResult, label: &str, elapsed: Duration) {
        let mut slot = self.active_slot();
        let owned = slot
            .as_ref()
            .is_some_and(|active| active.signal.same_as(signal));
        if !owned {
            debug!("Dropping outcome of superseded search for {}", label);
            return;
        }
        *slot = None;
        self.render(result, label, elapsed);
        self.view.set_busy(false);
    }

    fn active_slot(&self) -> MutexGuard<'_, Option<ActiveSearch>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show_cancelled(&self, label: &str) {
        self.view
            .show_status(&format!("Cancelled loading stocks for {label}"));
    }

    fn render(&self, result: &FetchResult, label: &str, elapsed: Duration) {
        match result {
            FetchResult::Rows(rows) => {
                self.view.show_rows(rows);
                if rows.is_empty() {
                    self.view.show_status(&format!("No stocks found for {label}"));
                } else {
                    self.view.show_status(&format!(
                        "Loaded stocks for {label} in {}ms",
                        elapsed.as_millis()
                    ));
                }
            }
            FetchResult::Cancelled => self.show_cancelled(label),
            FetchResult::TimedOut => self.view.show_error(&format!(
                "Timeout: could not load stocks for {label} within {}ms",
                self.timeout.as_millis()
            )),
            FetchResult::Failed(reason) => self.view.show_error(reason),
        }
    }
}

fn describe(symbols: &[Ticker]) -> String {
    symbols
        .iter()
        .map(Ticker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::app::view::{RecordingView, ViewEvent};
    use crate::services::MockStockService;

    fn presenter(source: MockStockService, timeout_ms: u64) -> SearchPresenter<RecordingView> {
        SearchPresenter::new(
            FetchOrchestrator::new(Arc::new(source)),
            RecordingView::default(),
        )
        .with_timeout(Duration::from_millis(timeout_ms))
    }

    fn tickers(symbols: &[&str]) -> Vec<Ticker> {
        Ticker::parse_list(symbols.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn shows_rows_and_load_time() {
        let presenter = presenter(MockStockService::sample().unwrap(), 2_000);

        let result = presenter.search(tickers(&["MSFT", "AAPL"])).await;

        assert!(result.is_rows());
        let events = presenter.view().events();
        assert_eq!(events.first(), Some(&ViewEvent::Busy(true)));
        assert_eq!(events.last(), Some(&ViewEvent::Busy(false)));
        assert!(events.contains(&ViewEvent::Rows(5)));
        assert!(events.iter().any(|event| matches!(
            event,
            ViewEvent::Status(text) if text.starts_with("Loaded stocks for MSFT, AAPL in")
        )));
        assert!(!presenter.is_searching());
    }

    #[tokio::test]
    async fn empty_result_still_reports_status() {
        let presenter = presenter(MockStockService::sample().unwrap(), 2_000);

        presenter.search(tickers(&["NOPE"])).await;

        assert!(presenter
            .view()
            .events()
            .contains(&ViewEvent::Status("No stocks found for NOPE".to_string())));
    }

    #[tokio::test]
    async fn new_search_cancels_the_previous_one() {
        let source = MockStockService::sample().unwrap().with_ticker_delay("MSFT", Duration::from_secs(10));
        let presenter = Arc::new(presenter(source, 20_000));

        let first = {
            let presenter = Arc::clone(&presenter);
            tokio::spawn(async move { presenter.search(tickers(&["MSFT"])).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(presenter.is_searching());

        let second = presenter.search(tickers(&["AAPL"])).await;
        let first = tokio::time::timeout(Duration::from_secs(1), first)
            .await
            .expect("superseded search should finish promptly")
            .unwrap();

        assert_eq!(first, FetchResult::Cancelled);
        assert!(second.is_rows());
        assert!(!presenter.is_searching());
        assert!(presenter
            .view()
            .events()
            .contains(&ViewEvent::Status("Cancelled loading stocks for MSFT".to_string())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn superseded_search_never_has_the_last_word() {
        for _ in 0..50 {
            let source =
                MockStockService::sample().unwrap().with_ticker_delay("MSFT", Duration::from_secs(10));
            let presenter = Arc::new(presenter(source, 20_000));

            let first = {
                let presenter = Arc::clone(&presenter);
                tokio::spawn(async move { presenter.search(tickers(&["MSFT"])).await })
            };
            while !presenter.is_searching() {
                tokio::task::yield_now().await;
            }

            presenter.search(tickers(&["AAPL"])).await;
            assert_eq!(first.await.unwrap(), FetchResult::Cancelled);

            let events = presenter.view().events();
            let statuses: Vec<&String> = events
                .iter()
                .filter_map(|event| match event {
                    ViewEvent::Status(text) => Some(text),
                    _ => None,
                })
                .collect();
            assert_eq!(
                statuses.first().map(|text| text.as_str()),
                Some("Cancelled loading stocks for MSFT")
            );
            assert!(
                statuses
                    .last()
                    .is_some_and(|text| text.starts_with("Loaded stocks for AAPL")),
                "{statuses:?}"
            );
            assert_eq!(
                statuses
                    .iter()
                    .filter(|text| text.contains("MSFT"))
                    .count(),
                1
            );
            assert_eq!(events.last(), Some(&ViewEvent::Busy(false)));
        }
    }

    #[tokio::test]
    async fn cancel_active_stops_the_search() {
        let source = MockStockService::sample().unwrap().with_delay(Duration::from_secs(10));
        let presenter = Arc::new(presenter(source, 20_000));
        assert!(!presenter.cancel_active());

        let search = {
            let presenter = Arc::clone(&presenter);
            tokio::spawn(async move { presenter.search(tickers(&["MSFT"])).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(presenter.cancel_active());
        assert_eq!(search.await.unwrap(), FetchResult::Cancelled);
        assert_eq!(presenter.view().events().last(), Some(&ViewEvent::Busy(false)));
    }

    #[tokio::test]
    async fn timeout_is_reported_as_an_error() {
        let source = MockStockService::sample().unwrap().with_delay(Duration::from_secs(10));
        let presenter = presenter(source, 40);

        let result = presenter.search(tickers(&["MSFT"])).await;

        assert_eq!(result, FetchResult::TimedOut);
        assert!(presenter.view().events().contains(&ViewEvent::Error(
            "Timeout: could not load stocks for MSFT within 40ms".to_string()
        )));
    }

    #[tokio::test]
    async fn failures_surface_their_reason() {
        let source = MockStockService::sample().unwrap().with_failure("AAPL", "AAPL feed unavailable");
        let presenter = presenter(source, 2_000);

        presenter.search(tickers(&["MSFT", "AAPL"])).await;

        assert!(presenter
            .view()
            .events()
            .contains(&ViewEvent::Error("AAPL feed unavailable".to_string())));
    }

    #[tokio::test]
    async fn empty_search_is_a_visible_failure() {
        let presenter = presenter(MockStockService::sample().unwrap(), 2_000);

        let result = presenter.search(Vec::new()).await;

        assert!(matches!(result, FetchResult::Failed(_)));
        assert!(presenter
            .view()
            .events()
            .iter()
            .any(|event| matches!(event, ViewEvent::Error(_))));
        assert!(!presenter.is_searching());
    }
}
