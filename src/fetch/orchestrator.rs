use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::fetch::{ensure_concurrency_limit, CancelSignal, FetchRequest, FetchResult};
use crate::records::{PriceRecord, Ticker};
use crate::services::PriceSource;

type FetchHandle = JoinHandle<Result<Vec<PriceRecord>>>;

/// Fans a search out into one fetch per ticker and races the aggregate against the
/// request's timeout and cancellation signal.
///
/// The race is polled in a fixed order: cancellation first, then the timeout, then
/// completion of the fetches. When more than one is ready at the same poll the earlier
/// one wins.
pub struct FetchOrchestrator {
    source: Arc<dyn PriceSource>,
    concurrency_limit: Option<usize>,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            concurrency_limit: None,
        }
    }

    /// Cap how many fetches of one search may be in flight at once.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(ensure_concurrency_limit(limit));
        self
    }

    pub async fn run(&self, request: FetchRequest) -> FetchResult {
        let started = Instant::now();
        let cancel = request.cancel_signal().clone();
        let fetch_signal = cancel.child();

        debug!(
            "Fetching {} symbol(s) with a {}ms budget",
            request.symbols().len(),
            request.timeout().as_millis()
        );

        let handles = self.spawn_fetches(request.symbols(), &fetch_signal);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => FetchResult::Cancelled,
            _ = tokio::time::sleep(request.timeout()) => FetchResult::TimedOut,
            collected = collect_in_order(handles) => match collected {
                Ok(rows) => FetchResult::Rows(rows),
                Err(err) if err.is_cancelled() && cancel.is_cancelled() => FetchResult::Cancelled,
                Err(err) => FetchResult::Failed(err.to_string()),
            },
        };

        // Fetches still running stop at their next safe point; their output is dropped.
        fetch_signal.cancel();

        let elapsed = started.elapsed().as_millis();
        match &outcome {
            FetchResult::Rows(rows) => info!("Loaded {} row(s) in {}ms", rows.len(), elapsed),
            FetchResult::Cancelled => info!("Search cancelled after {}ms", elapsed),
            FetchResult::TimedOut => warn!(
                "Search timed out after {}ms (budget {}ms)",
                elapsed,
                request.timeout().as_millis()
            ),
            FetchResult::Failed(reason) => warn!("Search failed after {}ms: {}", elapsed, reason),
        }

        outcome
    }

    fn spawn_fetches(&self, symbols: &[Ticker], signal: &CancelSignal) -> Vec<(Ticker, FetchHandle)> {
        let limiter = self
            .concurrency_limit
            .map(|limit| Arc::new(Semaphore::new(limit)));

        symbols
            .iter()
            .map(|ticker| {
                let source = Arc::clone(&self.source);
                let signal = signal.clone();
                let limiter = limiter.clone();
                let symbol = ticker.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match limiter {
                        Some(limiter) => Some(tokio::select! {
                            _ = signal.cancelled() => return Err(AppError::Cancelled),
                            permit = limiter.acquire_owned() => permit
                                .map_err(|_| AppError::message("Fetch limiter closed"))?,
                        }),
                        None => None,
                    };
                    signal.ensure_active()?;
                    source.fetch(&symbol, &signal).await
                });

                (ticker.clone(), handle)
            })
            .collect()
    }
}

/// Wait for every fetch, failing on the first error observed. Rows are merged in the
/// order the fetches were issued, regardless of completion order.
async fn collect_in_order(handles: Vec<(Ticker, FetchHandle)>) -> Result<Vec<PriceRecord>> {
    let mut slots: Vec<Option<Vec<PriceRecord>>> = (0..handles.len()).map(|_| None).collect();

    let mut pending: FuturesUnordered<_> = handles
        .into_iter()
        .enumerate()
        .map(|(index, (ticker, handle))| async move { (index, ticker, handle.await) })
        .collect();

    while let Some((index, ticker, joined)) = pending.next().await {
        let records = match joined {
            Ok(Ok(records)) => records,
            Ok(Err(err)) => {
                debug!("Fetch for {} failed: {}", ticker, err);
                return Err(err);
            }
            Err(join_err) => {
                return Err(AppError::source_error(format!(
                    "Fetch task for {} failed: {}",
                    ticker, join_err
                )));
            }
        };
        debug!("Fetch for {} returned {} row(s)", ticker, records.len());
        slots[index] = Some(records);
    }

    Ok(slots.into_iter().flatten().flatten().collect())
}
