use std::time::Duration;

use crate::error::{AppError, Result};
use crate::records::{PriceRecord, Ticker};

pub mod cancel;
pub mod decode;
pub mod orchestrator;
pub mod request;

pub use cancel::CancelSignal;
pub use orchestrator::FetchOrchestrator;
pub use request::{prepare_request, PreparedRequest, RequestConfig};

/// Budget a search gets before it is reported as timed out.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2_000);

#[inline]
pub fn ensure_concurrency_limit(limit: usize) -> usize {
    limit.max(1)
}

/// One user-initiated search: the symbols to fan out over, its cancellation handle and
/// its time budget.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    symbols: Vec<Ticker>,
    cancel: CancelSignal,
    timeout: Duration,
}

impl FetchRequest {
    pub fn new(symbols: Vec<Ticker>, cancel: CancelSignal) -> Result<Self> {
        if symbols.is_empty() {
            return Err(AppError::message("At least one ticker symbol is required"));
        }
        Ok(Self {
            symbols,
            cancel,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(AppError::message("Fetch timeout must be greater than zero"));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn symbols(&self) -> &[Ticker] {
        &self.symbols
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Terminal outcome of a search. Exactly one is produced per [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Rows(Vec<PriceRecord>),
    Cancelled,
    TimedOut,
    Failed(String),
}

impl FetchResult {
    pub fn rows(&self) -> Option<&[PriceRecord]> {
        match self {
            FetchResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn is_rows(&self) -> bool {
        matches!(self, FetchResult::Rows(_))
    }
}
