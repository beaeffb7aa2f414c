use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use rust_decimal::Decimal;

use crate::error::{AppError, Result};
use crate::fetch::CancelSignal;
use crate::records::{PriceRecord, Ticker, TRADE_DATE_FORMAT};

use super::PriceSource;

// (ticker, trade date, volume, change, change percent)
const SAMPLE_ROWS: &[(&str, &str, i64, &str, &str)] = &[
    ("MSFT", "1/2/2018 12:00:00 AM", 22_483_797, "0.3", "0.35"),
    ("MSFT", "1/3/2018 12:00:00 AM", 26_061_439, "0.4", "0.47"),
    ("AAPL", "1/2/2018 12:00:00 AM", 25_555_934, "2.39", "1.41"),
    ("AAPL", "1/3/2018 12:00:00 AM", 29_517_899, "-0.03", "-0.02"),
    ("AAPL", "1/4/2018 12:00:00 AM", 22_434_597, "0.33", "0.19"),
    ("GOOGL", "1/2/2018 12:00:00 AM", 1_847_020, "20.12", "1.92"),
];

/// In-memory price source with optional latency and injected failures.
#[derive(Debug, Clone, Default)]
pub struct MockStockService {
    rows: HashMap<String, Vec<PriceRecord>>,
    delay: Duration,
    ticker_delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
}

impl MockStockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned rows for `MSFT`, `AAPL` and `GOOGL`.
    pub fn sample() -> Result<Self> {
        let rows = SAMPLE_ROWS
            .iter()
            .map(|&(symbol, trade_date, volume, change, change_percent)| -> Result<PriceRecord> {
                Ok(PriceRecord::new(
                    Ticker::new(symbol)?,
                    NaiveDateTime::parse_from_str(trade_date, TRADE_DATE_FORMAT)?,
                    volume,
                    Decimal::from_str(change)?,
                    Decimal::from_str(change_percent)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new().with_rows(rows))
    }

    pub fn with_rows(mut self, rows: Vec<PriceRecord>) -> Self {
        for record in rows {
            self.rows
                .entry(record.ticker().to_string())
                .or_default()
                .push(record);
        }
        self
    }

    /// Latency applied to every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_ticker_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.ticker_delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn with_failure(mut self, symbol: &str, reason: &str) -> Self {
        self.failures.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn rows_for(&self, symbol: &str) -> Vec<PriceRecord> {
        self.rows.get(symbol).cloned().unwrap_or_default()
    }

    fn delay_for(&self, symbol: &str) -> Duration {
        self.ticker_delays
            .get(symbol)
            .copied()
            .unwrap_or(self.delay)
    }
}

#[async_trait]
impl PriceSource for MockStockService {
    async fn fetch(&self, ticker: &Ticker, cancel: &CancelSignal) -> Result<Vec<PriceRecord>> {
        cancel.ensure_active()?;

        let delay = self.delay_for(ticker.as_str());
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Mock fetch for {} cancelled while waiting", ticker);
                    return Err(AppError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if let Some(reason) = self.failures.get(ticker.as_str()) {
            return Err(AppError::source_error(reason.clone()));
        }

        Ok(self.rows_for(ticker.as_str()))
    }
}
