use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::fetch::{prepare_request, CancelSignal, RequestConfig};
use crate::records::{PriceRecord, Ticker};

use super::PriceSource;

/// Price source backed by the stock web API (`GET /api/stocks/{ticker}`).
pub struct RemoteStockService {
    client: Client,
    request: RequestConfig,
}

impl RemoteStockService {
    pub fn new(request: RequestConfig, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, request })
    }

    async fn get_prices(&self, ticker: &Ticker) -> Result<Vec<PriceRecord>> {
        let prepared = prepare_request(&self.request, ticker)?;
        debug!("GET {}", prepared.url);

        let response = self
            .client
            .get(&prepared.url)
            .headers(prepared.headers)
            .send()
            .await
            .map_err(|err| {
                AppError::source_error(format!("Request for {} failed: {}", ticker, err))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::source_error(format!(
                "Request for {} failed with status {}",
                ticker, status
            )));
        }

        response.json::<Vec<PriceRecord>>().await.map_err(|err| {
            AppError::source_error(format!(
                "Failed to decode price payload for {}: {}",
                ticker, err
            ))
        })
    }
}

#[async_trait]
impl PriceSource for RemoteStockService {
    async fn fetch(&self, ticker: &Ticker, cancel: &CancelSignal) -> Result<Vec<PriceRecord>> {
        cancel.ensure_active()?;

        // Dropping the request future aborts the in-flight HTTP call.
        tokio::select! {
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.get_prices(ticker) => result,
        }
    }
}
