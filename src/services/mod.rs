use async_trait::async_trait;

use crate::error::Result;
use crate::fetch::CancelSignal;
use crate::records::{PriceRecord, Ticker};

pub mod local;
pub mod mock;
pub mod remote;

pub use local::LocalDatasetSource;
pub use mock::MockStockService;
pub use remote::RemoteStockService;

/// Anything that can produce the price rows for a single ticker.
///
/// Implementations check `cancel` at their natural yield points and return
/// [`AppError::Cancelled`](crate::error::AppError::Cancelled) once they observe it.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, ticker: &Ticker, cancel: &CancelSignal) -> Result<Vec<PriceRecord>>;
}
