use std::sync::Arc;

use log::info;

use crate::app::presenter::SearchPresenter;
use crate::app::view::StockView;
use crate::config::{AppConfig, SourceKind};
use crate::error::Result;
use crate::fetch::{ensure_concurrency_limit, FetchOrchestrator};
use crate::services::{LocalDatasetSource, MockStockService, PriceSource, RemoteStockService};

/// Instantiate the price source selected by `config`.
pub fn build_source(config: &AppConfig) -> Result<Arc<dyn PriceSource>> {
    let source: Arc<dyn PriceSource> = match config.source {
        SourceKind::Local => {
            info!("Reading prices from {}", config.dataset_path.display());
            Arc::new(LocalDatasetSource::new(config.dataset_path.clone()))
        }
        SourceKind::Remote => {
            info!("Requesting prices from {}", config.remote.request.base_url);
            Arc::new(RemoteStockService::new(
                config.remote.request.clone(),
                config.remote.request_timeout,
            )?)
        }
        SourceKind::Mock => Arc::new(MockStockService::sample()?),
    };
    Ok(source)
}

/// Wire source, orchestrator and view into a ready-to-use presenter.
pub fn build_presenter<V: StockView>(config: &AppConfig, view: V) -> Result<SearchPresenter<V>> {
    let mut orchestrator = FetchOrchestrator::new(build_source(config)?);
    if let Some(limit) = config.concurrency_limit {
        orchestrator = orchestrator.with_concurrency_limit(ensure_concurrency_limit(limit));
    }
    Ok(SearchPresenter::new(orchestrator, view).with_timeout(config.timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::view::RecordingView;
    use crate::fetch::FetchResult;
    use crate::records::Ticker;

    #[tokio::test]
    async fn mock_config_produces_a_working_presenter() {
        let config = AppConfig {
            source: SourceKind::Mock,
            concurrency_limit: Some(1),
            ..AppConfig::default()
        };

        let presenter = build_presenter(&config, RecordingView::default()).unwrap();
        let result = presenter
            .search(Ticker::parse_list(["googl"]).unwrap())
            .await;

        match result {
            FetchResult::Rows(rows) => assert_eq!(rows.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_dataset_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            dataset_path: dir.path().join("absent.csv"),
            ..AppConfig::default()
        };

        let presenter = build_presenter(&config, RecordingView::default()).unwrap();
        let result = presenter
            .search(Ticker::parse_list(["MSFT"]).unwrap())
            .await;

        assert!(matches!(result, FetchResult::Failed(_)), "{result:?}");
    }
}
