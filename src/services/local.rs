use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::{AppError, Context, Result};
use crate::fetch::CancelSignal;
use crate::records::{parse_line, PriceRecord, Ticker};

use super::PriceSource;

/// Reads price rows from a delimited dataset file on disk.
#[derive(Debug, Clone)]
pub struct LocalDatasetSource {
    path: PathBuf,
}

impl LocalDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PriceSource for LocalDatasetSource {
    async fn fetch(&self, ticker: &Ticker, cancel: &CancelSignal) -> Result<Vec<PriceRecord>> {
        cancel.ensure_active()?;

        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open dataset {}", self.path.display()))?;

        let records = self
            .read_matching(BufReader::new(file), ticker, cancel)
            .await?;

        debug!(
            "Read {} row(s) for {} from {}",
            records.len(),
            ticker,
            self.path.display()
        );
        Ok(records)
    }
}

impl LocalDatasetSource {
    /// Parse every data line of `reader`, keeping the rows for `ticker`. The signal is
    /// checked before each line after the header.
    async fn read_matching<R>(
        &self,
        reader: R,
        ticker: &Ticker,
        cancel: &CancelSignal,
    ) -> Result<Vec<PriceRecord>>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();

        // Header.
        if lines.next_line().await?.is_none() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut line_number = 1;
        while let Some(line) = lines.next_line().await? {
            cancel.ensure_active()?;
            line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let record = parse_line(&line).map_err(|err| {
                AppError::source_error(format!(
                    "{}:{}: {}",
                    self.path.display(),
                    line_number,
                    err
                ))
            })?;

            if record.ticker() == ticker {
                records.push(record);
            }
        }

        Ok(records)
    }
}
