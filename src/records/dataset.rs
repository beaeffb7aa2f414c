//! Line-oriented stock price dataset.
//!
//! Columns used by the parser: `0` ticker, `1` trade date, `6` volume, `7` change,
//! `8` change percent. The open/high/low/close columns in between are ignored.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::error::{AppError, Context, Result};
use crate::fetch::decode::split_csv_line;

use super::{PriceRecord, Ticker};

/// `M/d/yyyy h:mm:ss tt`, e.g. `1/2/2018 12:00:00 AM`.
pub const TRADE_DATE_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

pub const DATASET_HEADER: [&str; 9] = [
    "Ticker",
    "TradeDate",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Change",
    "ChangePercent",
];

const TICKER_COLUMN: usize = 0;
const TRADE_DATE_COLUMN: usize = 1;
const VOLUME_COLUMN: usize = 6;
const CHANGE_COLUMN: usize = 7;
const CHANGE_PERCENT_COLUMN: usize = 8;
const MIN_COLUMNS: usize = CHANGE_PERCENT_COLUMN + 1;

/// Parse one data line of the dataset into a record.
pub fn parse_line(line: &str) -> Result<PriceRecord> {
    let fields = split_csv_line(line, ',');
    if fields.len() < MIN_COLUMNS {
        return Err(AppError::source_error(format!(
            "expected at least {MIN_COLUMNS} columns, found {}",
            fields.len()
        )));
    }

    let ticker = Ticker::new(fields[TICKER_COLUMN])
        .map_err(|err| AppError::source_error(err.to_string()))?;

    let raw_date = fields[TRADE_DATE_COLUMN];
    let trade_date = NaiveDateTime::parse_from_str(raw_date, TRADE_DATE_FORMAT)
        .map_err(|err| AppError::source_error(format!("invalid trade date `{raw_date}`: {err}")))?;

    let raw_volume = fields[VOLUME_COLUMN];
    let volume = raw_volume
        .parse::<i64>()
        .map_err(|_| AppError::source_error(format!("invalid volume `{raw_volume}`")))?;

    let change = parse_decimal(fields[CHANGE_COLUMN], "change")?;
    let change_percent = parse_decimal(fields[CHANGE_PERCENT_COLUMN], "change percent")?;

    Ok(PriceRecord::new(
        ticker,
        trade_date,
        volume,
        change,
        change_percent,
    ))
}

/// Render a record back into the dataset's textual layout.
pub fn format_line(record: &PriceRecord) -> String {
    dataset_row(record).join(",")
}

/// Write the rows with the canonical header so they can be loaded again by the local source.
pub fn write_dataset<P: AsRef<Path>>(file_path: P, rows: &[PriceRecord]) -> Result<()> {
    let path = file_path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create dataset writer for {}", path.display()))?;

    writer.write_record(DATASET_HEADER)?;
    for record in rows {
        writer.write_record(dataset_row(record))?;
    }

    writer.flush()?;
    Ok(())
}

fn dataset_row(record: &PriceRecord) -> [String; 9] {
    [
        record.ticker().to_string(),
        record.trade_date().format(TRADE_DATE_FORMAT).to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        record.volume().to_string(),
        record.change().to_string(),
        record.change_percent().to_string(),
    ]
}

fn parse_decimal(value: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|err| AppError::source_error(format!("invalid {column} `{value}`: {err}")))
}
