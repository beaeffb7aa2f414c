use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub mod dataset;

pub use dataset::{parse_line, write_dataset, DATASET_HEADER, TRADE_DATE_FORMAT};

/// Exchange symbol identifying a security, e.g. `MSFT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: impl AsRef<str>) -> Result<Self> {
        let trimmed = symbol.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AppError::message("Ticker symbol must not be empty"));
        }
        if trimmed.chars().any(|ch| ch.is_whitespace() || ch == ',') {
            return Err(AppError::message(format!(
                "Ticker symbol `{trimmed}` contains whitespace or a delimiter"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse a list of user supplied symbols, upper-casing each one.
    pub fn parse_list<I, S>(symbols: I) -> Result<Vec<Ticker>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        symbols
            .into_iter()
            .map(|symbol| Ticker::new(symbol.as_ref().to_uppercase()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Ticker::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

/// One trading-day row for a ticker. Field names on the wire follow the stock API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceRecord {
    ticker: Ticker,
    trade_date: NaiveDateTime,
    volume: i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    change: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    change_percent: Decimal,
}

impl PriceRecord {
    pub fn new(
        ticker: Ticker,
        trade_date: NaiveDateTime,
        volume: i64,
        change: Decimal,
        change_percent: Decimal,
    ) -> Self {
        Self {
            ticker,
            trade_date,
            volume,
            change,
            change_percent,
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn trade_date(&self) -> NaiveDateTime {
        self.trade_date
    }

    pub fn volume(&self) -> i64 {
        self.volume
    }

    pub fn change(&self) -> Decimal {
        self.change
    }

    pub fn change_percent(&self) -> Decimal {
        self.change_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_blank_and_delimited_tickers() {
        assert!(Ticker::new("   ").is_err());
        assert!(Ticker::new("MS FT").is_err());
        assert!(Ticker::new("MSFT,AAPL").is_err());
        assert_eq!(Ticker::new(" MSFT ").unwrap().as_str(), "MSFT");
    }

    #[test]
    fn parse_list_uppercases_and_keeps_duplicates() {
        let tickers = Ticker::parse_list(["msft", "aapl", "msft"]).unwrap();
        let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(symbols, vec!["MSFT", "AAPL", "MSFT"]);
    }

    #[test]
    fn decodes_api_payload() {
        let body = r#"[
            {"Ticker": "MSFT", "TradeDate": "2018-01-02T00:00:00", "Volume": 22483797, "Change": 0.3, "ChangePercent": 0.35},
            {"Ticker": "MSFT", "TradeDate": "2018-01-03T00:00:00", "Volume": 26061439, "Change": "0.4", "ChangePercent": "0.47"}
        ]"#;

        let records: Vec<PriceRecord> = serde_json::from_str(body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ticker().as_str(), "MSFT");
        assert_eq!(
            records[0].trade_date(),
            NaiveDate::from_ymd_opt(2018, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(records[0].change(), dec!(0.3));
        assert_eq!(records[1].change_percent(), dec!(0.47));
        assert_eq!(records[1].volume(), 26_061_439);
    }

    #[test]
    fn json_numbers_keep_every_digit() {
        let body = r#"{"Ticker": "MSFT", "TradeDate": "2018-01-02T00:00:00", "Volume": 1, "Change": 0.12345678901234567891, "ChangePercent": -12.3456789012345678901}"#;

        let record: PriceRecord = serde_json::from_str(body).unwrap();

        assert_eq!(record.change(), dec!(0.12345678901234567891));
        assert_eq!(record.change_percent(), dec!(-12.3456789012345678901));

        let encoded = serde_json::to_string(&record).unwrap();
        assert!(
            encoded.contains(r#""Change":0.12345678901234567891"#),
            "{encoded}"
        );
    }

    #[test]
    fn rejects_payload_with_empty_ticker() {
        let body = r#"[{"Ticker": "", "TradeDate": "2018-01-02T00:00:00", "Volume": 1, "Change": 0, "ChangePercent": 0}]"#;
        assert!(serde_json::from_str::<Vec<PriceRecord>>(body).is_err());
    }
}
