//! CSV file data adapter.
//!
//! Reads `timestamp,open,high,low,close,volume` rows. The source is either a
//! single file (used for any symbol) or a directory holding `<SYMBOL>.csv`.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    source: PathBuf,
}

impl CsvAdapter {
    pub fn new(source: PathBuf) -> Self {
        Self { source }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        if self.source.is_dir() {
            self.source.join(format!("{}.csv", symbol))
        } else {
            self.source.clone()
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD` or integer epoch seconds. Naive forms are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(secs) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(secs, 0) {
            return Ok(dt);
        }
    }
    Err(format!("unrecognized timestamp {:?}", raw))
}

fn parse_number(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<f64, StratbenchError> {
    record
        .get(idx)
        .ok_or_else(|| StratbenchError::Data {
            reason: format!("row {}: missing {} column", row, name),
        })?
        .trim()
        .parse()
        .map_err(|e| StratbenchError::Data {
            reason: format!("row {}: invalid {} value: {}", row, name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, StratbenchError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| StratbenchError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| StratbenchError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| StratbenchError::Data {
                reason: format!("row {}: missing timestamp column", row),
            })?;
            let timestamp = parse_timestamp(ts_str).map_err(|reason| StratbenchError::Data {
                reason: format!("row {}: {}", row, reason),
            })?;

            bars.push(Bar {
                timestamp,
                open: parse_number(&record, 1, "open", row)?,
                high: parse_number(&record, 2, "high", row)?,
                low: parse_number(&record, 3, "low", row)?,
                close: parse_number(&record, 4, "close", row)?,
                volume: parse_number(&record, 5, "volume", row)?,
            });
        }

        tracing::debug!(symbol, path = %path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }
}
