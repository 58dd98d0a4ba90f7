//! OHLCV bar representation and series validation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::StratbenchError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Check prices are positive and finite, volume is non-negative, and
    /// `low <= min(open, close) <= max(open, close) <= high`.
    pub fn check(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive finite price, got {value}"));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!(
                "volume must be non-negative and finite, got {}",
                self.volume
            ));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "low {} is above min(open, close) {}",
                self.low,
                self.open.min(self.close)
            ));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} is below max(open, close) {}",
                self.high,
                self.open.max(self.close)
            ));
        }
        Ok(())
    }
}

/// Validate a price series before simulation: non-empty, every bar well
/// formed, timestamps strictly increasing.
pub fn validate_series(bars: &[Bar]) -> Result<(), StratbenchError> {
    if bars.is_empty() {
        return Err(StratbenchError::EmptySeries);
    }
    for (index, bar) in bars.iter().enumerate() {
        bar.check()
            .map_err(|reason| StratbenchError::InvalidBar { index, reason })?;
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(StratbenchError::NonMonotonicTimestamp { index });
        }
    }
    Ok(())
}

/// Extract the close column.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Extract the high column.
pub fn highs(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

/// Extract the volume column.
pub fn volumes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}
