#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use stratbench::domain::backtest::BacktestConfig;
use stratbench::domain::error::StratbenchError;
pub use stratbench::domain::ohlcv::Bar;
use stratbench::domain::strategy::{Strategy, StrategyKind, StrategyParameters};
use stratbench::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, StratbenchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StratbenchError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn day(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

pub fn make_bar(i: usize, close: f64, volume: f64) -> Bar {
    Bar {
        timestamp: day(i),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// One bar per day from the given closes, constant volume.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, 1000.0))
        .collect()
}

/// `count` closes starting at `start`, moving by `step` per bar.
pub fn ramp(start: f64, step: f64, count: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
    bars_from_closes(&closes)
}

pub fn flat(price: f64, count: usize) -> Vec<Bar> {
    bars_from_closes(&vec![price; count])
}

/// Oscillating series with a gentle drift, enough to trigger every strategy.
pub fn wave(count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.3).sin() * 10.0 + (t * 0.07).cos() * 5.0 + t * 0.05;
            let volume = 1000.0 + ((t * 0.9).sin() + 1.0) * 800.0;
            make_bar(i, close, volume)
        })
        .collect()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::default()
}

pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig {
        commission_rate: 0.0,
        slippage_rate: 0.0,
        risk_free_rate: 0.0,
        ..BacktestConfig::default()
    }
}

pub fn strategy(kind: StrategyKind, params: &[(&str, f64)]) -> Strategy {
    let mut p = StrategyParameters::new();
    for &(name, value) in params {
        p.insert(name, value);
    }
    Strategy::from_parameters(kind, &p).unwrap()
}
