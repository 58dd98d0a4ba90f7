//! Technical indicator library.
//!
//! Every indicator maps an input column to an aligned output column of the
//! same length. Warmup positions hold NaN, never 0. Rolling indicators expose
//! a `*_at(history, ..)` form whose `history` slice ends at the current bar,
//! so a value at bar t can only read bars `..=t`; the series forms are built
//! from it. Recursive indicators (EMA, MACD) are driven forward one input at
//! a time.
//!
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorColumn`: the output shape of one computed indicator
//! - `IndicatorFrame`: the indicators a strategy needs, computed once per run

pub mod bollinger;
pub mod ema;
pub mod extremes;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod volume;

use std::collections::HashMap;
use std::fmt;

use crate::domain::ohlcv::{closes, highs, volumes, Bar};

pub use bollinger::BollingerBands;
pub use macd::MacdSeries;

/// Undefined-value marker for warmup bars.
pub const NAN: f64 = f64::NAN;

pub fn is_defined(value: f64) -> bool {
    !value.is_nan()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    /// The multiplier is keyed by its exact bit pattern.
    Bollinger {
        period: usize,
        stddev_mult_bits: u64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    VolumeSma(usize),
    VolumeRatio(usize),
    PriorHigh(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_bits,
            } => {
                let mult = f64::from_bits(*stddev_mult_bits);
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::VolumeRatio(period) => write!(f, "VOLUME_RATIO({})", period),
            IndicatorType::PriorHigh(period) => write!(f, "PRIOR_HIGH({})", period),
        }
    }
}

impl IndicatorType {
    pub fn bollinger(period: usize, stddev_mult: f64) -> Self {
        IndicatorType::Bollinger {
            period,
            stddev_mult_bits: stddev_mult.to_bits(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorColumn {
    Line(Vec<f64>),
    Bands(BollingerBands),
    Macd(MacdSeries),
}

impl IndicatorColumn {
    pub fn len(&self) -> usize {
        match self {
            IndicatorColumn::Line(v) => v.len(),
            IndicatorColumn::Bands(b) => b.middle.len(),
            IndicatorColumn::Macd(m) => m.line.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn compute_column(bars: &[Bar], indicator: &IndicatorType) -> IndicatorColumn {
    match *indicator {
        IndicatorType::Sma(period) => IndicatorColumn::Line(sma::sma(&closes(bars), period)),
        IndicatorType::Ema(period) => IndicatorColumn::Line(ema::ema(&closes(bars), period)),
        IndicatorType::Rsi(period) => IndicatorColumn::Line(rsi::rsi(&closes(bars), period)),
        IndicatorType::Bollinger {
            period,
            stddev_mult_bits,
        } => IndicatorColumn::Bands(bollinger::bollinger(
            &closes(bars),
            period,
            f64::from_bits(stddev_mult_bits),
        )),
        IndicatorType::Macd { fast, slow, signal } => {
            IndicatorColumn::Macd(macd::macd(&closes(bars), fast, slow, signal))
        }
        IndicatorType::VolumeSma(period) => {
            IndicatorColumn::Line(volume::volume_sma(&volumes(bars), period))
        }
        IndicatorType::VolumeRatio(period) => {
            IndicatorColumn::Line(volume::volume_ratio(&volumes(bars), period))
        }
        IndicatorType::PriorHigh(period) => {
            IndicatorColumn::Line(extremes::prior_high(&highs(bars), period))
        }
    }
}

/// Indicators computed over one price series. Lookups of an indicator that
/// was not computed, or of an index past the end, read as undefined.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    columns: HashMap<IndicatorType, IndicatorColumn>,
}

impl IndicatorFrame {
    pub fn compute(bars: &[Bar], indicators: &[IndicatorType]) -> Self {
        let mut columns = HashMap::with_capacity(indicators.len());
        for indicator in indicators {
            columns
                .entry(indicator.clone())
                .or_insert_with(|| compute_column(bars, indicator));
        }
        IndicatorFrame { columns }
    }

    pub fn contains(&self, indicator: &IndicatorType) -> bool {
        self.columns.contains_key(indicator)
    }

    pub fn column(&self, indicator: &IndicatorType) -> Option<&IndicatorColumn> {
        self.columns.get(indicator)
    }

    /// Value of a single-line indicator at bar `t`.
    pub fn value(&self, indicator: &IndicatorType, t: usize) -> f64 {
        match self.columns.get(indicator) {
            Some(IndicatorColumn::Line(v)) => v.get(t).copied().unwrap_or(NAN),
            _ => NAN,
        }
    }

    /// (upper, middle, lower) Bollinger values at bar `t`.
    pub fn bands(&self, period: usize, stddev_mult: f64, t: usize) -> (f64, f64, f64) {
        let key = IndicatorType::bollinger(period, stddev_mult);
        match self.columns.get(&key) {
            Some(IndicatorColumn::Bands(b)) if t < b.middle.len() => {
                (b.upper[t], b.middle[t], b.lower[t])
            }
            _ => (NAN, NAN, NAN),
        }
    }

    /// (line, signal, histogram) MACD values at bar `t`.
    pub fn macd(&self, fast: usize, slow: usize, signal: usize, t: usize) -> (f64, f64, f64) {
        let key = IndicatorType::Macd { fast, slow, signal };
        match self.columns.get(&key) {
            Some(IndicatorColumn::Macd(m)) if t < m.line.len() => {
                (m.line[t], m.signal[t], m.histogram[t])
            }
            _ => (NAN, NAN, NAN),
        }
    }
}
