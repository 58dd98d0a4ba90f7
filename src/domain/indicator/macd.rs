//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is undefined for the first max(fast, slow) - 1 values,
//! signal and histogram for a further (signal - 1).

use super::ema::Ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let mut ema_fast = Ema::new(fast);
    let mut ema_slow = Ema::new(slow);
    let mut ema_signal = Ema::new(signal_period);

    let mut out = MacdSeries {
        line: Vec::with_capacity(values.len()),
        signal: Vec::with_capacity(values.len()),
        histogram: Vec::with_capacity(values.len()),
    };

    for &x in values {
        // NaN propagates through the subtraction during either EMA's warmup.
        let line = ema_fast.update(x) - ema_slow.update(x);
        let signal = ema_signal.update(line);
        out.line.push(line);
        out.signal.push(signal);
        out.histogram.push(line - signal);
    }

    out
}

pub fn macd_default(values: &[f64]) -> MacdSeries {
    macd(values, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
