//! Per-bar signal generation.
//!
//! A strategy decides from the current bar and the indicator values at the
//! current index only. Indicator columns are themselves causal, so the
//! signal at bar t never depends on bars after t. Any undefined input
//! (warmup) yields `Hold`.

use serde::Serialize;

use crate::domain::indicator::{is_defined, IndicatorFrame, IndicatorType};
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Hold,
    EnterLong,
    ExitLong,
}

/// Uniform decision interface over the strategy catalog.
pub trait SignalRule {
    fn required_indicators(&self) -> Vec<IndicatorType>;

    fn evaluate(&self, bar: &Bar, frame: &IndicatorFrame, t: usize) -> Signal;
}

impl SignalRule for Strategy {
    fn required_indicators(&self) -> Vec<IndicatorType> {
        Strategy::required_indicators(self)
    }

    fn evaluate(&self, bar: &Bar, frame: &IndicatorFrame, t: usize) -> Signal {
        let close = bar.close;
        match *self {
            Strategy::Momentum {
                lookback_period,
                threshold,
                ..
            } => {
                let sma = frame.value(&IndicatorType::Sma(lookback_period), t);
                if !is_defined(sma) {
                    Signal::Hold
                } else if close > sma * (1.0 + threshold) {
                    Signal::EnterLong
                } else if close < sma * (1.0 - threshold) {
                    Signal::ExitLong
                } else {
                    Signal::Hold
                }
            }
            Strategy::MeanReversion {
                lookback_period,
                std_threshold,
                ..
            } => {
                let (upper, _, lower) = frame.bands(lookback_period, std_threshold, t);
                if !is_defined(upper) || !is_defined(lower) {
                    Signal::Hold
                } else if close < lower {
                    Signal::EnterLong
                } else if close > upper {
                    Signal::ExitLong
                } else {
                    Signal::Hold
                }
            }
            Strategy::Breakout {
                breakout_period,
                volume_multiplier,
                volume_period,
                ..
            } => {
                let prior_high = frame.value(&IndicatorType::PriorHigh(breakout_period), t);
                let volume_mean = frame.value(&IndicatorType::VolumeSma(volume_period), t);
                if !is_defined(prior_high) || !is_defined(volume_mean) {
                    Signal::Hold
                } else if close > prior_high && bar.volume > volume_multiplier * volume_mean {
                    Signal::EnterLong
                } else {
                    Signal::Hold
                }
            }
            Strategy::DualMovingAverage {
                fast_period,
                slow_period,
                ..
            } => {
                let fast = frame.value(&IndicatorType::Sma(fast_period), t);
                let slow = frame.value(&IndicatorType::Sma(slow_period), t);
                if !is_defined(fast) || !is_defined(slow) {
                    Signal::Hold
                } else if fast > slow {
                    Signal::EnterLong
                } else if fast < slow {
                    Signal::ExitLong
                } else {
                    Signal::Hold
                }
            }
        }
    }
}

/// Compute the indicators `rule` needs over `bars`.
pub fn build_frame<R: SignalRule + ?Sized>(bars: &[Bar], rule: &R) -> IndicatorFrame {
    IndicatorFrame::compute(bars, &rule.required_indicators())
}

/// One signal per bar, aligned with `bars`.
pub fn generate_signals<R: SignalRule + ?Sized>(
    bars: &[Bar],
    frame: &IndicatorFrame,
    rule: &R,
) -> Vec<Signal> {
    bars.iter()
        .enumerate()
        .map(|(t, bar)| rule.evaluate(bar, frame, t))
        .collect()
}
