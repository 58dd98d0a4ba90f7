//! Backtest engine and event loop.
//!
//! A run is strictly sequential: indicators and signals are computed once
//! over the whole series (each causal by construction), then the ledger is
//! stepped bar by bar from index 1. Bar 0 only seeds history. Any position
//! still open on the last bar is closed at its close before that bar's
//! equity is recorded.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::StratbenchError;
use super::execution::{enter_long, exit_long, ExecutionConfig, SlippagePolicy};
use super::metrics::Metrics;
use super::ohlcv::{validate_series, Bar};
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{ExitReason, Trade};
use super::signal::{build_frame, generate_signals, Signal};
use super::strategy::{Strategy, StrategyParameters};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub risk_free_rate: f64,
    pub slippage_policy: SlippagePolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            commission_rate: 0.005,
            slippage_rate: 0.001,
            risk_free_rate: 0.02,
            slippage_policy: SlippagePolicy::Both,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), StratbenchError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(StratbenchError::InvalidCapital {
                value: self.initial_capital,
            });
        }
        for (name, value) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
            ("risk_free_rate", self.risk_free_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StratbenchError::InvalidRate {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission_rate: self.commission_rate,
            slippage_rate: self.slippage_rate,
            slippage_policy: self.slippage_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn days(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 86_400.0
    }
}

/// Terminal output of one run. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub symbol: String,
    pub parameters: StrategyParameters,
    pub period: Period,
    pub initial_capital: f64,
    pub final_equity: f64,
    #[serde(flatten)]
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown_curve: Vec<f64>,
}

impl BacktestResult {
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}

/// Simulate `strategy` over `bars` and compute its metrics.
///
/// Errors only on malformed input: invalid config constants, an empty
/// series, bad bars or non-increasing timestamps.
pub fn run_backtest(
    symbol: &str,
    bars: &[Bar],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, StratbenchError> {
    config.validate()?;
    validate_series(bars)?;

    let first = &bars[0];
    let last = &bars[bars.len() - 1];
    let period = Period {
        start: first.timestamp,
        end: last.timestamp,
    };

    tracing::debug!(
        symbol,
        strategy = strategy.name(),
        bars = bars.len(),
        "running backtest"
    );

    let frame = build_frame(bars, strategy);
    let signals = generate_signals(bars, &frame, strategy);
    let execution = config.execution();
    let mut portfolio = Portfolio::new(config.initial_capital);

    for t in 1..bars.len() {
        let bar = &bars[t];

        match signals[t] {
            Signal::EnterLong => {
                enter_long(
                    &mut portfolio,
                    bar.close,
                    bar.timestamp,
                    strategy.position_size(),
                    &execution,
                );
            }
            Signal::ExitLong => {
                exit_long(
                    &mut portfolio,
                    symbol,
                    strategy.name(),
                    bar.close,
                    bar.timestamp,
                    ExitReason::Signal,
                    &execution,
                );
            }
            Signal::Hold => {}
        }

        portfolio.record_equity(bar.timestamp, bar.close);
    }

    // Liquidate at the last close after its mark-to-market point is recorded.
    exit_long(
        &mut portfolio,
        symbol,
        strategy.name(),
        last.close,
        last.timestamp,
        ExitReason::EndOfData,
        &execution,
    );

    let final_equity = portfolio.final_equity();
    let metrics = Metrics::compute_with_final_equity(
        &portfolio.trades,
        &portfolio.equity_curve,
        &portfolio.drawdown_curve,
        config.initial_capital,
        final_equity,
        config.risk_free_rate,
        period.days(),
    );

    tracing::debug!(
        symbol,
        strategy = strategy.name(),
        trades = metrics.trade_count,
        total_return = metrics.total_return,
        sharpe = metrics.sharpe_ratio,
        "backtest complete"
    );

    Ok(BacktestResult {
        strategy_name: strategy.name().to_string(),
        symbol: symbol.to_string(),
        parameters: strategy.parameters(),
        period,
        initial_capital: config.initial_capital,
        final_equity,
        metrics,
        trades: portfolio.trades,
        equity_curve: portfolio.equity_curve,
        drawdown_curve: portfolio.drawdown_curve,
    })
}
