//! Performance metrics and statistics.
//!
//! Pure function of the closed trades, the equity/drawdown curves and a few
//! run constants. Numerical edge cases resolve to fixed values: zero
//! volatility gives a Sharpe of 0, no losing trades gives an infinite profit
//! factor, and a zero-length period gives an annualized return of 0.

use serde::{Serialize, Serializer};

use super::portfolio::EquityPoint;
use super::position::Trade;

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    #[serde(serialize_with = "serialize_float")]
    pub profit_factor: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub average_win: f64,
    /// Signed mean of losing pnl, so never positive.
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub max_consecutive_losses: usize,
    #[serde(serialize_with = "serialize_float")]
    pub recovery_factor: f64,
}

impl Metrics {
    /// Metrics with the final equity taken from the last curve point.
    pub fn compute(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        drawdown_curve: &[f64],
        initial_capital: f64,
        risk_free_rate: f64,
        days_in_period: f64,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        Self::compute_with_final_equity(
            trades,
            equity_curve,
            drawdown_curve,
            initial_capital,
            final_equity,
            risk_free_rate,
            days_in_period,
        )
    }

    /// Returns are measured against `final_equity`, which may differ from
    /// the last curve point when a position is liquidated after it.
    pub fn compute_with_final_equity(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        drawdown_curve: &[f64],
        initial_capital: f64,
        final_equity: f64,
        risk_free_rate: f64,
        days_in_period: f64,
    ) -> Self {
        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let annualized_return = if days_in_period > 0.0 {
            (1.0 + total_return).powf(DAYS_PER_YEAR / days_in_period) - 1.0
        } else {
            0.0
        };

        let sharpe_ratio = compute_sharpe(equity_curve, risk_free_rate / DAYS_PER_YEAR);
        let max_drawdown = drawdown_curve.iter().copied().fold(0.0_f64, f64::max);

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut consecutive_losses = 0usize;
        let mut max_consecutive_losses = 0usize;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                winning_trades += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losing_trades += 1;
                total_losses += pnl;
                largest_loss = largest_loss.min(pnl);
            }

            if pnl < 0.0 {
                consecutive_losses += 1;
                max_consecutive_losses = max_consecutive_losses.max(consecutive_losses);
            } else {
                consecutive_losses = 0;
            }
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            winning_trades as f64 / trade_count as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses < 0.0 {
            total_wins / total_losses.abs()
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let average_win = if winning_trades > 0 {
            total_wins / winning_trades as f64
        } else {
            0.0
        };

        let average_loss = if losing_trades > 0 {
            total_losses / losing_trades as f64
        } else {
            0.0
        };

        let recovery_factor = if max_drawdown > 0.0 {
            total_return / max_drawdown
        } else if total_return > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            win_rate,
            profit_factor,
            trade_count,
            winning_trades,
            losing_trades,
            average_win,
            average_loss,
            largest_win,
            largest_loss,
            max_consecutive_losses,
            recovery_factor,
        }
    }
}

/// Annualized Sharpe over simple returns of the equity curve, using the
/// sample standard deviation. 0 with fewer than two returns or no volatility.
fn compute_sharpe(equity_curve: &[EquityPoint], daily_rf: f64) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean - daily_rf) / stddev * DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Finite values serialize as numbers; infinities as "inf" / "-inf" and NaN
/// as "nan", since JSON has no representation for them.
pub fn serialize_float<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if *value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}
