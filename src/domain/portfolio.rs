//! Simulation ledger: cash, the single open position, closed trades and the
//! equity/drawdown curves.
//!
//! One `Portfolio` is created per run and threaded through the bar loop by
//! `&mut`; nothing is shared between runs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown_curve: Vec<f64>,
    pub peak_equity: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            drawdown_curve: Vec::new(),
            peak_equity: initial_capital,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn shares(&self) -> u64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    /// cash + shares * price
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Mark to market at `price`, append the equity and drawdown points and
    /// advance the running peak. Returns the recorded equity.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, price: f64) -> f64 {
        let equity = self.equity(price);
        self.peak_equity = self.peak_equity.max(equity);
        let drawdown = if self.peak_equity > 0.0 {
            ((self.peak_equity - equity) / self.peak_equity).max(0.0)
        } else {
            0.0
        };
        self.equity_curve.push(EquityPoint { timestamp, equity });
        self.drawdown_curve.push(drawdown);
        equity
    }

    /// Cash once flat, otherwise the last recorded equity point.
    pub fn final_equity(&self) -> f64 {
        if self.is_flat() {
            return self.cash;
        }
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}
