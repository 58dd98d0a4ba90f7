//! Open position and closed trade records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A long position held during simulation. Exists only between an entry
/// and its matching exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: u64,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_commission: f64,
    pub entry_slippage: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    EndOfData,
}

/// A closed round trip. `commission` and `slippage` are the totals over both
/// legs, and `pnl` is net of both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub symbol: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub side: Side,
    pub pnl: f64,
    pub commission: f64,
    pub slippage: f64,
    pub strategy: String,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }

    pub fn holding_days(&self) -> f64 {
        (self.exit_time - self.entry_time).num_seconds() as f64 / 86_400.0
    }
}
