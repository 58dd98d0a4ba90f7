//! Trade execution and fill simulation.
//!
//! Implements entry/exit against the ledger with whole-share sizing,
//! proportional commission, and proportional slippage charged as a cash
//! cost. Fills happen at the bar's close.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::StratbenchError;
use super::portfolio::Portfolio;
use super::position::{ExitReason, Position, Side, Trade};

/// Which legs of a round trip pay slippage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlippagePolicy {
    #[default]
    Both,
    EntryOnly,
    ExitOnly,
    None,
}

impl SlippagePolicy {
    pub fn on_entry(&self) -> bool {
        matches!(self, SlippagePolicy::Both | SlippagePolicy::EntryOnly)
    }

    pub fn on_exit(&self) -> bool {
        matches!(self, SlippagePolicy::Both | SlippagePolicy::ExitOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlippagePolicy::Both => "both",
            SlippagePolicy::EntryOnly => "entry",
            SlippagePolicy::ExitOnly => "exit",
            SlippagePolicy::None => "none",
        }
    }
}

impl fmt::Display for SlippagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlippagePolicy {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" => Ok(SlippagePolicy::Both),
            "entry" | "entry_only" => Ok(SlippagePolicy::EntryOnly),
            "exit" | "exit_only" => Ok(SlippagePolicy::ExitOnly),
            "none" => Ok(SlippagePolicy::None),
            other => Err(StratbenchError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "slippage_policy".to_string(),
                reason: format!("expected both, entry, exit or none, got {other:?}"),
            }),
        }
    }
}

/// Cost model for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub slippage_policy: SlippagePolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.0,
            slippage_rate: 0.0,
            slippage_policy: SlippagePolicy::Both,
        }
    }
}

/// Commission: notional * commission_rate.
pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    notional * config.commission_rate
}

/// Slippage for one leg: notional * slippage_rate when the policy charges
/// that leg, otherwise 0.
pub fn calculate_slippage(notional: f64, entry_leg: bool, config: &ExecutionConfig) -> f64 {
    let charged = if entry_leg {
        config.slippage_policy.on_entry()
    } else {
        config.slippage_policy.on_exit()
    };
    if charged {
        notional * config.slippage_rate
    } else {
        0.0
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        shares: u64,
        price: f64,
        notional: f64,
        commission: f64,
        slippage: f64,
    },
    InsufficientCapital,
    AlreadyLong,
}

/// Enter a long position at `price`.
///
/// 1. No-op if a position is already open
/// 2. shares = floor(cash * position_size / price)
/// 3. If shares == 0, or notional + commission + slippage exceeds cash,
///    return InsufficientCapital (cash never goes negative)
/// 4. Deduct notional + commission + slippage from cash and open the position
pub fn enter_long(
    portfolio: &mut Portfolio,
    price: f64,
    time: DateTime<Utc>,
    position_size: f64,
    config: &ExecutionConfig,
) -> EntryResult {
    if !portfolio.is_flat() {
        return EntryResult::AlreadyLong;
    }

    let budget = portfolio.cash * position_size;
    let shares = (budget / price).floor();
    if !shares.is_finite() || shares < 1.0 {
        return EntryResult::InsufficientCapital;
    }
    let shares = shares as u64;

    let notional = shares as f64 * price;
    let commission = calculate_commission(notional, config);
    let slippage = calculate_slippage(notional, true, config);
    let total_cost = notional + commission + slippage;

    if total_cost > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= total_cost;
    portfolio.position = Some(Position {
        shares,
        entry_price: price,
        entry_time: time,
        entry_commission: commission,
        entry_slippage: slippage,
    });

    tracing::debug!(%time, shares, price, commission, slippage, "entered long");

    EntryResult::Entered {
        shares,
        price,
        notional,
        commission,
        slippage,
    }
}

/// Close the open position at `price`, crediting
/// notional - commission - slippage to cash and recording a Trade whose pnl
/// includes both legs' costs. Returns None (no-op) when flat.
pub fn exit_long(
    portfolio: &mut Portfolio,
    symbol: &str,
    strategy: &str,
    price: f64,
    time: DateTime<Utc>,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.position.take()?;

    let notional = position.shares as f64 * price;
    let exit_commission = calculate_commission(notional, config);
    let exit_slippage = calculate_slippage(notional, false, config);

    portfolio.cash += notional - exit_commission - exit_slippage;

    let commission = position.entry_commission + exit_commission;
    let slippage = position.entry_slippage + exit_slippage;
    let pnl = (price - position.entry_price) * position.shares as f64 - commission - slippage;

    let trade = Trade {
        symbol: symbol.to_string(),
        entry_time: position.entry_time,
        exit_time: time,
        entry_price: position.entry_price,
        exit_price: price,
        shares: position.shares,
        side: Side::Long,
        pnl,
        commission,
        slippage,
        strategy: strategy.to_string(),
        exit_reason: reason,
    };

    tracing::debug!(%time, shares = trade.shares, price, pnl, ?reason, "exited long");

    portfolio.record_trade(trade.clone());
    Some(trade)
}
