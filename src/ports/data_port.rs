//! Market data access port trait.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// All bars for `symbol` in source order. Ordering and bar validity are
    /// checked by the engine, not here.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, StratbenchError>;
}
