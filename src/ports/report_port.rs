//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratbenchError;
use crate::domain::optimizer::OptimizationResult;

/// Port for writing run results.
pub trait ReportPort {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), StratbenchError>;

    fn write_optimization(
        &self,
        result: &OptimizationResult,
        output_path: &str,
    ) -> Result<(), StratbenchError>;
}
