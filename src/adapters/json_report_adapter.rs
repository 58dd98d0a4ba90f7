//! JSON report adapter implementing ReportPort.

use std::fs::File;
use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratbenchError;
use crate::domain::optimizer::OptimizationResult;
use crate::ports::report_port::ReportPort;

/// Writes results as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_json<T: Serialize>(value: &T, output_path: &str) -> Result<(), StratbenchError> {
        let mut writer = BufWriter::new(File::create(output_path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::info!(path = output_path, "report written");
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &str,
    ) -> Result<(), StratbenchError> {
        Self::write_json(result, output_path)
    }

    fn write_optimization(
        &self,
        result: &OptimizationResult,
        output_path: &str,
    ) -> Result<(), StratbenchError> {
        Self::write_json(result, output_path)
    }
}
