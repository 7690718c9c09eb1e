//! CSV export of backtest output, trade logs and optimizer tables.
//!
//! Writes into a directory: `backtest.csv`, `trades.csv` and `grid.csv`.
//! Timestamps use `%Y-%m-%d %H:%M:%S` so files read back through
//! [`crate::adapters::csv_adapter`].

use crate::domain::backtest::{AnnotatedSeries, OUTPUT_COLUMNS};
use crate::domain::error::StratlabError;
use crate::domain::optimizer::GridPoint;
use crate::domain::trade_log::TradeEvent;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter {
    out_dir: PathBuf,
}

impl CsvReportAdapter {
    /// Creates `out_dir` if needed.
    pub fn new(out_dir: PathBuf) -> Result<Self, StratlabError> {
        fs::create_dir_all(&out_dir)?;
        Ok(Self { out_dir })
    }

    fn path_for(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }

    fn writer(&self, file: &str) -> Result<(csv::Writer<fs::File>, PathBuf), StratlabError> {
        let path = self.path_for(file);
        let writer = csv::Writer::from_path(&path).map_err(|e| write_error(&path, e))?;
        Ok((writer, path))
    }
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> StratlabError {
    StratlabError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(&self, series: &AnnotatedSeries) -> Result<(), StratlabError> {
        let (mut w, path) = self.writer("backtest.csv")?;

        let mut header = vec!["timestamp", "close", "signal"];
        header.extend(OUTPUT_COLUMNS);
        w.write_record(&header).map_err(|e| write_error(&path, e))?;

        let columns: Vec<&[f64]> = OUTPUT_COLUMNS
            .iter()
            .filter_map(|name| series.column(name))
            .collect();
        for (i, bar) in series.bars.iter().enumerate() {
            let mut row = vec![
                bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                bar.close.to_string(),
                series.signal[i].to_string(),
            ];
            row.extend(columns.iter().map(|c| c[i].to_string()));
            w.write_record(&row).map_err(|e| write_error(&path, e))?;
        }
        w.flush()?;
        Ok(())
    }

    fn write_trades(&self, events: &[TradeEvent]) -> Result<(), StratlabError> {
        let (mut w, path) = self.writer("trades.csv")?;
        w.write_record(["timestamp", "action", "price", "position", "pnl"])
            .map_err(|e| write_error(&path, e))?;
        for e in events {
            w.write_record([
                e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                e.action.to_string(),
                e.price.to_string(),
                e.position.to_string(),
                e.pnl.to_string(),
            ])
            .map_err(|err| write_error(&path, err))?;
        }
        w.flush()?;
        Ok(())
    }

    fn write_grid(&self, table: &[GridPoint]) -> Result<(), StratlabError> {
        let (mut w, path) = self.writer("grid.csv")?;
        w.write_record(["short", "long", "sharpe"])
            .map_err(|e| write_error(&path, e))?;
        for p in table {
            w.write_record([p.short.to_string(), p.long.to_string(), p.sharpe.to_string()])
                .map_err(|e| write_error(&path, e))?;
        }
        w.flush()?;
        Ok(())
    }
}
