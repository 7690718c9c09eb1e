//! Result export port trait.

use crate::domain::backtest::AnnotatedSeries;
use crate::domain::error::StratlabError;
use crate::domain::optimizer::GridPoint;
use crate::domain::trade_log::TradeEvent;

/// Port for persisting engine output, trade logs and optimizer tables.
pub trait ReportPort {
    fn write_backtest(&self, series: &AnnotatedSeries) -> Result<(), StratlabError>;

    fn write_trades(&self, events: &[TradeEvent]) -> Result<(), StratlabError>;

    fn write_grid(&self, table: &[GridPoint]) -> Result<(), StratlabError>;
}
