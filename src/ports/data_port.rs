//! Price data access port trait.

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Bars for `symbol`, sorted by timestamp.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, StratlabError>;

    fn list_symbols(&self) -> Result<Vec<String>, StratlabError>;
}
