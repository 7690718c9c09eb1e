//! Time-series momentum: sign of close[t] - close[t - lookback], held
//! through flat readings.

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{
    direction, hold_last_nonzero, require_positive, SignalProvider, StrategyParams,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Momentum {
    lookback: usize,
}

impl Momentum {
    pub fn new(lookback: usize) -> Result<Self, StratlabError> {
        require_positive("lookback", lookback)?;
        Ok(Self { lookback })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(params.get_usize("lookback", 20)?)
    }
}

impl SignalProvider for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let raw = (0..bars.len()).map(|i| {
            if i < self.lookback {
                return 0;
            }
            let change = bars[i].close - bars[i - self.lookback].close;
            direction(change > 0.0, change < 0.0)
        });
        Ok(hold_last_nonzero(raw))
    }
}
