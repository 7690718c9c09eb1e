//! MACD trend following with persistence: long while the MACD line is above
//! its signal line, short while below.

use crate::domain::error::StratlabError;
use crate::domain::indicator::calculate_macd;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::ohlcv::{closes, Bar};
use crate::domain::strategy::{
    direction, hold_last_nonzero, require_positive, SignalProvider, StrategyParams,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, StratlabError> {
        require_positive("fast", fast)?;
        require_positive("slow", slow)?;
        require_positive("signal_window", signal)?;
        Ok(Self { fast, slow, signal })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        Self::new(
            params.get_usize("fast", DEFAULT_FAST)?,
            params.get_usize("slow", DEFAULT_SLOW)?,
            params.get_usize("signal_window", DEFAULT_SIGNAL)?,
        )
    }
}

impl SignalProvider for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let points = calculate_macd(&closes(bars), self.fast, self.slow, self.signal);
        let raw = points
            .into_iter()
            .map(|p| direction(p.line > p.signal, p.line < p.signal));
        Ok(hold_last_nonzero(raw))
    }
}
