//! Softmax-weighted ensemble of base strategies.
//!
//! The default build combines `ma`, `rsi`, `macd` and `bollinger`, weighting
//! each bar by the softmax of every strategy's trailing realized return.
//! The continuous ensemble value is discretized through a dead zone unless
//! one is disabled, in which case the raw weighted value is emitted.

use crate::domain::combiner::{
    combine_weighted, discretize, to_rows, ScoreModelWeights, TrailingReturnScorer, WeightSource,
    DEFAULT_DEAD_ZONE,
};
use crate::domain::error::StratlabError;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{
    require_positive, Bollinger, Macd, MovingAverage, Rsi, SignalProvider, StrategyParams,
};

pub struct EnsembleWeighted {
    bases: Vec<Box<dyn SignalProvider>>,
    weights: Box<dyn WeightSource>,
    dead_zone: Option<f64>,
}

impl EnsembleWeighted {
    pub fn new(
        bases: Vec<Box<dyn SignalProvider>>,
        weights: Box<dyn WeightSource>,
        dead_zone: Option<f64>,
    ) -> Result<Self, StratlabError> {
        if bases.is_empty() {
            return Err(StratlabError::validation("ensemble needs at least one base strategy"));
        }
        if dead_zone.is_some_and(|d| !(0.0..1.0).contains(&d)) {
            return Err(StratlabError::validation("dead_zone must be in [0, 1)"));
        }
        Ok(Self {
            bases,
            weights,
            dead_zone,
        })
    }

    pub fn from_params(params: &StrategyParams) -> Result<Self, StratlabError> {
        let lookback = require_positive("lookback", params.get_usize("lookback", 20)?)?;
        let temperature = params.get_f64("temperature", 1.0)?;
        let dead_zone = params.get_f64("dead_zone", DEFAULT_DEAD_ZONE)?;

        let defaults = StrategyParams::new();
        let bases: Vec<Box<dyn SignalProvider>> = vec![
            Box::new(MovingAverage::from_params(&defaults)?),
            Box::new(Rsi::from_params(&defaults)?),
            Box::new(Macd::from_params(&defaults)?),
            Box::new(Bollinger::from_params(&defaults)?),
        ];
        let weights = ScoreModelWeights {
            model: TrailingReturnScorer { lookback },
            temperature,
        };
        Self::new(bases, Box::new(weights), Some(dead_zone))
    }

    pub fn base_names(&self) -> Vec<&str> {
        self.bases.iter().map(|b| b.name()).collect()
    }

    /// Continuous weighted signal before dead-zone discretization.
    pub fn weighted_signal(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let base = self
            .bases
            .iter()
            .map(|b| b.generate(bars))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = self.weights.weights(bars, &base)?;
        combine_weighted(&to_rows(&base)?, &weights)
    }
}

impl SignalProvider for EnsembleWeighted {
    fn name(&self) -> &str {
        "meta_ensemble"
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError> {
        let combined = self.weighted_signal(bars)?;
        tracing::debug!(
            bases = self.bases.len(),
            bars = bars.len(),
            "ensemble signal computed"
        );
        Ok(match self.dead_zone {
            Some(dz) => combined.into_iter().map(|v| discretize(v, dz)).collect(),
            None => combined,
        })
    }
}
