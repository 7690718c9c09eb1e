//! Multi-strategy signal combination.
//!
//! Matrices are row-major per bar: `signals[t][k]` is strategy k's value at
//! bar t. Per bar:
//!
//!   weight[t] = softmax(scores[t] / temperature)
//!   ensemble[t] = Σ_k weight[t][k] · signal[t][k]
//!
//! The softmax subtracts the row maximum before exponentiating. A
//! temperature ≤ 0 (or non-finite) is treated as 1.0. With weights summing
//! to 1 and signals in [-1, 1] the ensemble stays in [-1, 1].
//!
//! Weights come from a pluggable [`WeightSource`]: a rule-based regime
//! switch ([`RegimeWeights`]) or any opaque [`ScoreModel`] wrapped in
//! [`ScoreModelWeights`]. Sources only see bars up to and including t.

use crate::domain::error::StratlabError;
use crate::domain::indicator::calculate_sma;
use crate::domain::ohlcv::Bar;

pub const DEFAULT_DEAD_ZONE: f64 = 0.1;

fn effective_temperature(temperature: f64) -> f64 {
    if temperature.is_finite() && temperature > 0.0 {
        temperature
    } else {
        1.0
    }
}

/// Numerically stable softmax of one score row.
///
/// Non-finite scores get zero weight; a row with no finite score is uniform.
pub fn softmax_weights(scores: &[f64], temperature: f64) -> Vec<f64> {
    let k = scores.len();
    if k == 0 {
        return Vec::new();
    }
    let t = effective_temperature(temperature);
    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0 / k as f64; k];
    }

    let exps: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_finite() { ((s - max) / t).exp() } else { 0.0 })
        .collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Rescale each weight row to sum to 1. All-zero rows stay zero.
pub fn normalize_weights(weights: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StratlabError> {
    weights
        .iter()
        .enumerate()
        .map(|(t, row)| {
            if let Some(w) = row.iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(StratlabError::validation(format!(
                    "weight at bar {t} must be finite and non-negative, got {w}"
                )));
            }
            let total: f64 = row.iter().sum();
            if total == 0.0 {
                Ok(row.clone())
            } else {
                Ok(row.iter().map(|w| w / total).collect())
            }
        })
        .collect()
}

/// Check that `other` has the same N×K shape as `signals`; returns K.
fn check_shape(signals: &[Vec<f64>], other: &[Vec<f64>], what: &str) -> Result<usize, StratlabError> {
    if signals.len() != other.len() {
        return Err(StratlabError::validation(format!(
            "{what} has {} rows but signals have {}",
            other.len(),
            signals.len()
        )));
    }
    let k = signals.first().map_or(0, Vec::len);
    for (t, (s, o)) in signals.iter().zip(other).enumerate() {
        if s.len() != k || o.len() != k {
            return Err(StratlabError::validation(format!(
                "row {t}: expected {k} columns, got {} signals and {} {what}",
                s.len(),
                o.len()
            )));
        }
    }
    Ok(k)
}

fn weighted_sum(signals: &[f64], weights: &[f64]) -> f64 {
    signals.iter().zip(weights).map(|(s, w)| s * w).sum()
}

/// Softmax-weighted ensemble from raw per-strategy scores.
pub fn combine(
    signals: &[Vec<f64>],
    scores: &[Vec<f64>],
    temperature: f64,
) -> Result<Vec<f64>, StratlabError> {
    check_shape(signals, scores, "scores")?;
    Ok(signals
        .iter()
        .zip(scores)
        .map(|(s, sc)| weighted_sum(s, &softmax_weights(sc, temperature)))
        .collect())
}

/// Ensemble from explicit weights, normalized per row first.
pub fn combine_weighted(
    signals: &[Vec<f64>],
    weights: &[Vec<f64>],
) -> Result<Vec<f64>, StratlabError> {
    check_shape(signals, weights, "weights")?;
    let weights = normalize_weights(weights)?;
    Ok(signals
        .iter()
        .zip(&weights)
        .map(|(s, w)| weighted_sum(s, w))
        .collect())
}

/// Map a continuous ensemble value onto {-1, 0, 1}.
pub fn discretize(value: f64, dead_zone: f64) -> f64 {
    if value > dead_zone {
        1.0
    } else if value < -dead_zone {
        -1.0
    } else {
        0.0
    }
}

/// Turn K per-strategy columns of length N into N rows of length K.
pub fn to_rows(columns: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StratlabError> {
    let n = columns.first().map_or(0, Vec::len);
    if columns.iter().any(|c| c.len() != n) {
        return Err(StratlabError::validation(
            "base signals must all have the same length",
        ));
    }
    Ok((0..n).map(|t| columns.iter().map(|c| c[t]).collect()).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Trend,
    Range,
}

/// Trend when |SMA(short) - SMA(long)| / close exceeds `threshold`.
/// Bars before the long average is defined are `Range`.
pub fn classify_regimes(bars: &[Bar], short: usize, long: usize, threshold: f64) -> Vec<Regime> {
    let prices: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast = calculate_sma(&prices, short);
    let slow = calculate_sma(&prices, long);

    prices
        .iter()
        .zip(fast.into_iter().zip(slow))
        .map(|(&p, pair)| match pair {
            (Some(f), Some(s)) if (f - s).abs() / p > threshold => Regime::Trend,
            _ => Regime::Range,
        })
        .collect()
}

/// Produces an N×K weight matrix for K base strategies.
pub trait WeightSource: Send + Sync {
    /// `base` holds one signal column per strategy, each aligned with `bars`.
    fn weights(&self, bars: &[Bar], base: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StratlabError>;
}

/// One-hot weights: the trend slot in trending bars, the range slot otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeWeights {
    pub trend_short: usize,
    pub trend_long: usize,
    pub threshold: f64,
    pub trend_slot: usize,
    pub range_slot: usize,
}

impl WeightSource for RegimeWeights {
    fn weights(&self, bars: &[Bar], base: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StratlabError> {
        let k = base.len();
        if self.trend_slot >= k || self.range_slot >= k {
            return Err(StratlabError::validation(format!(
                "regime slots {}/{} out of range for {k} strategies",
                self.trend_slot, self.range_slot
            )));
        }
        let regimes = classify_regimes(bars, self.trend_short, self.trend_long, self.threshold);
        Ok(regimes
            .into_iter()
            .map(|r| {
                let mut row = vec![0.0; k];
                let slot = match r {
                    Regime::Trend => self.trend_slot,
                    Regime::Range => self.range_slot,
                };
                row[slot] = 1.0;
                row
            })
            .collect())
    }
}

/// Trailing view handed to a [`ScoreModel`]: the last `window` bars up to
/// and including the scored bar, and each base signal over the same span.
#[derive(Debug, Clone)]
pub struct ScoreWindow<'a> {
    pub bars: &'a [Bar],
    pub signals: Vec<&'a [f64]>,
}

/// Opaque per-bar scoring of K strategies. Higher is better.
pub trait ScoreModel: Send + Sync {
    /// Number of bars each window spans.
    fn window(&self) -> usize;

    /// One raw score per base strategy.
    fn score(&self, window: &ScoreWindow<'_>) -> Vec<f64>;
}

/// Softmax over a model's scores. Bars before the first full window get
/// all-zero weights.
#[derive(Debug, Clone)]
pub struct ScoreModelWeights<M> {
    pub model: M,
    pub temperature: f64,
}

impl<M: ScoreModel> WeightSource for ScoreModelWeights<M> {
    fn weights(&self, bars: &[Bar], base: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StratlabError> {
        let k = base.len();
        if base.iter().any(|c| c.len() != bars.len()) {
            return Err(StratlabError::validation(
                "base signals must be aligned with bars",
            ));
        }
        let window = self.model.window().max(1);

        (0..bars.len())
            .map(|t| {
                if t + 1 < window {
                    return Ok(vec![0.0; k]);
                }
                let start = t + 1 - window;
                let view = ScoreWindow {
                    bars: &bars[start..=t],
                    signals: base.iter().map(|c| &c[start..=t]).collect(),
                };
                let scores = self.model.score(&view);
                if scores.len() != k {
                    return Err(StratlabError::validation(format!(
                        "score model returned {} scores for {k} strategies",
                        scores.len()
                    )));
                }
                Ok(softmax_weights(&scores, self.temperature))
            })
            .collect()
    }
}

/// Scores each strategy by the return it would have realized over the
/// trailing `lookback` bars, with the usual one-bar execution lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingReturnScorer {
    pub lookback: usize,
}

impl ScoreModel for TrailingReturnScorer {
    fn window(&self) -> usize {
        self.lookback + 1
    }

    fn score(&self, window: &ScoreWindow<'_>) -> Vec<f64> {
        window
            .signals
            .iter()
            .map(|signal| {
                window
                    .bars
                    .windows(2)
                    .zip(signal.iter())
                    .map(|(pair, &position)| position * (pair[1].close / pair[0].close - 1.0))
                    .filter(|r| r.is_finite())
                    .sum()
            })
            .collect()
    }
}
