//! Strategy definitions: the signal provider trait, the uniform parameter
//! struct, and the tag → constructor registry.
//!
//! A signal is one value per bar, conventionally in {-1, 0, 1}. Every
//! provider must be causal: the value at bar t may only read bars ≤ t.

pub mod bollinger;
pub mod breakout;
pub mod ensemble;
pub mod ma;
pub mod macd;
pub mod momentum;
pub mod regime;
pub mod rsi;
pub mod zscore;

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::Bar;
use std::collections::BTreeMap;

pub use bollinger::Bollinger;
pub use breakout::Breakout;
pub use ensemble::EnsembleWeighted;
pub use ma::MovingAverage;
pub use macd::Macd;
pub use momentum::Momentum;
pub use regime::{RegimeSwitch, TrendMode};
pub use rsi::Rsi;
pub use zscore::ZScore;

/// Produces a per-bar directional signal from price history.
pub trait SignalProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One signal value per input bar.
    fn generate(&self, bars: &[Bar]) -> Result<Vec<f64>, StratlabError>;
}

/// Carry the last non-zero direction forward: a 0 reading means "no new
/// information" and holds the previous position.
pub fn hold_last_nonzero<I>(raw: I) -> Vec<f64>
where
    I: IntoIterator<Item = i8>,
{
    raw.into_iter()
        .scan(0i8, |last, r| {
            if r != 0 {
                *last = r;
            }
            Some(f64::from(*last))
        })
        .collect()
}

/// +1 / -1 / 0 from a pair of threshold tests.
pub(crate) fn direction(long: bool, short: bool) -> i8 {
    if long {
        1
    } else if short {
        -1
    } else {
        0
    }
}

/// Uniform strategy configuration: string-keyed values with typed getters
/// that fall back to each strategy's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyParams {
    values: BTreeMap<String, String>,
}

impl StrategyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_usize(&self, key: &str, default: usize) -> Result<usize, StratlabError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(v) => v.trim().parse().map_err(|_| {
                StratlabError::validation(format!(
                    "parameter {key} must be a non-negative integer, got '{v}'"
                ))
            }),
        }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> Result<f64, StratlabError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(v) => v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| {
                    StratlabError::validation(format!("parameter {key} must be a number, got '{v}'"))
                }),
        }
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for StrategyParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { values }
    }
}

pub(crate) fn require_positive(name: &str, value: usize) -> Result<usize, StratlabError> {
    if value == 0 {
        return Err(StratlabError::validation(format!("{name} must be at least 1")));
    }
    Ok(value)
}

type Constructor = fn(&StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError>;

fn boxed<S: SignalProvider + 'static>(strategy: S) -> Box<dyn SignalProvider> {
    Box::new(strategy)
}

fn build_ma(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    MovingAverage::from_params(p).map(boxed)
}

fn build_rsi(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    Rsi::from_params(p).map(boxed)
}

fn build_macd(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    Macd::from_params(p).map(boxed)
}

fn build_bollinger(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    Bollinger::from_params(p).map(boxed)
}

fn build_breakout(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    Breakout::from_params(p).map(boxed)
}

fn build_momentum(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    Momentum::from_params(p).map(boxed)
}

fn build_zscore(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    ZScore::from_params(p).map(boxed)
}

fn build_regime(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    RegimeSwitch::from_params(p).map(boxed)
}

fn build_ensemble(p: &StrategyParams) -> Result<Box<dyn SignalProvider>, StratlabError> {
    EnsembleWeighted::from_params(p).map(boxed)
}

static REGISTRY: &[(&str, Constructor)] = &[
    ("ma", build_ma),
    ("rsi", build_rsi),
    ("macd", build_macd),
    ("bollinger", build_bollinger),
    ("breakout", build_breakout),
    ("momentum", build_momentum),
    ("zscore", build_zscore),
    ("meta_regime", build_regime),
    ("meta_ensemble", build_ensemble),
];

/// Registered strategy tags, in registry order.
pub fn strategy_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Resolve a strategy tag and construct it from `params`.
pub fn build_strategy(
    name: &str,
    params: &StrategyParams,
) -> Result<Box<dyn SignalProvider>, StratlabError> {
    let key = name.trim().to_lowercase();
    match REGISTRY.iter().find(|(tag, _)| *tag == key) {
        Some((_, ctor)) => ctor(params),
        None => Err(StratlabError::UnknownStrategy {
            name: name.to_string(),
            available: strategy_names().join(", "),
        }),
    }
}
