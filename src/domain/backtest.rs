//! Backtest engine: price + signal → position, returns, cost, net return, equity.
//!
//! Pipeline order is fixed: sort by timestamp, lag the signal one bar into a
//! position, compute returns, flag trades and charge costs, then compound the
//! net return into equity. The one-bar lag is what keeps the strategy from
//! trading on information it could not have had.
//!
//! The engine never mutates its inputs and always returns a fresh
//! [`AnnotatedSeries`]. Feeding an output's `bars` and `signal` back in
//! recomputes every derived column from scratch.
//!
//! Known limitation: a NaN or non-positive close yields a NaN price return,
//! which then propagates into strategy/net return and equity instead of
//! raising.

use crate::domain::cost::CostModel;
use crate::domain::error::StratlabError;
use crate::domain::metrics::Frequency;
use crate::domain::ohlcv::Bar;

/// Engine output column names, in output order.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "position",
    "price_return",
    "strategy_return",
    "trade_flag",
    "commission_cost",
    "slippage_cost",
    "cost",
    "net_return",
    "equity",
];

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub risk_frequency: Frequency,
}

impl BacktestConfig {
    pub fn new(
        initial_capital: f64,
        commission_rate: f64,
        slippage_rate: f64,
        risk_frequency: Frequency,
    ) -> Result<Self, StratlabError> {
        if !(initial_capital > 0.0 && initial_capital.is_finite()) {
            return Err(StratlabError::validation(
                "initial_capital must be positive",
            ));
        }
        if !(commission_rate >= 0.0 && commission_rate.is_finite()) {
            return Err(StratlabError::validation(
                "commission_rate must be non-negative",
            ));
        }
        if !(slippage_rate >= 0.0 && slippage_rate.is_finite()) {
            return Err(StratlabError::validation(
                "slippage_rate must be non-negative",
            ));
        }
        Ok(Self {
            initial_capital,
            commission_rate,
            slippage_rate,
            risk_frequency,
        })
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.commission_rate, self.slippage_rate)
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            commission_rate: 0.0005,
            slippage_rate: 0.0002,
            risk_frequency: Frequency::Daily,
        }
    }
}

/// Price series annotated with the engine's derived columns. All vectors have
/// the same length as `bars`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub bars: Vec<Bar>,
    /// Raw signal with missing entries replaced by 0.
    pub signal: Vec<f64>,
    pub position: Vec<f64>,
    pub price_return: Vec<f64>,
    pub strategy_return: Vec<f64>,
    /// 1.0 where the raw signal changed from the previous bar, else 0.0.
    pub trade_flag: Vec<f64>,
    pub commission_cost: Vec<f64>,
    pub slippage_cost: Vec<f64>,
    pub cost: Vec<f64>,
    pub net_return: Vec<f64>,
    pub equity: Vec<f64>,
}

impl AnnotatedSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Look up a derived column by its stable name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let col = match name {
            "position" => &self.position,
            "price_return" => &self.price_return,
            "strategy_return" => &self.strategy_return,
            "trade_flag" => &self.trade_flag,
            "commission_cost" => &self.commission_cost,
            "slippage_cost" => &self.slippage_cost,
            "cost" => &self.cost,
            "net_return" => &self.net_return,
            "equity" => &self.equity,
            _ => return None,
        };
        Some(col)
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity.last().copied()
    }
}

/// Run the backtest pipeline.
///
/// `signal` must be aligned 1:1 with `bars`; `None` and NaN entries mean
/// "no signal" and are treated as flat. Bars are sorted by timestamp before
/// processing and duplicate timestamps are rejected.
pub fn run_backtest<S>(
    bars: &[Bar],
    signal: &[S],
    config: &BacktestConfig,
) -> Result<AnnotatedSeries, StratlabError>
where
    S: Copy + Into<Option<f64>>,
{
    if signal.len() != bars.len() {
        return Err(StratlabError::validation(format!(
            "signal has {} values but price series has {} bars",
            signal.len(),
            bars.len()
        )));
    }

    let (bars, signal) = sort_by_timestamp(bars, signal)?;
    let n = bars.len();
    tracing::debug!(bars = n, "running backtest");

    let position = lag_position(&signal);
    let price_return = price_returns(&bars);
    let strategy_return: Vec<f64> = position
        .iter()
        .zip(&price_return)
        .map(|(p, r)| p * r)
        .collect();

    let trade_flag = trade_flags(&signal);
    let model = config.cost_model();
    let mut commission_cost = Vec::with_capacity(n);
    let mut slippage_cost = Vec::with_capacity(n);
    let mut cost = Vec::with_capacity(n);
    for &flag in &trade_flag {
        let charge = model.charge(flag != 0.0);
        commission_cost.push(charge.commission);
        slippage_cost.push(charge.slippage);
        cost.push(charge.total());
    }

    let net_return: Vec<f64> = strategy_return
        .iter()
        .zip(&cost)
        .map(|(r, c)| r - c)
        .collect();

    let mut equity = Vec::with_capacity(n);
    let mut growth = 1.0_f64;
    for r in &net_return {
        growth *= 1.0 + r;
        equity.push(config.initial_capital * growth);
    }

    Ok(AnnotatedSeries {
        bars,
        signal,
        position,
        price_return,
        strategy_return,
        trade_flag,
        commission_cost,
        slippage_cost,
        cost,
        net_return,
        equity,
    })
}

/// Bars in timestamp order, rejecting duplicates. Strategies must see bars
/// in this order for their signal to line up with the engine's sort.
pub fn sorted_bars(bars: &[Bar]) -> Result<Vec<Bar>, StratlabError> {
    let no_signal = vec![None::<f64>; bars.len()];
    sort_by_timestamp(bars, &no_signal).map(|(sorted, _)| sorted)
}

fn sort_by_timestamp<S>(bars: &[Bar], signal: &[S]) -> Result<(Vec<Bar>, Vec<f64>), StratlabError>
where
    S: Copy + Into<Option<f64>>,
{
    let mut order: Vec<usize> = (0..bars.len()).collect();
    order.sort_by_key(|&i| bars[i].timestamp);

    for pair in order.windows(2) {
        let ts = bars[pair[1]].timestamp;
        if bars[pair[0]].timestamp == ts {
            return Err(StratlabError::validation(format!(
                "duplicate timestamp {ts}"
            )));
        }
    }

    let sorted_bars = order.iter().map(|&i| bars[i].clone()).collect();
    let sorted_signal = order
        .iter()
        .map(|&i| match signal[i].into() {
            Some(v) if !v.is_nan() => v,
            _ => 0.0,
        })
        .collect();
    Ok((sorted_bars, sorted_signal))
}

fn lag_position(signal: &[f64]) -> Vec<f64> {
    let mut position = Vec::with_capacity(signal.len());
    if !signal.is_empty() {
        position.push(0.0);
        position.extend_from_slice(&signal[..signal.len() - 1]);
    }
    position
}

fn price_returns(bars: &[Bar]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            returns.push(0.0);
            continue;
        }
        let prev = bars[i - 1].close;
        let r = if prev > 0.0 && bar.close > 0.0 {
            bar.close / prev - 1.0
        } else {
            f64::NAN
        };
        returns.push(r);
    }
    returns
}

fn trade_flags(signal: &[f64]) -> Vec<f64> {
    let mut flags = Vec::with_capacity(signal.len());
    for i in 0..signal.len() {
        let changed = i > 0 && signal[i] != signal[i - 1];
        flags.push(if changed { 1.0 } else { 0.0 });
    }
    flags
}
