//! Risk and performance metrics.
//!
//! Degenerate inputs (too few samples, zero variance, no closed trades) are
//! routine for short or flat windows, so they never raise: ratios fall back
//! to `0.0` and trade statistics that cannot be computed are `None`.

use crate::domain::backtest::AnnotatedSeries;
use crate::domain::cost::CostSummary;
use crate::domain::error::StratlabError;
use crate::domain::trade_log::TradeEvent;
use std::fmt;
use std::str::FromStr;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const TRADING_HOURS_PER_DAY: f64 = 6.5;

/// Bar frequency used to annualize per-bar statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Hourly,
    Minute,
}

impl Frequency {
    pub fn bars_per_year(&self) -> f64 {
        match self {
            Frequency::Daily => TRADING_DAYS_PER_YEAR,
            Frequency::Hourly => TRADING_DAYS_PER_YEAR * TRADING_HOURS_PER_DAY,
            Frequency::Minute => TRADING_DAYS_PER_YEAR * TRADING_HOURS_PER_DAY * 60.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "1d",
            Frequency::Hourly => "1h",
            Frequency::Minute => "1min",
        }
    }
}

impl FromStr for Frequency {
    type Err = StratlabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Frequency::Daily),
            "1h" => Ok(Frequency::Hourly),
            "1min" => Ok(Frequency::Minute),
            _ => Err(StratlabError::UnsupportedFrequency {
                freq: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annualization factor for a frequency key (`1d`, `1h`, `1min`).
pub fn annualization_factor(freq: &str) -> Result<f64, StratlabError> {
    Ok(freq.parse::<Frequency>()?.bars_per_year())
}

/// Drop NaN and infinite values.
pub fn clean_returns(returns: &[f64]) -> Vec<f64> {
    returns.iter().copied().filter(|r| r.is_finite()).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1). `None` below two samples.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Annualized Sharpe ratio: mean / std · sqrt(bars_per_year), zero risk-free
/// rate. Returns 0.0 with fewer than two finite samples or zero deviation.
pub fn sharpe_ratio(returns: &[f64], bars_per_year: f64) -> f64 {
    let cleaned = clean_returns(returns);
    match sample_std(&cleaned) {
        Some(std) if std > 0.0 => mean(&cleaned) / std * bars_per_year.sqrt(),
        _ => 0.0,
    }
}

/// Annualized standard deviation of returns. 0.0 with fewer than two samples.
pub fn volatility(returns: &[f64], bars_per_year: f64) -> f64 {
    let cleaned = clean_returns(returns);
    sample_std(&cleaned).map_or(0.0, |std| std * bars_per_year.sqrt())
}

/// Annualized Sortino ratio using the downside deviation of negative returns.
pub fn sortino_ratio(returns: &[f64], bars_per_year: f64) -> f64 {
    let cleaned = clean_returns(returns);
    if cleaned.len() < 2 {
        return 0.0;
    }
    let n = cleaned.len() as f64;
    let downside = cleaned
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r * r)
        .sum::<f64>()
        / n;
    let downside_dev = downside.sqrt();
    if downside_dev > 0.0 {
        mean(&cleaned) / downside_dev * bars_per_year.sqrt()
    } else {
        0.0
    }
}

/// Largest relative decline from the running peak, as a value ≤ 0.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    compute_drawdown(equity).0
}

/// (max drawdown ≤ 0, longest run of bars spent below a prior peak).
fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    if equity.len() < 2 {
        return (0.0, 0);
    }

    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &value in equity.iter().filter(|v| v.is_finite()) {
        if value >= peak {
            peak = value;
            current_duration = 0;
            continue;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
        current_duration += 1;
        max_duration = max_duration.max(current_duration);
    }

    (max_dd, max_duration)
}

/// Statistics over closed trades (events with non-zero PnL).
///
/// `None` marks a statistic that is undefined for the given events: no
/// closed trades, no losses for the profit factor, or no trades on a side.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub win_rate: Option<f64>,
    pub profit_factor: Option<f64>,
    pub avg_win: Option<f64>,
    /// Mean of losing PnLs, negative.
    pub avg_loss: Option<f64>,
    pub max_consecutive_losses: Option<usize>,
    pub long_trades: usize,
    pub short_trades: usize,
    pub long_win_rate: Option<f64>,
    pub short_win_rate: Option<f64>,
}

impl TradeStats {
    fn undefined() -> Self {
        TradeStats {
            total_trades: 0,
            win_rate: None,
            profit_factor: None,
            avg_win: None,
            avg_loss: None,
            max_consecutive_losses: None,
            long_trades: 0,
            short_trades: 0,
            long_win_rate: None,
            short_win_rate: None,
        }
    }

    pub fn compute(events: &[TradeEvent]) -> Self {
        if events.is_empty() {
            return Self::undefined();
        }

        // Closing events carry position 0; attribute each to the side opened
        // by the most recent open event.
        let mut open_side = 0i8;
        let mut closed: Vec<(f64, i8)> = Vec::new();
        for event in events {
            if event.position != 0 {
                open_side = event.position;
            }
            if event.pnl != 0.0 {
                let side = if event.position != 0 {
                    event.position
                } else {
                    open_side
                };
                closed.push((event.pnl, side));
            }
        }

        let wins: Vec<f64> = closed.iter().map(|c| c.0).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = closed.iter().map(|c| c.0).filter(|&p| p < 0.0).collect();
        let total_trades = closed.len();

        let win_rate = (total_trades > 0).then(|| wins.len() as f64 / total_trades as f64);
        let profit_factor = (!losses.is_empty())
            .then(|| wins.iter().sum::<f64>() / losses.iter().sum::<f64>().abs());
        let avg_win = (!wins.is_empty()).then(|| mean(&wins));
        let avg_loss = (!losses.is_empty()).then(|| mean(&losses));

        let mut max_consecutive_losses = 0usize;
        let mut current = 0usize;
        for (pnl, _) in &closed {
            if *pnl < 0.0 {
                current += 1;
                max_consecutive_losses = max_consecutive_losses.max(current);
            } else {
                current = 0;
            }
        }

        let side_win_rate = |side: i8| -> (usize, Option<f64>) {
            let side_pnls: Vec<f64> = closed
                .iter()
                .filter(|c| c.1 == side)
                .map(|c| c.0)
                .collect();
            let n = side_pnls.len();
            let rate = (n > 0).then(|| side_pnls.iter().filter(|&&p| p > 0.0).count() as f64 / n as f64);
            (n, rate)
        };
        let (long_trades, long_win_rate) = side_win_rate(1);
        let (short_trades, short_win_rate) = side_win_rate(-1);

        TradeStats {
            total_trades,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            max_consecutive_losses: Some(max_consecutive_losses),
            long_trades,
            short_trades,
            long_win_rate,
            short_win_rate,
        }
    }
}

/// Full performance report for one backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub volatility: f64,
    pub trade_events: usize,
    pub costs: CostSummary,
    pub trade_stats: TradeStats,
}

impl PerformanceSummary {
    pub fn compute(series: &AnnotatedSeries, events: &[TradeEvent], freq: Frequency) -> Self {
        let bars_per_year = freq.bars_per_year();
        let initial = series.equity.first().copied().unwrap_or(0.0);
        let final_equity = series.final_equity().unwrap_or(initial);

        let total_return = if initial > 0.0 {
            final_equity / initial - 1.0
        } else {
            0.0
        };

        let years = series.len() as f64 / bars_per_year;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0
        {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&series.equity);

        PerformanceSummary {
            final_equity,
            total_return,
            annualized_return,
            sharpe_ratio: sharpe_ratio(&series.net_return, bars_per_year),
            sortino_ratio: sortino_ratio(&series.net_return, bars_per_year),
            max_drawdown,
            max_drawdown_duration,
            volatility: volatility(&series.net_return, bars_per_year),
            trade_events: events.len(),
            costs: CostSummary::from_series(series),
            trade_stats: TradeStats::compute(events),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade_log::TradeAction;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn event(action: TradeAction, price: f64, position: i8, pnl: f64) -> TradeEvent {
        TradeEvent {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            action,
            price,
            position,
            pnl,
        }
    }

    #[test]
    fn frequency_table() {
        assert_eq!(annualization_factor("1d").unwrap(), 252.0);
        assert_eq!(annualization_factor("1h").unwrap(), 252.0 * 6.5);
        assert_eq!(annualization_factor("1min").unwrap(), 252.0 * 6.5 * 60.0);
        assert_eq!(annualization_factor("1H").unwrap(), 252.0 * 6.5);
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let err = annualization_factor("1w").unwrap_err();
        assert!(matches!(err, StratlabError::UnsupportedFrequency { .. }));
    }

    #[test]
    fn frequency_display_round_trips() {
        for f in [Frequency::Daily, Frequency::Hourly, Frequency::Minute] {
            assert_eq!(f.to_string().parse::<Frequency>().unwrap(), f);
        }
    }

    #[test]
    fn sharpe_known_value() {
        let returns: [f64; 4] = [0.01, -0.005, 0.02, 0.0];
        let m = 0.025 / 4.0;
        let var = returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / 3.0;
        let expected = m / var.sqrt() * 252f64.sqrt();
        assert_relative_eq!(sharpe_ratio(&returns, 252.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_ignores_non_finite() {
        let with_junk = [0.01, f64::NAN, -0.005, f64::INFINITY, 0.02, f64::NEG_INFINITY, 0.0];
        let clean = [0.01, -0.005, 0.02, 0.0];
        assert_relative_eq!(sharpe_ratio(&with_junk, 252.0), sharpe_ratio(&clean, 252.0));
    }

    #[test]
    fn sharpe_degenerate_is_zero() {
        assert_eq!(sharpe_ratio(&[], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.05], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[f64::NAN, f64::NAN], 252.0), 0.0);
    }

    #[test]
    fn flat_equity_has_no_risk() {
        let equity = [1000.0, 1000.0, 1000.0];
        let returns = [0.0, 0.0, 0.0];
        assert_eq!(max_drawdown(&equity), 0.0);
        assert_eq!(sharpe_ratio(&returns, 252.0), 0.0);
        assert_eq!(volatility(&returns, 252.0), 0.0);
    }

    #[test]
    fn volatility_known_value() {
        let returns = [0.01, -0.01];
        // sample std = sqrt(2 * 0.0001 / 1)
        let expected = (0.0002f64).sqrt() * 252f64.sqrt();
        assert_relative_eq!(volatility(&returns, 252.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn drawdown_from_peak() {
        let equity = [100.0, 110.0, 90.0, 95.0, 80.0, 100.0];
        assert_relative_eq!(max_drawdown(&equity), (80.0 - 110.0) / 110.0);
        let (_, duration) = compute_drawdown(&equity);
        assert_eq!(duration, 4);
    }

    #[test]
    fn drawdown_short_input_is_zero() {
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[100.0]), 0.0);
    }

    #[test]
    fn drawdown_of_rising_curve_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn sortino_requires_losses() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.03], 252.0), 0.0);
        assert!(sortino_ratio(&[0.01, -0.02, 0.03], 252.0) > 0.0);
    }

    #[test]
    fn trade_stats_empty_is_undefined() {
        let stats = TradeStats::compute(&[]);
        assert_eq!(stats.total_trades, 0);
        assert!(stats.win_rate.is_none());
        assert!(stats.profit_factor.is_none());
        assert!(stats.avg_win.is_none());
        assert!(stats.avg_loss.is_none());
        assert!(stats.max_consecutive_losses.is_none());
        assert!(stats.long_win_rate.is_none());
        assert!(stats.short_win_rate.is_none());
    }

    #[test]
    fn trade_stats_single_winner() {
        let events = [
            event(TradeAction::OpenLong, 100.0, 1, 0.0),
            event(TradeAction::Close, 110.0, 0, 10.0),
        ];
        let stats = TradeStats::compute(&events);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.win_rate, Some(1.0));
        assert_eq!(stats.profit_factor, None);
        assert_eq!(stats.avg_win, Some(10.0));
        assert_eq!(stats.max_consecutive_losses, Some(0));
        assert_eq!(stats.long_trades, 1);
        assert_eq!(stats.long_win_rate, Some(1.0));
        assert_eq!(stats.short_trades, 0);
        assert_eq!(stats.short_win_rate, None);
    }

    #[test]
    fn trade_stats_mixed() {
        let events = [
            event(TradeAction::OpenLong, 100.0, 1, 0.0),
            event(TradeAction::ReverseClose, 90.0, 0, -10.0),
            event(TradeAction::ReverseOpen, 90.0, -1, 0.0),
            event(TradeAction::Close, 95.0, 0, -5.0),
            event(TradeAction::OpenLong, 95.0, 1, 0.0),
            event(TradeAction::Close, 125.0, 0, 30.0),
        ];
        let stats = TradeStats::compute(&events);
        assert_eq!(stats.total_trades, 3);
        assert_relative_eq!(stats.win_rate.unwrap(), 1.0 / 3.0);
        assert_relative_eq!(stats.profit_factor.unwrap(), 2.0);
        assert_relative_eq!(stats.avg_win.unwrap(), 30.0);
        assert_relative_eq!(stats.avg_loss.unwrap(), -7.5);
        assert_eq!(stats.max_consecutive_losses, Some(2));
        assert_eq!(stats.long_trades, 2);
        assert_eq!(stats.short_trades, 1);
        assert_relative_eq!(stats.long_win_rate.unwrap(), 0.5);
        assert_eq!(stats.short_win_rate, Some(0.0));
    }

    #[test]
    fn trade_stats_opens_only() {
        let events = [event(TradeAction::OpenShort, 100.0, -1, 0.0)];
        let stats = TradeStats::compute(&events);
        assert_eq!(stats.total_trades, 0);
        assert!(stats.win_rate.is_none());
        assert_eq!(stats.max_consecutive_losses, Some(0));
    }
}
