//! Grid-search optimizer over (short, long) strategy parameters.
//!
//! Every pair with short < long is evaluated independently: build the
//! strategy, generate its signal, run the backtest, and score the net returns
//! with the Sharpe ratio. Cells run on the rayon pool and only read the
//! shared bar series. The table is sorted by (short, long) before the best
//! row is picked, so ties resolve to the earliest pair regardless of the
//! order in which cells finished.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::backtest::{run_backtest, sorted_bars, BacktestConfig};
use crate::domain::error::StratlabError;
use crate::domain::metrics::sharpe_ratio;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{MovingAverage, SignalProvider};

pub const DEFAULT_SHORT_RANGE: [usize; 4] = [5, 10, 20, 30];
pub const DEFAULT_LONG_RANGE: [usize; 3] = [50, 100, 150];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub short: usize,
    pub long: usize,
    pub sharpe: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchResult {
    pub best: GridPoint,
    /// Every evaluated pair, ordered by (short, long).
    pub table: Vec<GridPoint>,
}

/// Grid search over the moving-average crossover strategy.
pub fn search(
    bars: &[Bar],
    short_range: &[usize],
    long_range: &[usize],
    config: &BacktestConfig,
) -> Result<GridSearchResult, StratlabError> {
    search_with(bars, short_range, long_range, config, |short, long| {
        let strategy: Box<dyn SignalProvider> = Box::new(MovingAverage::new(short, long)?);
        Ok(strategy)
    })
}

/// Grid search over any two-parameter strategy built by `factory`.
pub fn search_with<F>(
    bars: &[Bar],
    short_range: &[usize],
    long_range: &[usize],
    config: &BacktestConfig,
    factory: F,
) -> Result<GridSearchResult, StratlabError>
where
    F: Fn(usize, usize) -> Result<Box<dyn SignalProvider>, StratlabError> + Sync,
{
    let pairs = feasible_pairs(short_range, long_range);
    if pairs.is_empty() {
        return Err(StratlabError::EmptyResult {
            reason: "no parameter pair satisfies short < long".into(),
        });
    }

    let bars = sorted_bars(bars)?;
    let bars_per_year = config.risk_frequency.bars_per_year();
    info!(pairs = pairs.len(), bars = bars.len(), "grid search started");

    let mut table = pairs
        .par_iter()
        .map(|&(short, long)| {
            let strategy = factory(short, long)?;
            let signal = strategy.generate(&bars)?;
            let series = run_backtest(&bars, &signal, config)?;
            let sharpe = sharpe_ratio(&series.net_return, bars_per_year);
            debug!(short, long, sharpe, "grid cell evaluated");
            Ok(GridPoint {
                short,
                long,
                sharpe,
            })
        })
        .collect::<Result<Vec<_>, StratlabError>>()?;

    table.sort_by_key(|p| (p.short, p.long));
    let best = best_point(&table).ok_or_else(|| StratlabError::EmptyResult {
        reason: "no parameter pair produced a finite Sharpe ratio".into(),
    })?;
    info!(
        short = best.short,
        long = best.long,
        sharpe = best.sharpe,
        "grid search finished"
    );

    Ok(GridSearchResult { best, table })
}

/// Distinct (short, long) pairs with short < long, in ascending order.
pub fn feasible_pairs(short_range: &[usize], long_range: &[usize]) -> Vec<(usize, usize)> {
    let mut shorts = short_range.to_vec();
    shorts.sort_unstable();
    shorts.dedup();
    let mut longs = long_range.to_vec();
    longs.sort_unstable();
    longs.dedup();

    shorts
        .iter()
        .flat_map(|&s| longs.iter().filter(move |&&l| s < l).map(move |&l| (s, l)))
        .collect()
}

/// First row with the strictly greatest finite Sharpe.
pub fn best_point(table: &[GridPoint]) -> Option<GridPoint> {
    table
        .iter()
        .filter(|p| p.sharpe.is_finite())
        .fold(None, |best: Option<GridPoint>, p| match best {
            Some(b) if b.sharpe >= p.sharpe => Some(b),
            _ => Some(*p),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{bars_from_closes, wave};

    fn point(short: usize, long: usize, sharpe: f64) -> GridPoint {
        GridPoint { short, long, sharpe }
    }

    #[test]
    fn pairs_skip_infeasible() {
        let pairs = feasible_pairs(&[5, 50, 10], &[50, 20]);
        assert_eq!(pairs, vec![(5, 20), (5, 50), (10, 20), (10, 50)]);
        assert!(pairs.iter().all(|(s, l)| s < l));
    }

    #[test]
    fn empty_grid_is_an_error() {
        let bars = bars_from_closes(&wave(60));
        let err = search(&bars, &[50, 60], &[10, 20], &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, StratlabError::EmptyResult { .. }));
        let err = search(&bars, &[], &[10], &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, StratlabError::EmptyResult { .. }));
    }

    #[test]
    fn ties_go_to_first_pair() {
        let table = [point(5, 50, 1.0), point(5, 100, 1.0), point(10, 50, 0.5)];
        assert_eq!(best_point(&table), Some(point(5, 50, 1.0)));
    }

    #[test]
    fn non_finite_sharpe_never_wins() {
        let table = [point(5, 50, f64::NAN), point(5, 100, -0.2), point(10, 50, f64::INFINITY)];
        assert_eq!(best_point(&table), Some(point(5, 100, -0.2)));
        assert_eq!(best_point(&[point(1, 2, f64::NAN)]), None);
    }

    #[test]
    fn best_is_max_of_sorted_table() {
        let bars = bars_from_closes(&wave(300));
        let result = search(&bars, &[5, 10, 20], &[30, 60], &BacktestConfig::default()).unwrap();

        assert_eq!(result.table.len(), 6);
        let keys: Vec<_> = result.table.iter().map(|p| (p.short, p.long)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let max = result
            .table
            .iter()
            .map(|p| p.sharpe)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.best.sharpe, max);
    }

    #[test]
    fn factory_errors_propagate() {
        let bars = bars_from_closes(&wave(40));
        let err = search_with(&bars, &[1], &[2], &BacktestConfig::default(), |_, _| {
            Err(StratlabError::validation("nope"))
        })
        .unwrap_err();
        assert!(matches!(err, StratlabError::Validation { .. }));
    }
}
