//! Transaction cost model.
//!
//! Costs are expressed as a fraction of notional and debited directly from the
//! bar's return. They are only charged on bars whose trade flag is set.

use crate::domain::backtest::AnnotatedSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub commission: f64,
    pub slippage: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.commission + self.slippage
    }
}

impl CostModel {
    pub fn new(commission_rate: f64, slippage_rate: f64) -> Self {
        Self {
            commission_rate,
            slippage_rate,
        }
    }

    pub fn charge(&self, trade_flag: bool) -> CostBreakdown {
        if trade_flag {
            CostBreakdown {
                commission: self.commission_rate,
                slippage: self.slippage_rate,
            }
        } else {
            CostBreakdown::default()
        }
    }
}

/// Aggregate cost figures over a whole backtest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSummary {
    pub total_cost: f64,
    pub commission: f64,
    pub slippage: f64,
    pub trades: usize,
}

impl CostSummary {
    pub fn from_series(series: &AnnotatedSeries) -> Self {
        Self {
            total_cost: series.cost.iter().sum(),
            commission: series.commission_cost.iter().sum(),
            slippage: series.slippage_cost.iter().sum(),
            trades: series.trade_flag.iter().filter(|&&f| f != 0.0).count(),
        }
    }
}
