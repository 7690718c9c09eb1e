//! Trade event extraction from an annotated backtest.
//!
//! Walks the raw signal bar by bar and emits discrete events whenever the
//! direction changes. Direction is the sign of the signal, so continuous
//! ensemble signals are read as long/flat/short. Each position is sized at
//! one unit, so realized PnL is a price difference.

use crate::domain::backtest::AnnotatedSeries;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeAction {
    OpenLong,
    OpenShort,
    Close,
    ReverseClose,
    ReverseOpen,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::OpenLong => "OPEN_LONG",
            TradeAction::OpenShort => "OPEN_SHORT",
            TradeAction::Close => "CLOSE",
            TradeAction::ReverseClose => "REVERSE_CLOSE",
            TradeAction::ReverseOpen => "REVERSE_OPEN",
        }
    }

    /// True for events that realize PnL.
    pub fn is_closing(&self) -> bool {
        matches!(self, TradeAction::Close | TradeAction::ReverseClose)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub timestamp: NaiveDateTime,
    pub action: TradeAction,
    pub price: f64,
    /// Position held after the event: -1, 0 or 1.
    pub position: i8,
    pub pnl: f64,
}

fn direction(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Extract the ordered trade events of a backtest. The walk starts flat, so
/// a signal already set on the first bar opens a position there.
pub fn extract_trades(series: &AnnotatedSeries) -> Vec<TradeEvent> {
    let mut events = Vec::new();
    let mut entry_price = 0.0_f64;
    let mut prev = 0i8;

    for i in 0..series.len() {
        let curr = direction(series.signal[i]);
        if curr == prev {
            continue;
        }
        let bar = &series.bars[i];
        let price = bar.close;

        match (prev, curr) {
            (0, side) => {
                entry_price = price;
                events.push(TradeEvent {
                    timestamp: bar.timestamp,
                    action: if side > 0 {
                        TradeAction::OpenLong
                    } else {
                        TradeAction::OpenShort
                    },
                    price,
                    position: side,
                    pnl: 0.0,
                });
            }
            (side, 0) => {
                events.push(TradeEvent {
                    timestamp: bar.timestamp,
                    action: TradeAction::Close,
                    price,
                    position: 0,
                    pnl: (price - entry_price) * f64::from(side),
                });
            }
            (side, new_side) => {
                events.push(TradeEvent {
                    timestamp: bar.timestamp,
                    action: TradeAction::ReverseClose,
                    price,
                    position: 0,
                    pnl: (price - entry_price) * f64::from(side),
                });
                entry_price = price;
                events.push(TradeEvent {
                    timestamp: bar.timestamp,
                    action: TradeAction::ReverseOpen,
                    price,
                    position: new_side,
                    pnl: 0.0,
                });
            }
        }
        prev = curr;
    }

    events
}
