use serde::{Deserialize, Serialize};

use super::pl::parse_leading_number;
use crate::models::{Outcome, Trade};

/// Aggregates shown above the trade table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalStats {
    pub total_trades: usize,
    pub wins: usize,
    /// Percent of Take outcomes; `None` for an empty journal
    pub win_rate: Option<f64>,
    /// Mean of parseable risk values
    pub avg_risk: Option<f64>,
    /// Mean of parseable reward multiples
    pub avg_rr: Option<f64>,
    /// Final point of the equity curve
    pub total_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub label: String,
    pub cumulative_pl: f64,
    pub trade_pl: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}

/// Numeric P/L of one trade; text without a leading number counts as 0
pub fn trade_pl(trade: &Trade) -> f64 {
    trade
        .pl
        .as_deref()
        .and_then(parse_leading_number)
        .unwrap_or(0.0)
}

pub fn compute_stats(trades: &[Trade]) -> JournalStats {
    let total_trades = trades.len();
    let wins = trades
        .iter()
        .filter(|t| t.outcome() == Some(Outcome::Take))
        .count();

    let win_rate = if total_trades > 0 {
        Some(wins as f64 / total_trades as f64 * 100.0)
    } else {
        None
    };

    let avg_risk = mean(
        trades
            .iter()
            .filter_map(|t| t.risk.as_deref().and_then(parse_leading_number)),
    );
    let avg_rr = mean(
        trades
            .iter()
            .filter_map(|t| t.rr.as_deref().and_then(parse_leading_number)),
    );

    JournalStats {
        total_trades,
        wins,
        win_rate,
        avg_risk,
        avg_rr,
        total_return: trades.iter().map(trade_pl).sum(),
    }
}

/// Running sum of P/L in list order, seeded with 0: `len() == trades.len() + 1`
pub fn equity_curve(trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut equity = 0.0;
    curve.push(equity);
    for trade in trades {
        equity += trade_pl(trade);
        curve.push(equity);
    }
    curve
}

/// Labelled chart series: `Start`, `Trade 1`, `Trade 2`, …
pub fn equity_points(trades: &[Trade]) -> Vec<EquityCurvePoint> {
    let curve = equity_curve(trades);
    let mut points = Vec::with_capacity(curve.len());
    points.push(EquityCurvePoint {
        label: "Start".to_string(),
        cumulative_pl: 0.0,
        trade_pl: 0.0,
    });
    for (i, trade) in trades.iter().enumerate() {
        points.push(EquityCurvePoint {
            label: format!("Trade {}", i + 1),
            cumulative_pl: curve[i + 1],
            trade_pl: trade_pl(trade),
        });
    }
    points
}
