use anyhow::{Context as _, Result};
use serde::Serialize;

use super::trades::open_journal;
use super::Context;
use crate::journal::{EquityCurvePoint, JournalStats};

#[derive(Serialize)]
struct StatsReport<'a> {
    stats: &'a JournalStats,
    equity_curve: &'a [EquityCurvePoint],
}

pub async fn show(ctx: &Context, json: bool) -> Result<()> {
    open_journal(ctx).await?;

    let state = ctx.app.snapshot().await;
    let view = ctx.app.view().await;

    if json {
        let report = StatsReport {
            stats: state.trades.stats(),
            equity_curve: &view.chart,
        };
        let out = serde_json::to_string_pretty(&report).context("Failed to encode stats")?;
        println!("{}", out);
        return Ok(());
    }

    let s = &view.stats;
    println!("Trades:   {}", s.total_trades);
    println!("Win rate: {}", s.win_rate);
    println!("Avg risk: {}", s.avg_risk);
    println!("Avg RR:   {}", s.avg_rr);
    println!("Return:   {}", s.total_return);
    println!();
    for point in &view.chart {
        println!("{:>10}  {:>8.2}", point.label, point.cumulative_pl);
    }
    Ok(())
}
