use std::io::{self, BufRead, Write};

use super::render::{JournalView, TradeRow};
use super::{Prompt, ViewSink};

/// Plain-text table on any writer, stdout by default
pub struct TerminalSink<W: Write = io::Stdout> {
    out: W,
}

impl TerminalSink {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_view(&mut self, view: &JournalView) -> io::Result<()> {
        if let Some(email) = &view.user_email {
            writeln!(self.out, "{}", email)?;
        }
        if view.read_only {
            writeln!(self.out, "[read-only]")?;
        }
        if let Some(banner) = &view.banner {
            writeln!(self.out, "{}", banner)?;
        }

        if !view.rows.is_empty() {
            writeln!(
                self.out,
                "{:>3}  {:<8} {:<12} {:<9} {:<5} {:<14} {:>6} {:>5} {:>8}  {}",
                "#", "Pair", "Date", "Session", "Dir", "Setup", "Risk", "RR", "P/L", "Result"
            )?;
            for row in &view.rows {
                self.write_row(row)?;
            }
        } else if let Some(empty) = &view.empty_message {
            writeln!(self.out, "{}", empty)?;
        }

        let s = &view.stats;
        writeln!(
            self.out,
            "\nTrades: {}  Win rate: {}  Avg risk: {}  Avg RR: {}  Return: {}",
            s.total_trades, s.win_rate, s.avg_risk, s.avg_rr, s.total_return
        )?;
        self.out.flush()
    }

    fn write_row(&mut self, row: &TradeRow) -> io::Result<()> {
        writeln!(
            self.out,
            "{:>3}  {:<8} {:<12} {:<9} {:<5} {:<14} {:>6} {:>5} {:>8}  {}",
            row.number,
            row.asset,
            row.date,
            row.session,
            row.direction,
            truncate(&row.setup, 14),
            row.risk,
            row.rr,
            row.pl,
            row.result
        )?;
        if let Some(link) = &row.chart_link {
            writeln!(self.out, "     {}", link)?;
        }
        Ok(())
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

impl<W: Write> ViewSink for TerminalSink<W> {
    fn commit(&mut self, view: &JournalView) {
        if let Err(e) = self.write_view(view) {
            log::error!("Failed to write view: {}", e);
        }
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "{}", message) {
            log::error!("Failed to write message: {}", e);
        }
    }
}

/// Asks on stderr, reads the answer from stdin
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        eprint!("{} [y/N] ", question);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "т" | "так")
    }
}

/// Answers every question the same way (`--yes`, tests)
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn confirm(&self, question: &str) -> bool {
        log::debug!("Auto-answering '{}' with {}", question, self.0);
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::journal::stats::fixtures::trade;
    use crate::view::{render, Locale};

    #[test]
    fn test_writes_rows_and_stats() {
        let mut state = AppState::new(Locale::En);
        state.trades.replace(vec![trade(1, "2%", "3", "6.00%", "Take")]);

        let mut sink = TerminalSink::new(Vec::new());
        sink.commit(&render(&state));
        let out = String::from_utf8(sink.out).unwrap();

        assert!(out.contains("XAUUSD"));
        assert!(out.contains("6.00%"));
        assert!(out.contains("Win rate: 100.0%"));
    }

    #[test]
    fn test_empty_message() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.commit(&render(&AppState::new(Locale::En)));
        let out = String::from_utf8(sink.out).unwrap();
        assert!(out.contains("No trades yet"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 14), "short");
        assert_eq!(truncate("a very long setup name", 8), "a very …");
    }
}
