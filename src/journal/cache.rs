use super::stats::{compute_stats, JournalStats};
use crate::models::Trade;

/// In-memory copy of the viewed user's trades and their stats. The list is
/// only ever replaced whole; stats are recomputed on each replacement.
#[derive(Debug, Clone)]
pub struct TradeCache {
    trades: Vec<Trade>,
    stats: JournalStats,
}

impl Default for TradeCache {
    fn default() -> Self {
        Self {
            trades: Vec::new(),
            stats: compute_stats(&[]),
        }
    }
}

impl TradeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, trades: Vec<Trade>) {
        self.stats = compute_stats(&trades);
        self.trades = trades;
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn stats(&self) -> &JournalStats {
        &self.stats
    }

    /// Lookup by 1-based row number as shown in the table
    pub fn by_row(&self, row: usize) -> Option<&Trade> {
        row.checked_sub(1).and_then(|i| self.trades.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::stats::fixtures::trade;
    use crate::models::TradeId;

    #[test]
    fn test_replace_recomputes_stats() {
        let mut cache = TradeCache::new();
        assert!(cache.trades().is_empty());

        cache.replace(vec![trade(1, "2%", "3", "6.00%", "Take")]);
        assert_eq!(cache.stats().total_trades, 1);

        cache.replace(vec![
            trade(2, "1%", "", "-1.00%", "Stop"),
            trade(3, "1%", "", "0%", "BE"),
        ]);
        assert_eq!(cache.stats().total_trades, 2);
        assert_eq!(cache.stats().wins, 0);
        assert_eq!(cache.stats().total_return, -1.0);
        assert_eq!(cache.by_row(1).unwrap().id.0, "2");
    }

    #[test]
    fn test_row_lookup() {
        let mut cache = TradeCache::new();
        cache.replace(vec![trade(7, "1%", "", "0%", "BE")]);

        assert_eq!(cache.by_row(1).unwrap().id, TradeId("7".to_string()));
        assert!(cache.by_row(0).is_none());
        assert!(cache.by_row(2).is_none());
    }

    #[test]
    fn test_clear() {
        let mut cache = TradeCache::new();
        cache.replace(vec![trade(1, "2%", "3", "6.00%", "Take")]);
        cache.clear();
        assert!(cache.trades().is_empty());
        assert_eq!(cache.stats().win_rate, None);
    }
}
