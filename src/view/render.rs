use chrono::NaiveDate;
use serde::Serialize;

use super::i18n::{text, Locale, Message};
use crate::app::{AppState, Banner, SharedAccess, ViewMode};
use crate::journal::pl::{parse_leading_number, to_fixed};
use crate::journal::{equity_points, EquityCurvePoint, JournalStats, UNDEFINED_MARKER};
use crate::models::{Outcome, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlClass {
    Positive,
    Negative,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultClass {
    Take,
    Stop,
    Be,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRow {
    /// 1-based, as addressed by `edit` and `delete`
    pub number: usize,
    pub id: String,
    pub asset: String,
    pub date: String,
    pub session: String,
    pub session_class: &'static str,
    pub direction: String,
    pub setup: String,
    pub chart_link: Option<String>,
    pub risk: String,
    pub rr: String,
    pub pl: String,
    pub pl_class: PlClass,
    pub result: String,
    pub result_class: ResultClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub total_trades: String,
    pub win_rate: String,
    pub avg_risk: String,
    pub avg_rr: String,
    pub total_return: String,
}

/// Which controls are offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub add: bool,
    pub edit: bool,
    pub delete: bool,
    pub share: bool,
    pub sign_out: bool,
}

/// Complete description of one screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalView {
    pub read_only: bool,
    pub user_email: Option<String>,
    pub banner: Option<String>,
    pub rows: Vec<TradeRow>,
    /// Set when there is nothing to list
    pub empty_message: Option<String>,
    pub stats: StatsView,
    pub chart: Vec<EquityCurvePoint>,
    pub share_link_visible: bool,
    pub affordances: Affordances,
}

fn or_marker(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNDEFINED_MARKER.to_string(),
    }
}

/// `2024-03-05` → `5 Mar 2024`; unparseable dates are shown as stored
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return UNDEFINED_MARKER.to_string();
    };
    let day = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => date.format("%-d %b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn session_class(session: Option<&str>) -> &'static str {
    match session {
        Some("Asia") => "asia",
        Some("Frankfurt") => "frankfurt",
        Some("New York") => "ny",
        _ => "london",
    }
}

fn pl_class(pl: Option<&str>) -> PlClass {
    let value = pl.and_then(parse_leading_number).unwrap_or(0.0);
    if value > 0.0 {
        PlClass::Positive
    } else if value < 0.0 {
        PlClass::Negative
    } else {
        PlClass::Zero
    }
}

fn row(number: usize, trade: &Trade) -> TradeRow {
    TradeRow {
        number,
        id: trade.id.to_string(),
        asset: trade.asset.clone(),
        date: format_date(trade.date.as_deref()),
        session: or_marker(&trade.session),
        session_class: session_class(trade.session.as_deref()),
        direction: or_marker(&trade.direction),
        setup: or_marker(&trade.setup),
        chart_link: trade.tradingview_url.clone().filter(|u| !u.trim().is_empty()),
        risk: or_marker(&trade.risk),
        rr: or_marker(&trade.rr),
        pl: or_marker(&trade.pl),
        pl_class: pl_class(trade.pl.as_deref()),
        result: or_marker(&trade.result),
        result_class: match trade.outcome() {
            Some(Outcome::Take) => ResultClass::Take,
            Some(Outcome::Stop) => ResultClass::Stop,
            Some(Outcome::BreakEven) => ResultClass::Be,
            None => ResultClass::None,
        },
    }
}

pub fn stats_view(stats: &JournalStats) -> StatsView {
    let marker = || UNDEFINED_MARKER.to_string();
    StatsView {
        total_trades: stats.total_trades.to_string(),
        win_rate: stats
            .win_rate
            .map(|v| format!("{}%", to_fixed(v, 1)))
            .unwrap_or_else(marker),
        avg_risk: stats
            .avg_risk
            .map(|v| format!("{}%", to_fixed(v, 2)))
            .unwrap_or_else(marker),
        avg_rr: stats.avg_rr.map(|v| to_fixed(v, 2)).unwrap_or_else(marker),
        total_return: format!("{}%", to_fixed(stats.total_return, 2)),
    }
}

/// Pure projection of the application state
pub fn render(state: &AppState) -> JournalView {
    let locale: Locale = state.locale;
    let read_only = state.mode.is_read_only();
    let hidden = matches!(state.mode, ViewMode::Shared { .. })
        && state.shared_access == SharedAccess::NotPublic;

    let trades = if hidden { &[][..] } else { state.trades.trades() };
    let rows: Vec<TradeRow> = trades
        .iter()
        .enumerate()
        .map(|(i, trade)| row(i + 1, trade))
        .collect();

    let banner = state.banner.as_ref().map(|banner| match banner {
        Banner::NotPublic => text(locale, Message::NotPublic),
        Banner::LoadFailed => text(locale, Message::LoadFailed),
    });
    let empty_message = (rows.is_empty() && !hidden).then(|| text(locale, Message::NoTrades));

    let can_edit = state.can_edit();
    JournalView {
        read_only,
        user_email: if read_only {
            None
        } else {
            state.session.session().and_then(|s| s.user.email.clone())
        },
        banner,
        rows,
        empty_message,
        stats: stats_view(state.trades.stats()),
        chart: equity_points(trades),
        share_link_visible: can_edit && state.is_public == Some(true),
        affordances: Affordances {
            add: can_edit,
            edit: can_edit,
            delete: can_edit,
            share: can_edit,
            sign_out: !read_only && state.session.is_authenticated(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::stats::fixtures::trade;
    use crate::models::{AuthUser, Session, SessionTokens};
    use crate::session::SessionState;
    use uuid::Uuid;

    fn signed_in() -> AppState {
        let mut state = AppState::new(Locale::Uk);
        state.session = SessionState::Authenticated(Session {
            user: AuthUser {
                id: Uuid::nil(),
                email: Some("a@b.co".to_string()),
            },
            tokens: SessionTokens {
                access_token: "t".to_string(),
                refresh_token: None,
                expires_at: None,
            },
        });
        state
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2024-03-05")), "5 Mar 2024");
        assert_eq!(format_date(Some("2024-12-25T10:00:00")), "25 Dec 2024");
        assert_eq!(format_date(Some("")), "—");
        assert_eq!(format_date(None), "—");
        assert_eq!(format_date(Some("yesterday")), "yesterday");
    }

    #[test]
    fn test_rows_and_stats() {
        let mut state = signed_in();
        state.trades.replace(vec![
            trade(1, "2%", "3", "6.00%", "Take"),
            trade(2, "1.5%", "", "-1.50%", "Stop"),
            trade(3, "1%", "", "0%", "BE"),
        ]);

        let view = render(&state);

        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.rows[0].pl_class, PlClass::Positive);
        assert_eq!(view.rows[1].pl_class, PlClass::Negative);
        assert_eq!(view.rows[2].result_class, ResultClass::Be);
        assert_eq!(view.rows[0].setup, "—");
        assert_eq!(view.stats.win_rate, "33.3%");
        assert_eq!(view.stats.avg_risk, "1.50%");
        assert_eq!(view.stats.avg_rr, "3.00");
        assert_eq!(view.stats.total_return, "4.50%");
        let curve: Vec<f64> = view.chart.iter().map(|p| p.cumulative_pl).collect();
        assert_eq!(curve, vec![0.0, 6.0, 4.5, 4.5]);
        assert!(view.affordances.add && view.affordances.delete);
        assert_eq!(view.empty_message, None);
    }

    #[test]
    fn test_empty_journal() {
        let view = render(&signed_in());
        assert_eq!(view.empty_message.as_deref(), Some("Немає записів про трейди"));
        assert_eq!(view.stats.win_rate, "—");
        assert_eq!(view.stats.avg_rr, "—");
        assert_eq!(view.chart.len(), 1);
    }

    #[test]
    fn test_shared_view_has_no_mutation_affordances() {
        let mut state = signed_in();
        state.mode = ViewMode::Shared { user_id: Uuid::nil() };
        state.shared_access = SharedAccess::Public;
        state.trades.replace(vec![trade(1, "2%", "3", "6.00%", "Take")]);

        let view = render(&state);

        assert!(view.read_only);
        assert_eq!(view.rows.len(), 1);
        assert!(!view.affordances.add);
        assert!(!view.affordances.edit);
        assert!(!view.affordances.delete);
        assert!(!view.affordances.share);
        assert_eq!(view.user_email, None);
    }

    #[test]
    fn test_not_public_banner() {
        let mut state = AppState::new(Locale::En);
        state.mode = ViewMode::Shared { user_id: Uuid::nil() };
        state.shared_access = SharedAccess::NotPublic;
        state.banner = Some(Banner::NotPublic);

        let view = render(&state);

        assert_eq!(view.banner.as_deref(), Some("This journal is not public"));
        assert!(view.rows.is_empty());
        assert_eq!(view.empty_message, None);
    }
}
