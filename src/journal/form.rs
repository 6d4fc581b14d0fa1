use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::pl::{parse_leading_number, pl_text};
use crate::models::{Direction, NewTrade, Outcome, Trade, TradingSession};

pub const DEFAULT_PAIR: &str = "XAUUSD";
pub const MIN_PASSWORD_LEN: usize = 6;

/// Input problems caught before anything is sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("email is required")]
    MissingEmail,
    #[error("password is required")]
    MissingPassword,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("date is required")]
    MissingDate,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("risk % is required")]
    MissingRisk,
    #[error("invalid risk '{0}'")]
    InvalidRisk(String),
    #[error("invalid reward multiple '{0}'")]
    InvalidRr(String),
    #[error("result is required")]
    MissingResult,
    #[error("invalid result '{0}', expected Take, Stop or BE")]
    InvalidResult(String),
    #[error("invalid session '{0}'")]
    InvalidSession(String),
    #[error("invalid direction '{0}', expected Long or Short")]
    InvalidDirection(String),
    #[error("chart link must be an http(s) URL")]
    InvalidUrl,
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if password.is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Raw values of the new/edit trade form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeForm {
    pub pair: String,
    pub date: String,
    pub session: String,
    pub direction: String,
    pub setup: String,
    pub tradingview_url: String,
    /// Percent, with or without a trailing `%`
    pub risk: String,
    pub rr: String,
    pub result: String,
}

impl TradeForm {
    /// Empty form with today's date and the usual defaults
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            pair: DEFAULT_PAIR.to_string(),
            date: today.format("%Y-%m-%d").to_string(),
            session: TradingSession::London.label().to_string(),
            direction: Direction::Long.label().to_string(),
            ..Self::default()
        }
    }

    /// Form prefilled from an existing trade for editing
    pub fn from_trade(trade: &Trade) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            pair: trade.asset.clone(),
            date: text(&trade.date),
            session: text(&trade.session),
            direction: text(&trade.direction),
            setup: text(&trade.setup),
            tradingview_url: text(&trade.tradingview_url),
            risk: text(&trade.risk).trim_end_matches('%').to_string(),
            rr: text(&trade.rr),
            result: text(&trade.result),
        }
    }

    fn risk_input(&self) -> &str {
        self.risk.trim().trim_end_matches('%').trim()
    }

    /// Live P/L preview, same rule as the persisted value
    pub fn preview_pl(&self) -> String {
        pl_text(self.risk_input(), &self.rr, Outcome::parse(&self.result))
    }

    /// Validate and build the row to persist. `pl` always comes from the
    /// profit/loss rule.
    pub fn validate(&self, user_id: Uuid) -> Result<NewTrade, ValidationError> {
        let pair = self.pair.trim();
        let asset = if pair.is_empty() { DEFAULT_PAIR.to_string() } else { pair.to_uppercase() };

        let date = self.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;

        let risk = self.risk_input();
        if risk.is_empty() {
            return Err(ValidationError::MissingRisk);
        }
        match risk.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => {}
            _ => return Err(ValidationError::InvalidRisk(self.risk.clone())),
        }

        let rr = self.rr.trim();
        if !rr.is_empty() {
            match parse_leading_number(rr) {
                Some(v) if v >= 0.0 => {}
                _ => return Err(ValidationError::InvalidRr(rr.to_string())),
            }
        }

        let result = self.result.trim();
        if result.is_empty() {
            return Err(ValidationError::MissingResult);
        }
        let outcome = Outcome::parse(result)
            .ok_or_else(|| ValidationError::InvalidResult(result.to_string()))?;

        let session = TradingSession::parse(&self.session)
            .ok_or_else(|| ValidationError::InvalidSession(self.session.clone()))?;
        let direction = Direction::parse(&self.direction)
            .ok_or_else(|| ValidationError::InvalidDirection(self.direction.clone()))?;

        let url = self.tradingview_url.trim();
        let tradingview_url = if url.is_empty() {
            None
        } else if url.starts_with("https://") || url.starts_with("http://") {
            Some(url.to_string())
        } else {
            return Err(ValidationError::InvalidUrl);
        };

        Ok(NewTrade {
            user_id,
            asset,
            date: date.to_string(),
            session: session.label().to_string(),
            direction: direction.label().to_string(),
            setup: self.setup.trim().to_string(),
            tradingview_url,
            risk: format!("{}%", risk),
            rr: rr.to_string(),
            pl: pl_text(risk, rr, Some(outcome)),
            result: outcome.label().to_string(),
        })
    }
}
