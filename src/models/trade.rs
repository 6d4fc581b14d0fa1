use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Backend-assigned trade identifier. The trades table may use either an
/// identity column or a uuid primary key, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeId(pub String);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TradeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TradeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(TradeId(s)),
            serde_json::Value::Number(n) => Ok(TradeId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "trade id must be a string or number, got {}",
                other
            ))),
        }
    }
}

/// Trading session the entry was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingSession {
    Asia,
    Frankfurt,
    London,
    #[serde(rename = "New York")]
    NewYork,
}

impl TradingSession {
    pub fn label(&self) -> &'static str {
        match self {
            TradingSession::Asia => "Asia",
            TradingSession::Frankfurt => "Frankfurt",
            TradingSession::London => "London",
            TradingSession::NewYork => "New York",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "asia" => Some(TradingSession::Asia),
            "frankfurt" => Some(TradingSession::Frankfurt),
            "london" => Some(TradingSession::London),
            "new york" | "newyork" | "ny" => Some(TradingSession::NewYork),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "long" => Some(Direction::Long),
            "short" => Some(Direction::Short),
            _ => None,
        }
    }
}

/// Result outcome: Take (win), Stop (loss), BE (breakeven)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Take,
    Stop,
    #[serde(rename = "BE")]
    BreakEven,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Take => "Take",
            Outcome::Stop => "Stop",
            Outcome::BreakEven => "BE",
        }
    }

    /// Lenient parse for user input
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Take" | "take" | "TAKE" => Some(Outcome::Take),
            "Stop" | "stop" | "STOP" => Some(Outcome::Stop),
            "BE" | "be" | "Be" => Some(Outcome::BreakEven),
            _ => None,
        }
    }

    /// Exact match on a stored `result` column; anything else has no outcome
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "Take" => Some(Outcome::Take),
            "Stop" => Some(Outcome::Stop),
            "BE" => Some(Outcome::BreakEven),
            _ => None,
        }
    }
}

/// `null` and a missing column both read as empty text
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A trade row as stored by the backend.
///
/// Text columns are kept as the backend returns them: older rows (including
/// legacy imports) may carry values outside the fixed sets, so `session`,
/// `direction` and `result` stay strings here and are interpreted at render
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub asset: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub tradingview_url: Option<String>,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub rr: Option<String>,
    #[serde(default)]
    pub pl: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl Trade {
    pub fn outcome(&self) -> Option<Outcome> {
        self.result.as_deref().and_then(Outcome::from_stored)
    }
}

/// Insert payload for the trades table. `pl` is filled by the form layer
/// from the profit/loss rule and is never taken from user input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrade {
    pub user_id: Uuid,
    pub asset: String,
    pub date: String,
    pub session: String,
    pub direction: String,
    pub setup: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tradingview_url: Option<String>,
    pub risk: String,
    pub rr: String,
    pub pl: String,
    pub result: String,
}

/// PATCH payload for an existing trade. Same columns as an insert minus the
/// owner, which never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeChanges {
    pub asset: String,
    pub date: String,
    pub session: String,
    pub direction: String,
    pub setup: String,
    pub tradingview_url: Option<String>,
    pub risk: String,
    pub rr: String,
    pub pl: String,
    pub result: String,
}

impl From<NewTrade> for TradeChanges {
    fn from(trade: NewTrade) -> Self {
        Self {
            asset: trade.asset,
            date: trade.date,
            session: trade.session,
            direction: trade.direction,
            setup: trade.setup,
            tradingview_url: trade.tradingview_url,
            risk: trade.risk,
            rr: trade.rr,
            pl: trade.pl,
            result: trade.result,
        }
    }
}
