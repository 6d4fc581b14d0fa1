use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::pl::pl_text;
use crate::api::ApiError;
use crate::db::LocalStorage;
use crate::models::{NewTrade, Outcome};

/// Key under which trades were kept before accounts existed
pub const LEGACY_TRADES_KEY: &str = "gTradeJournalEquity";

/// Old records stored numbers and strings interchangeably
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// One trade from the pre-account local list
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyTrade {
    #[serde(default, deserialize_with = "lenient_text")]
    pub pair: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub session: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub direction: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub setup: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub risk: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rr: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub pl: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub result: String,
}

impl LegacyTrade {
    /// Map onto a backend row. The stored `pl` is kept; an empty one is
    /// recomputed.
    pub fn into_new_trade(self, user_id: Uuid) -> NewTrade {
        let pl = if self.pl.trim().is_empty() {
            pl_text(&self.risk, &self.rr, Outcome::parse(&self.result))
        } else {
            self.pl
        };
        NewTrade {
            user_id,
            asset: self.pair,
            date: self.date,
            session: self.session,
            direction: self.direction,
            setup: self.setup,
            tradingview_url: None,
            risk: self.risk,
            rr: self.rr,
            pl,
            result: self.result,
        }
    }
}

/// Read the legacy list; a missing key or unreadable JSON yields an empty list
pub fn load(storage: &LocalStorage) -> Result<Vec<LegacyTrade>, ApiError> {
    let Some(raw) = storage.get_item(LEGACY_TRADES_KEY)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<LegacyTrade>>(&raw) {
        Ok(trades) => Ok(trades),
        Err(e) => {
            log::warn!("Ignoring unreadable legacy trade list: {}", e);
            Ok(Vec::new())
        }
    }
}

pub fn discard(storage: &LocalStorage) -> Result<(), ApiError> {
    storage.remove_item(LEGACY_TRADES_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use std::sync::Arc;

    fn local() -> LocalStorage {
        LocalStorage::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn test_missing_key_is_empty() {
        assert!(load(&local()).unwrap().is_empty());
    }

    #[test]
    fn test_load_mixed_value_types() {
        let storage = local();
        storage
            .set_item(
                LEGACY_TRADES_KEY,
                r#"[{"pair":"XAUUSD","date":"2024-01-02","risk":1,"rr":2.5,"result":"Take","pl":"2.50%"},
                    {"pair":"EURUSD","risk":"0.5","result":"Stop"}]"#,
            )
            .unwrap();

        let trades = load(&storage).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].risk, "1");
        assert_eq!(trades[0].rr, "2.5");
        assert_eq!(trades[1].date, "");
    }

    #[test]
    fn test_pair_maps_to_asset() {
        let legacy = LegacyTrade {
            pair: "GBPUSD".to_string(),
            risk: "1".to_string(),
            result: "Stop".to_string(),
            ..LegacyTrade::default()
        };

        let row = legacy.into_new_trade(Uuid::nil());

        assert_eq!(row.asset, "GBPUSD");
        assert_eq!(row.pl, "-1.00%");
    }

    #[test]
    fn test_garbage_is_ignored_and_discard_removes_key() {
        let storage = local();
        storage.set_item(LEGACY_TRADES_KEY, "not json").unwrap();
        assert!(load(&storage).unwrap().is_empty());

        discard(&storage).unwrap();
        assert_eq!(storage.get_item(LEGACY_TRADES_KEY).unwrap(), None);
    }
}
