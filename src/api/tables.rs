use std::sync::Arc;
use uuid::Uuid;

use super::client::{ApiRequest, BackendClient};
use super::error::ApiError;
use crate::models::{NewTrade, ProfileVisibility, Trade, TradeChanges, TradeId, UserProfile};

pub const TRADES_ENDPOINT: &str = "/rest/v1/trades";
pub const PROFILES_ENDPOINT: &str = "/rest/v1/user_profiles";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// PostgREST access to the `trades` and `user_profiles` tables
pub struct TablesApi {
    backend: Arc<BackendClient>,
}

impl TablesApi {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// Full trade set of one user, newest first
    pub async fn list_trades(&self, user_id: Uuid) -> Result<Vec<Trade>, ApiError> {
        let request = ApiRequest::get(TRADES_ENDPOINT)
            .query("select", "*")
            .query("user_id", eq(user_id))
            .query("order", "date.desc");

        let trades: Option<Vec<Trade>> = self.backend.fetch_json("load trades", request).await?;
        Ok(trades.unwrap_or_default())
    }

    pub async fn insert_trade(&self, trade: &NewTrade) -> Result<(), ApiError> {
        let request = ApiRequest::post(TRADES_ENDPOINT)
            .prefer("return=minimal")
            .json(trade)?;

        self.backend.execute("insert trade", request).await?;
        Ok(())
    }

    pub async fn update_trade(&self, id: &TradeId, changes: &TradeChanges) -> Result<(), ApiError> {
        let request = ApiRequest::patch(TRADES_ENDPOINT)
            .query("id", eq(id))
            .prefer("return=minimal")
            .json(changes)?;

        self.backend.execute("update trade", request).await?;
        Ok(())
    }

    pub async fn delete_trade(&self, id: &TradeId) -> Result<(), ApiError> {
        let request = ApiRequest::delete(TRADES_ENDPOINT).query("id", eq(id));

        self.backend.execute("delete trade", request).await?;
        Ok(())
    }

    pub async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, ApiError> {
        let request = ApiRequest::get(PROFILES_ENDPOINT)
            .query("select", "*")
            .query("user_id", eq(user_id));

        let rows: Vec<UserProfile> = self.backend.fetch_json("load profile", request).await?;
        Ok(rows.into_iter().next())
    }

    /// `None` when the user has no profile row
    pub async fn fetch_visibility(&self, user_id: Uuid) -> Result<Option<bool>, ApiError> {
        let request = ApiRequest::get(PROFILES_ENDPOINT)
            .query("select", "is_public")
            .query("user_id", eq(user_id));

        let rows: Vec<ProfileVisibility> = self.backend.fetch_json("load visibility", request).await?;
        Ok(rows.into_iter().next().map(|row| row.is_public.unwrap_or(false)))
    }

    pub async fn insert_profile(&self, profile: &UserProfile) -> Result<(), ApiError> {
        let request = ApiRequest::post(PROFILES_ENDPOINT)
            .prefer("return=minimal")
            .json(profile)?;

        self.backend.execute("create profile", request).await?;
        Ok(())
    }

    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), ApiError> {
        let request = ApiRequest::post(PROFILES_ENDPOINT)
            .query("on_conflict", "user_id")
            .prefer("resolution=merge-duplicates,return=minimal")
            .json(profile)?;

        self.backend.execute("update profile", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::mock::ScriptedTransport;
    use crate::api::client::Method;
    use crate::api::retry::RetryPolicy;
    use std::time::Duration;

    fn api(transport: Arc<ScriptedTransport>) -> TablesApi {
        let backend = BackendClient::new(transport, RetryPolicy::immediate(3), Duration::from_secs(1));
        TablesApi::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn test_list_trades_query() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, TRADES_ENDPOINT, 200, "[]");
        let user = Uuid::new_v4();

        let trades = api(transport.clone()).list_trades(user).await.unwrap();

        assert!(trades.is_empty());
        let request = &transport.requests()[0];
        assert_eq!(request.query_value("user_id"), Some(format!("eq.{}", user).as_str()));
        assert_eq!(request.query_value("order"), Some("date.desc"));
    }

    #[tokio::test]
    async fn test_list_trades_null_body() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, TRADES_ENDPOINT, 200, "null");

        let trades = api(transport).list_trades(Uuid::new_v4()).await.unwrap();
        assert!(trades.is_empty());
    }

    #[tokio::test]
    async fn test_list_trades_with_null_asset_row() {
        let transport = ScriptedTransport::new();
        let user = "6f1c1f55-3c3a-4f4e-9d61-6cfb1d1c8a11";
        transport.reply(
            Method::Get,
            TRADES_ENDPOINT,
            200,
            &format!(
                r#"[{{"id":1,"user_id":"{user}","asset":"XAUUSD","result":"Take"}},{{"id":2,"user_id":"{user}","asset":null,"result":"Stop"}}]"#
            ),
        );

        let trades = api(transport).list_trades(Uuid::new_v4()).await.unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].asset, "XAUUSD");
        assert_eq!(trades[1].asset, "");
    }

    #[tokio::test]
    async fn test_visibility_missing_profile() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Get, PROFILES_ENDPOINT, 200, "[]");

        let visibility = api(transport).fetch_visibility(Uuid::new_v4()).await.unwrap();
        assert_eq!(visibility, None);
    }

    #[tokio::test]
    async fn test_upsert_profile_conflict_target() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Post, PROFILES_ENDPOINT, 201, "");
        let user = Uuid::new_v4();

        api(transport.clone())
            .upsert_profile(&UserProfile { user_id: user, is_public: true })
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.query_value("on_conflict"), Some("user_id"));
        assert!(request.prefer.as_deref().unwrap().contains("merge-duplicates"));
        assert_eq!(request.body.as_ref().unwrap()["is_public"], true);
    }

    #[tokio::test]
    async fn test_delete_filters_by_id() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Delete, TRADES_ENDPOINT, 204, "");

        api(transport.clone())
            .delete_trade(&TradeId("17".to_string()))
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].query_value("id"), Some("eq.17"));
    }
}
