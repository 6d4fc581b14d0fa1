use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::client::{ApiRequest, BackendClient};
use super::error::ApiError;
use crate::models::{AuthUser, Session, SessionTokens};

const TOKEN_ENDPOINT: &str = "/auth/v1/token";
const SIGNUP_ENDPOINT: &str = "/auth/v1/signup";
const LOGOUT_ENDPOINT: &str = "/auth/v1/logout";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));

        Session {
            user: self.user,
            tokens: SessionTokens {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at,
            },
        }
    }
}

/// What a sign-up produced
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Project has confirmations disabled, session issued right away
    SignedIn(Session),
    /// Account created, email confirmation pending
    ConfirmationRequired(AuthUser),
}

/// Email/password auth against the GoTrue endpoints
pub struct AuthApi {
    backend: Arc<BackendClient>,
}

impl AuthApi {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let request = ApiRequest::post(TOKEN_ENDPOINT)
            .query("grant_type", "password")
            .json(&json!({ "email": email, "password": password }))?;

        let response: TokenResponse = self.backend.fetch_json("sign in", request).await?;
        Ok(response.into_session())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ApiError> {
        let request = ApiRequest::post(SIGNUP_ENDPOINT)
            .json(&json!({ "email": email, "password": password }))?;

        let body: serde_json::Value = self.backend.fetch_json("sign up", request).await?;
        parse_sign_up(body)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, ApiError> {
        let request = ApiRequest::post(TOKEN_ENDPOINT)
            .query("grant_type", "refresh_token")
            .json(&json!({ "refresh_token": refresh_token }))?;

        let response: TokenResponse = self.backend.fetch_json("refresh session", request).await?;
        Ok(response.into_session())
    }

    /// Revoke the session server-side. Single attempt: callers clear local
    /// state whatever happens here.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(LOGOUT_ENDPOINT).bearer(access_token);
        self.backend.execute_once(request).await?;
        Ok(())
    }
}

fn parse_sign_up(body: serde_json::Value) -> Result<SignUpOutcome, ApiError> {
    if body.get("access_token").is_some() {
        let response: TokenResponse = serde_json::from_value(body)?;
        return Ok(SignUpOutcome::SignedIn(response.into_session()));
    }

    // Without a session the user is returned either bare or under `user`
    let user_value = body.get("user").cloned().unwrap_or(body);
    let user: AuthUser = serde_json::from_value(user_value)
        .map_err(|e| ApiError::ParseError(format!("Sign-up response without user: {}", e)))?;
    Ok(SignUpOutcome::ConfirmationRequired(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::mock::ScriptedTransport;
    use crate::api::client::Method;
    use crate::api::retry::RetryPolicy;
    use std::time::Duration;

    const USER_ID: &str = "6f1c1f55-3c3a-4f4e-9d61-6cfb1d1c8a11";

    fn api(transport: Arc<ScriptedTransport>) -> AuthApi {
        let backend = BackendClient::new(transport, RetryPolicy::immediate(1), Duration::from_secs(1));
        AuthApi::new(Arc::new(backend))
    }

    fn token_body() -> String {
        format!(
            r#"{{"access_token":"jwt","refresh_token":"r1","expires_in":3600,"token_type":"bearer","user":{{"id":"{}","email":"a@b.co"}}}}"#,
            USER_ID
        )
    }

    #[tokio::test]
    async fn test_sign_in_builds_session() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Post, TOKEN_ENDPOINT, 200, &token_body());

        let session = api(transport.clone()).sign_in("a@b.co", "secret1").await.unwrap();

        assert_eq!(session.user.id.to_string(), USER_ID);
        assert_eq!(session.access_token(), "jwt");
        assert!(session.tokens.expires_at.unwrap() > Utc::now().timestamp());

        let request = &transport.requests()[0];
        assert_eq!(request.query_value("grant_type"), Some("password"));
        assert_eq!(request.body.as_ref().unwrap()["email"], "a@b.co");
    }

    #[tokio::test]
    async fn test_sign_in_invalid_credentials() {
        let transport = ScriptedTransport::new();
        transport.reply(
            Method::Post,
            TOKEN_ENDPOINT,
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );

        let err = api(transport).sign_in("a@b.co", "wrong-pass").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[test]
    fn test_sign_up_confirmation_required() {
        let body: serde_json::Value =
            serde_json::from_str(&format!(r#"{{"id":"{}","email":"a@b.co","role":""}}"#, USER_ID)).unwrap();
        match parse_sign_up(body).unwrap() {
            SignUpOutcome::ConfirmationRequired(user) => assert_eq!(user.email.as_deref(), Some("a@b.co")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_sign_up_with_session() {
        let body: serde_json::Value = serde_json::from_str(&token_body()).unwrap();
        assert!(matches!(parse_sign_up(body).unwrap(), SignUpOutcome::SignedIn(_)));
    }

    #[tokio::test]
    async fn test_sign_out_sends_bearer() {
        let transport = ScriptedTransport::new();
        transport.reply(Method::Post, LOGOUT_ENDPOINT, 204, "");

        api(transport.clone()).sign_out("jwt").await.unwrap();

        assert_eq!(transport.requests()[0].bearer.as_deref(), Some("jwt"));
    }
}
