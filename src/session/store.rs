use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, AuthApi, BackendClient, SecureStorage, SignUpOutcome};
use crate::db::LocalStorage;
use crate::models::{AuthUser, Session, SessionTokens};

pub const TOKEN_KEY: &str = "journal.auth.token";
pub const USER_KEY: &str = "journal.auth.user";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }
}

/// Auth calls plus the persisted copy of the session.
///
/// The user record is stored as plain JSON, the tokens encrypted. Every
/// change is mirrored into the backend client's bearer token.
pub struct SessionStore {
    auth: AuthApi,
    backend: Arc<BackendClient>,
    storage: LocalStorage,
    vault: SecureStorage,
}

impl SessionStore {
    pub fn new(backend: Arc<BackendClient>, storage: LocalStorage, vault: SecureStorage) -> Self {
        Self {
            auth: AuthApi::new(backend.clone()),
            backend,
            storage,
            vault,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let session = self.auth.sign_in(email, password).await?;
        self.activate(&session)?;
        log::info!("Signed in as {}", session.user_id());
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ApiError> {
        let outcome = self.auth.sign_up(email, password).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                self.activate(session)?;
                log::info!("Account created and signed in as {}", session.user_id());
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                log::info!("Account {} created, waiting for email confirmation", user.id);
            }
        }
        Ok(outcome)
    }

    /// Re-enter a persisted session. Gives up after `limit`; any failure
    /// discards what was persisted.
    pub async fn restore(&self, limit: Duration) -> Option<Session> {
        match tokio::time::timeout(limit, self.try_restore()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                log::warn!("Could not restore session: {}", e);
                self.clear();
                None
            }
            Err(_) => {
                log::warn!("Session restore timed out after {:?}", limit);
                self.clear();
                None
            }
        }
    }

    async fn try_restore(&self) -> Result<Option<Session>, ApiError> {
        let Some(session) = self.load_persisted()? else {
            return Ok(None);
        };

        let session = if session.tokens.is_expired() {
            let refresh_token = session.tokens.refresh_token.as_deref().ok_or_else(|| {
                ApiError::InvalidRequest("session expired and no refresh token".to_string())
            })?;
            log::info!("Refreshing expired session");
            self.auth.refresh(refresh_token).await?
        } else {
            session
        };

        self.activate(&session)?;
        log::info!("Restored session for {}", session.user_id());
        Ok(Some(session))
    }

    /// Best-effort server-side sign-out, then local state is wiped
    pub async fn sign_out(&self, session: Option<&Session>) {
        if let Some(session) = session {
            if let Err(e) = self.auth.sign_out(session.access_token()).await {
                log::warn!("Sign-out request failed, clearing local session anyway: {}", e);
            }
        }
        self.clear();
        log::info!("Signed out");
    }

    /// Persisted session as stored, without refreshing it
    pub fn persisted(&self) -> Option<Session> {
        self.load_persisted().unwrap_or_else(|e| {
            log::warn!("Could not read persisted session: {}", e);
            None
        })
    }

    /// Forget the session locally
    pub fn clear(&self) {
        self.backend.set_access_token(None);
        if let Err(e) = self.vault.delete(TOKEN_KEY) {
            log::warn!("Failed to remove stored token: {}", e);
        }
        if let Err(e) = self.storage.remove_item(USER_KEY) {
            log::warn!("Failed to remove stored user: {}", e);
        }
    }

    fn activate(&self, session: &Session) -> Result<(), ApiError> {
        self.persist(session)?;
        self.backend
            .set_access_token(Some(session.access_token().to_string()));
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<(), ApiError> {
        self.storage
            .set_item(USER_KEY, &serde_json::to_string(&session.user)?)?;
        self.vault
            .store(TOKEN_KEY, &serde_json::to_string(&session.tokens)?)
    }

    fn load_persisted(&self) -> Result<Option<Session>, ApiError> {
        let Some(user) = self.storage.get_item(USER_KEY)? else {
            return Ok(None);
        };
        let Some(tokens) = self.vault.retrieve(TOKEN_KEY)? else {
            return Ok(None);
        };
        let user: AuthUser = serde_json::from_str(&user)?;
        let tokens: SessionTokens = serde_json::from_str(&tokens)?;
        Ok(Some(Session { user, tokens }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::client::mock::{Reply, ScriptedTransport};
    use crate::api::{Method, RetryPolicy};
    use crate::db::Database;

    pub const USER_ID: &str = "6f1c1f55-3c3a-4f4e-9d61-6cfb1d1c8a11";

    pub fn token_body(expires_in: i64) -> String {
        format!(
            r#"{{"access_token":"jwt-{expires_in}","refresh_token":"r1","expires_in":{expires_in},"user":{{"id":"{USER_ID}","email":"a@b.co"}}}}"#
        )
    }

    fn setup() -> (Arc<ScriptedTransport>, Arc<BackendClient>, LocalStorage, SessionStore) {
        let transport = ScriptedTransport::new();
        let backend = Arc::new(BackendClient::new(
            transport.clone(),
            RetryPolicy::immediate(1),
            Duration::from_secs(1),
        ));
        let storage = LocalStorage::new(Arc::new(Database::open_in_memory().unwrap()));
        let vault = SecureStorage::with_identity(storage.clone(), "test-host").unwrap();
        let store = SessionStore::new(backend.clone(), storage.clone(), vault);
        (transport, backend, storage, store)
    }

    #[tokio::test]
    async fn test_sign_in_persists_encrypted() {
        let (transport, backend, storage, store) = setup();
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(3600));

        store.sign_in("a@b.co", "secret1").await.unwrap();

        assert!(backend.has_access_token());
        assert!(storage.get_item(USER_KEY).unwrap().unwrap().contains(USER_ID));
        let raw_token = storage.get_item(TOKEN_KEY).unwrap().unwrap();
        assert!(!raw_token.contains("jwt-3600"));
    }

    #[tokio::test]
    async fn test_restore_without_network() {
        let (transport, backend, _storage, store) = setup();
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(3600));
        store.sign_in("a@b.co", "secret1").await.unwrap();
        backend.set_access_token(None);

        let restored = store.restore(Duration::from_secs(1)).await.unwrap();

        assert_eq!(restored.access_token(), "jwt-3600");
        assert!(backend.has_access_token());
        // only the sign-in call went out
        assert_eq!(transport.count(Method::Post, "/auth/v1/token"), 1);
    }

    #[tokio::test]
    async fn test_restore_refreshes_expired_token() {
        let (transport, _backend, _storage, store) = setup();
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(0));
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(3600));
        store.sign_in("a@b.co", "secret1").await.unwrap();

        let restored = store.restore(Duration::from_secs(1)).await.unwrap();

        assert_eq!(restored.access_token(), "jwt-3600");
        let last = transport.requests().pop().unwrap();
        assert_eq!(last.query_value("grant_type"), Some("refresh_token"));
    }

    #[tokio::test]
    async fn test_restore_timeout_falls_back_to_anonymous() {
        let (transport, backend, storage, store) = setup();
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(0));
        transport.push(Method::Post, "/auth/v1/token", Reply::Hang(Duration::from_secs(5)));
        store.sign_in("a@b.co", "secret1").await.unwrap();

        let restored = store.restore(Duration::from_millis(50)).await;

        assert!(restored.is_none());
        assert!(!backend.has_access_token());
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_with_nothing_persisted() {
        let (_transport, _backend, _storage, store) = setup();
        assert!(store.restore(Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_request_fails() {
        let (transport, backend, storage, store) = setup();
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(3600));
        transport.reply(Method::Post, "/auth/v1/logout", 500, "{}");
        let session = store.sign_in("a@b.co", "secret1").await.unwrap();

        store.sign_out(Some(&session)).await;

        assert!(!backend.has_access_token());
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
        assert_eq!(transport.count(Method::Post, "/auth/v1/logout"), 1);
    }

    #[tokio::test]
    async fn test_sign_up_needing_confirmation_stays_anonymous() {
        let (transport, backend, storage, store) = setup();
        transport.reply(
            Method::Post,
            "/auth/v1/signup",
            200,
            &format!(r#"{{"id":"{USER_ID}","email":"a@b.co"}}"#),
        );

        let outcome = store.sign_up("a@b.co", "secret1").await.unwrap();

        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
        assert!(!backend.has_access_token());
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_persisted_session_without_refresh() {
        let (transport, _backend, _storage, store) = setup();
        transport.reply(Method::Post, "/auth/v1/token", 200, &token_body(0));
        store.sign_in("a@b.co", "secret1").await.unwrap();

        let session = store.persisted().unwrap();

        assert_eq!(session.access_token(), "jwt-0");
        assert_eq!(transport.count(Method::Post, "/auth/v1/token"), 1);
    }
}
