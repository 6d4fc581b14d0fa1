use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{JournalError, TradeAction};
use super::state::{AppState, Banner, SharedAccess, ViewMode};
use crate::api::{BackendClient, SecureStorage, SignUpOutcome, TablesApi};
use crate::db::LocalStorage;
use crate::journal::{legacy, share_link, validate_credentials, TradeForm};
use crate::models::{Session, Trade, TradeChanges, TradeId, UserProfile};
use crate::session::{SessionState, SessionStore};
use crate::view::{render, text, JournalView, Locale, Message, Prompt};

/// Settings the coordinator needs from the configuration
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub app_url: String,
    pub locale: Locale,
    pub restore_timeout: Duration,
}

/// What happened to the pre-account trade list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    NothingToImport,
    Declined,
    Imported(usize),
}

/// Clears the submission flag when the submission settles
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, JournalError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| JournalError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the application state and runs every user-visible operation
/// against the backend.
pub struct JournalApp {
    tables: TablesApi,
    sessions: SessionStore,
    storage: LocalStorage,
    settings: AppSettings,
    state: RwLock<AppState>,
    submitting: AtomicBool,
}

impl JournalApp {
    pub fn new(
        backend: Arc<BackendClient>,
        storage: LocalStorage,
        vault: SecureStorage,
        settings: AppSettings,
    ) -> Self {
        Self {
            tables: TablesApi::new(backend.clone()),
            sessions: SessionStore::new(backend, storage.clone(), vault),
            storage,
            state: RwLock::new(AppState::new(settings.locale)),
            settings,
            submitting: AtomicBool::new(false),
        }
    }

    pub fn locale(&self) -> Locale {
        self.settings.locale
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn view(&self) -> JournalView {
        render(&*self.state.read().await)
    }

    /// Enter shared mode for `target`, otherwise try to resume a session
    pub async fn start(&self, target: Option<Uuid>) -> Result<(), JournalError> {
        match target {
            Some(user_id) => {
                self.load_shared(user_id).await?;
            }
            None => {
                if self.restore().await.is_some() {
                    self.load_trades().await?;
                }
            }
        }
        Ok(())
    }

    pub async fn restore(&self) -> Option<Session> {
        self.state.write().await.session = SessionState::Authenticating;
        let session = self.sessions.restore(self.settings.restore_timeout).await;
        self.state.write().await.session = match &session {
            Some(session) => SessionState::Authenticated(session.clone()),
            None => SessionState::Anonymous,
        };
        session
    }

    /// Session of the owner, for operations that change data
    async fn ensure_writable(&self) -> Result<Session, JournalError> {
        let state = self.state.read().await;
        if state.mode.is_read_only() {
            return Err(JournalError::ReadOnly);
        }
        state
            .session
            .session()
            .cloned()
            .ok_or(JournalError::NotSignedIn)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, JournalError> {
        validate_credentials(email, password)?;
        self.state.write().await.session = SessionState::Authenticating;

        let session = match self.sessions.sign_in(email.trim(), password).await {
            Ok(session) => session,
            Err(e) => {
                self.state.write().await.session = SessionState::Anonymous;
                return Err(e.into());
            }
        };

        self.enter_session(&session).await;
        Ok(session)
    }

    /// Owner view of a fresh session: profile ensured, trades loaded
    async fn enter_session(&self, session: &Session) {
        {
            let mut state = self.state.write().await;
            state.mode = ViewMode::Owner;
            state.session = SessionState::Authenticated(session.clone());
            state.shared_access = SharedAccess::Pending;
            state.trades.clear();
            state.is_public = None;
            state.banner = None;
        }
        self.ensure_profile(session.user_id()).await;
        if let Err(e) = self.load_trades().await {
            log::warn!("Signed in but trades failed to load: {}", e);
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, JournalError> {
        validate_credentials(email, password)?;
        self.state.write().await.session = SessionState::Authenticating;

        match self.sessions.sign_up(email.trim(), password).await {
            Ok(SignUpOutcome::SignedIn(session)) => {
                self.enter_session(&session).await;
                Ok(SignUpOutcome::SignedIn(session))
            }
            Ok(outcome) => {
                self.state.write().await.session = SessionState::Anonymous;
                Ok(outcome)
            }
            Err(e) => {
                self.state.write().await.session = SessionState::Anonymous;
                Err(e.into())
            }
        }
    }

    /// Revokes the active session, or the persisted one when nothing was
    /// restored, then clears local state
    pub async fn sign_out(&self) {
        let active = self.state.read().await.session.session().cloned();
        let session = active.or_else(|| self.sessions.persisted());
        self.sessions.sign_out(session.as_ref()).await;

        let mut state = self.state.write().await;
        state.session = SessionState::Anonymous;
        state.trades.clear();
        state.is_public = None;
        state.banner = None;
    }

    /// Create the profile row on first sign-in; failures are only logged
    async fn ensure_profile(&self, user_id: Uuid) {
        match self.tables.fetch_profile(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::info!("Creating profile for {}", user_id);
                if let Err(e) = self.tables.insert_profile(&UserProfile::private(user_id)).await {
                    log::error!("Failed to create profile: {}", e);
                }
            }
            Err(e) => log::error!("Failed to check profile: {}", e),
        }
    }

    /// Fetch the viewed user's trades and replace the cache
    pub async fn load_trades(&self) -> Result<usize, JournalError> {
        let user_id = {
            let state = self.state.read().await;
            if state.mode.is_read_only() && state.shared_access != SharedAccess::Public {
                log::debug!("Shared journal is not public, not loading trades");
                return Ok(0);
            }
            state.viewed_user().ok_or(JournalError::NotSignedIn)?
        };

        match self.tables.list_trades(user_id).await {
            Ok(trades) => {
                let count = trades.len();
                let mut state = self.state.write().await;
                if state.viewed_user() == Some(user_id) {
                    state.trades.replace(trades);
                    state.banner = None;
                }
                log::info!("Loaded {} trades", count);
                Ok(count)
            }
            Err(e) => {
                log::error!("Failed to load trades: {}", e);
                self.state.write().await.banner = Some(Banner::LoadFailed);
                Err(JournalError::Load(e))
            }
        }
    }

    /// Switch to the read-only view of `user_id`. Trades are only fetched
    /// once the profile is confirmed public.
    pub async fn load_shared(&self, user_id: Uuid) -> Result<bool, JournalError> {
        {
            let mut state = self.state.write().await;
            state.mode = ViewMode::Shared { user_id };
            state.shared_access = SharedAccess::Pending;
            state.trades.clear();
            state.banner = None;
        }

        let public = match self.tables.fetch_visibility(user_id).await {
            Ok(Some(true)) => true,
            Ok(_) => false,
            Err(e) => {
                log::warn!("Visibility check for {} failed: {}", user_id, e);
                false
            }
        };

        {
            let mut state = self.state.write().await;
            if state.mode != (ViewMode::Shared { user_id }) {
                return Ok(false);
            }
            if public {
                state.shared_access = SharedAccess::Public;
            } else {
                state.shared_access = SharedAccess::NotPublic;
                state.banner = Some(Banner::NotPublic);
                log::info!("Journal {} is not public", user_id);
                return Ok(false);
            }
        }

        self.load_trades().await?;
        Ok(true)
    }

    pub async fn add_trade(&self, form: &TradeForm) -> Result<(), JournalError> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;
        let session = self.ensure_writable().await?;
        let trade = form.validate(session.user_id())?;

        log::info!("Adding {} trade on {}", trade.asset, trade.date);
        self.tables
            .insert_trade(&trade)
            .await
            .map_err(JournalError::write(TradeAction::Add))?;

        self.reload_after_write().await;
        Ok(())
    }

    pub async fn edit_trade(&self, id: &TradeId, form: &TradeForm) -> Result<(), JournalError> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;
        let session = self.ensure_writable().await?;
        let changes = TradeChanges::from(form.validate(session.user_id())?);

        log::info!("Updating trade {}", id);
        self.tables
            .update_trade(id, &changes)
            .await
            .map_err(JournalError::write(TradeAction::Edit))?;

        self.reload_after_write().await;
        Ok(())
    }

    /// Delete after confirmation. Returns false when the user declined.
    pub async fn delete_trade(&self, id: &TradeId, prompt: &dyn Prompt) -> Result<bool, JournalError> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;
        self.ensure_writable().await?;

        if !prompt.confirm(&text(self.locale(), Message::ConfirmDelete)) {
            return Ok(false);
        }

        log::info!("Deleting trade {}", id);
        self.tables
            .delete_trade(id)
            .await
            .map_err(JournalError::write(TradeAction::Delete))?;

        self.reload_after_write().await;
        Ok(true)
    }

    async fn reload_after_write(&self) {
        if let Err(e) = self.load_trades().await {
            log::warn!("Reload after write failed: {}", e);
        }
    }

    /// Trade shown at 1-based table row `row`
    pub async fn trade_at(&self, row: usize) -> Result<Trade, JournalError> {
        self.state
            .read()
            .await
            .trades
            .by_row(row)
            .cloned()
            .ok_or_else(|| JournalError::NotFound(format!("row {}", row)))
    }

    /// Whether the signed-in user's journal is public. A missing profile
    /// reads as private.
    pub async fn share_status(&self) -> Result<bool, JournalError> {
        let session = self.ensure_writable().await?;
        let public = self
            .tables
            .fetch_visibility(session.user_id())
            .await?
            .unwrap_or(false);
        self.state.write().await.is_public = Some(public);
        Ok(public)
    }

    pub async fn set_sharing(&self, public: bool) -> Result<(), JournalError> {
        let session = self.ensure_writable().await?;
        let profile = UserProfile {
            user_id: session.user_id(),
            is_public: public,
        };
        self.tables
            .upsert_profile(&profile)
            .await
            .map_err(JournalError::write(TradeAction::Share))?;

        self.state.write().await.is_public = Some(public);
        log::info!("Journal is now {}", if public { "public" } else { "private" });
        Ok(())
    }

    /// Flip visibility; returns the new value
    pub async fn toggle_sharing(&self) -> Result<bool, JournalError> {
        let known = self.state.read().await.is_public;
        let current = match known {
            Some(value) => value,
            None => self.share_status().await?,
        };
        self.set_sharing(!current).await?;
        Ok(!current)
    }

    pub async fn share_link(&self) -> Result<String, JournalError> {
        let session = self.ensure_writable().await?;
        Ok(share_link(&self.settings.app_url, session.user_id()))
    }

    /// Offer to move the pre-account local list into the signed-in
    /// journal. Records are inserted one by one; the first failure stops
    /// the import and leaves the list in place.
    pub async fn import_legacy(&self, prompt: &dyn Prompt) -> Result<ImportOutcome, JournalError> {
        let session = self.ensure_writable().await?;
        let records = legacy::load(&self.storage)?;
        if records.is_empty() {
            return Ok(ImportOutcome::NothingToImport);
        }

        let count = records.len();
        if !prompt.confirm(&text(self.locale(), Message::ImportPrompt { count })) {
            legacy::discard(&self.storage)?;
            log::info!("Legacy import declined, discarded {} records", count);
            return Ok(ImportOutcome::Declined);
        }

        for (i, record) in records.into_iter().enumerate() {
            let trade = record.into_new_trade(session.user_id());
            if let Err(e) = self.tables.insert_trade(&trade).await {
                log::error!("Legacy import stopped at record {} of {}: {}", i + 1, count, e);
                return Err(JournalError::Import(e));
            }
        }

        legacy::discard(&self.storage)?;
        log::info!("Imported {} legacy trades", count);
        self.reload_after_write().await;
        Ok(ImportOutcome::Imported(count))
    }

    /// Write the cached trades as CSV; returns the row count
    pub async fn export_csv<W: Write>(&self, writer: W) -> Result<usize, JournalError> {
        let state = self.state.read().await;
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "id", "asset", "date", "session", "direction", "setup", "tradingview_url", "risk",
            "rr", "pl", "result",
        ])?;

        let cell = |value: &Option<String>| value.clone().unwrap_or_default();
        for trade in state.trades.trades() {
            csv.write_record([
                trade.id.to_string(),
                trade.asset.clone(),
                cell(&trade.date),
                cell(&trade.session),
                cell(&trade.direction),
                cell(&trade.setup),
                cell(&trade.tradingview_url),
                cell(&trade.risk),
                cell(&trade.rr),
                cell(&trade.pl),
                cell(&trade.result),
            ])?;
        }
        csv.flush().map_err(|e| JournalError::Export(e.to_string()))?;
        Ok(state.trades.trades().len())
    }
}
