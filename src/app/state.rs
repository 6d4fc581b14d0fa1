use uuid::Uuid;

use crate::journal::TradeCache;
use crate::session::SessionState;
use crate::view::Locale;

/// Whose journal is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Owner,
    /// Read-only view of another user's journal
    Shared { user_id: Uuid },
}

impl ViewMode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, ViewMode::Shared { .. })
    }
}

/// Outcome of the visibility check in shared mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedAccess {
    Pending,
    Public,
    NotPublic,
}

/// Message shown in place of, or above, the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    NotPublic,
    LoadFailed,
}

/// Everything the view is rendered from
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: ViewMode,
    pub session: SessionState,
    pub trades: TradeCache,
    pub shared_access: SharedAccess,
    /// Owner's own share setting, once read
    pub is_public: Option<bool>,
    pub banner: Option<Banner>,
    pub locale: Locale,
}

impl AppState {
    pub fn new(locale: Locale) -> Self {
        Self {
            mode: ViewMode::Owner,
            session: SessionState::Anonymous,
            trades: TradeCache::new(),
            shared_access: SharedAccess::Pending,
            is_public: None,
            banner: None,
            locale,
        }
    }

    /// User whose trades are listed
    pub fn viewed_user(&self) -> Option<Uuid> {
        match self.mode {
            ViewMode::Owner => self.session.session().map(|s| s.user_id()),
            ViewMode::Shared { user_id } => Some(user_id),
        }
    }

    pub fn can_edit(&self) -> bool {
        !self.mode.is_read_only() && self.session.is_authenticated()
    }
}
