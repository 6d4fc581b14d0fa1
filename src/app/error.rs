use thiserror::Error;

use crate::api::ApiError;
use crate::journal::ValidationError;

/// Which mutation a backend failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Add,
    Edit,
    Delete,
    Share,
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{action:?} failed: {source}")]
    Write {
        action: TradeAction,
        source: ApiError,
    },

    #[error("failed to load trades: {0}")]
    Load(ApiError),

    #[error("legacy import failed: {0}")]
    Import(ApiError),

    #[error("journal is open read-only")]
    ReadOnly,

    #[error("not signed in")]
    NotSignedIn,

    #[error("another submission is still in progress")]
    Busy,

    #[error("no trade {0}")]
    NotFound(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl JournalError {
    pub fn write(action: TradeAction) -> impl FnOnce(ApiError) -> JournalError {
        move |source| JournalError::Write { action, source }
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        JournalError::Export(err.to_string())
    }
}
