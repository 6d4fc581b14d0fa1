pub mod coordinator;
pub mod error;
pub mod state;

pub use coordinator::{AppSettings, ImportOutcome, JournalApp};
pub use error::{JournalError, TradeAction};
pub use state::{AppState, Banner, SharedAccess, ViewMode};
